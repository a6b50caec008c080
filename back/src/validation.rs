use api::v1::{NewTodo, TodoChanges, DESCRIPTION_MAX_LENGTH, TITLE_MAX_LENGTH};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Title cannot be empty")]
    TitleEmpty,
    #[error("Title must be {} characters or less", TITLE_MAX_LENGTH)]
    TitleTooLong,
    #[error("Description must be a string")]
    DescriptionNotString,
    #[error("Description must be {} characters or less", DESCRIPTION_MAX_LENGTH)]
    DescriptionTooLong,
    #[error("Completed must be a boolean")]
    CompletedNotBoolean,
}

pub fn validate_create(input: &Value) -> Result<NewTodo, ValidationError> {
    let title = title(input.get("title"))?;
    let description = description(input.get("description"))?;

    Ok(NewTodo { title, description })
}

/// Full replacement: `completed` is mandatory, a missing description resets it.
pub fn validate_full_update(input: &Value) -> Result<TodoChanges, ValidationError> {
    let NewTodo { title, description } = validate_create(input)?;
    let completed = completed(input.get("completed"))?;

    Ok(TodoChanges {
        title: Some(title),
        description: Some(description.unwrap_or_default()),
        completed: Some(completed),
    })
}

/// Every present field is checked; absent fields stay `None`. An empty patch is
/// accepted and only refreshes `updatedAt`.
pub fn validate_partial_update(input: &Value) -> Result<TodoChanges, ValidationError> {
    let title = match input.get("title") {
        None => None,
        Some(value) => Some(title(Some(value))?),
    };

    let description = match input.get("description") {
        None => None,
        Some(value) => Some(description(Some(value))?.unwrap_or_default()),
    };

    let completed = match input.get("completed") {
        None => None,
        Some(value) => Some(completed(Some(value))?),
    };

    Ok(TodoChanges {
        title,
        description,
        completed,
    })
}

fn title(value: Option<&Value>) -> Result<String, ValidationError> {
    let Some(Value::String(title)) = value else {
        return Err(ValidationError::TitleRequired);
    };

    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }

    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }

    Ok(title.clone())
}

fn description(value: Option<&Value>) -> Result<Option<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(description)) => {
            if description.chars().count() > DESCRIPTION_MAX_LENGTH {
                return Err(ValidationError::DescriptionTooLong);
            }

            Ok(Some(description.clone()))
        }
        Some(_) => Err(ValidationError::DescriptionNotString),
    }
}

fn completed(value: Option<&Value>) -> Result<bool, ValidationError> {
    match value {
        Some(Value::Bool(completed)) => Ok(*completed),
        _ => Err(ValidationError::CompletedNotBoolean),
    }
}
