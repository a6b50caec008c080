use serde::{Deserialize, Serialize};

/// Envelope wrapping every successful response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> Success<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Envelope wrapping every error response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub error: ErrorBody,
}

impl Failure {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    MethodNotAllowed,
    InvalidJson,
    InternalError,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_omits_count_unless_set() {
        let plain = serde_json::to_value(Success::new("x", "ok")).unwrap();
        assert_eq!(plain, json!({ "success": true, "data": "x", "message": "ok" }));

        let counted =
            serde_json::to_value(Success::new(Vec::<u8>::new(), "none").with_count(0)).unwrap();
        assert_eq!(counted["count"], 0);
    }

    #[test]
    fn failure_uses_screaming_codes() {
        let body =
            serde_json::to_value(Failure::new(ErrorCode::InvalidJson, "Invalid JSON format"))
                .unwrap();

        assert_eq!(
            body,
            json!({
                "success": false,
                "error": { "code": "INVALID_JSON", "message": "Invalid JSON format" }
            })
        );
    }
}
