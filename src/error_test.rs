use super::*;

#[derive(Debug, thiserror::Error)]
#[error("upstream busy")]
struct Busy;

impl ErrorCode for Busy {
    fn error_code(&self) -> &'static str {
        "E_BUSY"
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[test]
fn from_code_copies_code_message_and_flag() {
    let err = TaskError::from_code(&Busy);
    assert_eq!(err.code, "E_BUSY");
    assert_eq!(err.message, "upstream busy");
    assert!(err.retryable);
}

#[test]
fn new_defaults_to_not_retryable() {
    let err = TaskError::new("E_X", "boom");
    assert!(!err.retryable);
    assert_eq!(err.to_string(), "E_X: boom");
}

#[test]
fn history_marker_carries_error_message() {
    let marker = TaskError::new("E_TIMEOUT", "timed out").history_marker();
    assert_eq!(marker["error"], "timed out");
    assert_eq!(marker["code"], "E_TIMEOUT");
}

#[test]
fn retryable_defaults_when_missing_from_json() {
    let err: TaskError = serde_json::from_str(r#"{"code":"E_A","message":"m"}"#).unwrap();
    assert!(!err.retryable);
}
