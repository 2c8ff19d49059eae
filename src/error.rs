use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value}")]
    OutOfRange {
        name: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("unknown method `{0}`")]
    UnknownMethod(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecordError {
    #[error("missing `date` field")]
    MissingTimestamp,
    #[error("missing `groups` field")]
    MissingGroups,
    #[error("unparseable date `{0}`")]
    InvalidTimestamp(String),
    #[error("participant `{0}` appears more than once")]
    DuplicateMember(String),
    #[error("malformed entry: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history must be a JSON array")]
    NotAnArray,
}
