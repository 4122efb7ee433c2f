use thiserror::Error;

#[derive(Error, Debug)]
pub enum HearthError {
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("Malformed storage file: {0}")]
    Malformed(String),

    #[error("Cannot coerce {value:?} to {expected} for attribute {field:?}")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HearthError>;
