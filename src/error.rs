use thiserror::Error;

#[derive(Error, Debug)]
pub enum TandemError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    Record(#[from] crate::validate::RecordError),

    #[error("Unknown partner: {0}")]
    UnknownPartner(String),

    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TandemError>;
