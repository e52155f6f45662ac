use std::io;

/// Errors that end a chart run.
#[derive(Debug)]
pub enum IngestError {
    Io(io::Error),
    Db(chart_db::DbError),
    Http(String),
    Json(serde_json::Error),
    MalformedResponse(String),
    MalformedRecord(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Db(err) => write!(f, "db error: {}", err),
            Self::Http(message) => write!(f, "http error: {}", message),
            Self::Json(err) => write!(f, "json error: {}", err),
            Self::MalformedResponse(message) => write!(f, "malformed response: {}", message),
            Self::MalformedRecord(message) => write!(f, "malformed record: {}", message),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<chart_db::DbError> for IngestError {
    fn from(err: chart_db::DbError) -> Self {
        Self::Db(err)
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
