#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
