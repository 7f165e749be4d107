use thiserror::Error;

/// SQLite primary result code for "database or disk is full".
const SQLITE_FULL: &str = "13";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Storage quota exceeded: {0}. Remove cached scenarios to free up space")]
    QuotaExceeded(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, AppError::QuotaExceeded(_))
    }
}

/// Returns true when a SQLite failure means the backing storage ran out of room.
pub(crate) fn is_quota_failure(code: Option<&str>, message: &str) -> bool {
    if let Some(code) = code {
        // Extended result codes keep the primary code in the low byte.
        if code == SQLITE_FULL || code.parse::<i32>().map(|c| c & 0xff == 13).unwrap_or(false) {
            return true;
        }
    }
    let lowered = message.to_ascii_lowercase();
    lowered.contains("database or disk is full") || lowered.contains("quota")
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code();
            if is_quota_failure(code.as_deref(), db_err.message()) {
                return AppError::QuotaExceeded(db_err.message().to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            AppError::DeserializationError(err.to_string())
        } else {
            AppError::SerializationError(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
