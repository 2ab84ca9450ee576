use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured index is not listed remotely and `make_index` is off.
    #[error("The index {0} does not exist")]
    IndexMissing(String),

    #[error("Document operation called before an index was selected")]
    IndexNotSelected,

    #[error("Index {index} did not start after {attempts} checks")]
    IndexStartTimeout { index: String, attempts: usize },

    #[error("Remote index error: {0}")]
    Remote(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Configuration-class errors abort startup and are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::IndexMissing(_) | AppError::IndexNotSelected
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Remote(err.to_string())
    }
}
