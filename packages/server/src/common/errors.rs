use thiserror::Error;

/// Job store errors. `Conflict` and `NotFound` are distinguished from
/// generic database failures so the API layer can map them to 409/404.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("company {0:?} already exists")]
    Conflict(String),

    #[error("company {0:?} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
