//! Error taxonomy shared by the repository, import parsing and the controller

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VocabError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("import failed: {0}")]
    Import(String),
    #[error("database error: {0}")]
    Transport(#[from] rusqlite::Error),
}

pub type VocabResult<T> = Result<T, VocabError>;

impl VocabError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, VocabError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, VocabError::Conflict(_))
    }
}
