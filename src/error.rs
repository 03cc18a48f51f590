//! Error types for the entity catalog

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Entity catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Entity type not found: {name}")]
    TypeNotFound { name: String },

    #[error("Entity not found: {id}")]
    EntityNotFound { id: i64 },

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage handle poisoned by a panicked writer")]
    Poisoned,
}

impl CatalogError {
    /// Invalid or missing required input
    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }

    /// A referenced type name or entity id does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::TypeNotFound { .. } | CatalogError::EntityNotFound { .. }
        )
    }

    /// Underlying persistence failure (I/O, SQLite, payload decoding)
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CatalogError::Storage(_)
                | CatalogError::Serialization(_)
                | CatalogError::Io(_)
                | CatalogError::Poisoned
        )
    }
}
