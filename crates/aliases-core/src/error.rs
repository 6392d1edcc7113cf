use thiserror::Error;

/// Errors returned by the definition registry and the alias store.
pub type Result<T> = std::result::Result<T, AliasError>;

/// Failures of the shared key-value backend.
///
/// Every message carries the operation that failed. A missing key is never
/// reported through this type; backends return `None`/`false` for it.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out: {0}")]
    Timeout(String),
    #[error("store operation failed: {0}")]
    Operation(String),
    #[error("stored value is invalid: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Error)]
pub enum AliasError {
    /// A definition field is missing or out of bounds.
    #[error("invalid definition: {0}")]
    Validation(String),
    #[error("definition already exists: {0}")]
    AlreadyExists(String),
    #[error("definition not found: {0}")]
    NotFound(String),
    /// An explicit set carried a blank alias.
    #[error("empty alias for identifier '{0}'")]
    EmptyAlias(String),
    /// The generator kept producing taken aliases.
    ///
    /// Usually a sign that the definition needs a larger character set or
    /// minimum length.
    #[error("max attempts reached for '{ident}' in '{definition}' ({attempts} attempts)")]
    MaxAttemptsReached {
        definition: String,
        ident: String,
        attempts: usize,
    },
    /// A definition value is missing or undecodable while its name is bound.
    #[error("definition '{key}' is corrupt: {reason}")]
    CorruptDefinition { key: String, reason: String },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AliasError {
    /// Returns `true` for errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AliasError::Validation(_)
                | AliasError::AlreadyExists(_)
                | AliasError::NotFound(_)
                | AliasError::EmptyAlias(_)
        )
    }
}
