use cmis_store::StoreError;
use cmis_types::TypeError;

/// Errors returned by the object service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The object, path, or type does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required argument is missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sibling with the same name already exists.
    #[error("name constraint violation: {0}")]
    NameConstraintViolation(String),

    /// A type, repository, or object constraint would be violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The caller's change token is stale.
    #[error("update conflict: {0}")]
    UpdateConflict(String),

    /// The caller lacks the required permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The repository does not support the operation.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The document already has content and overwrite was not requested.
    #[error("content already exists: {0}")]
    ContentAlreadyExists(String),

    /// The version series is in the wrong state.
    #[error("versioning error: {0}")]
    Versioning(String),

    /// The repository configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound(_) => Self::NotFound(message),
            StoreError::InvalidArgument(_) => Self::InvalidArgument(message),
            StoreError::NameConstraintViolation { .. } => Self::NameConstraintViolation(message),
            StoreError::Constraint(_) => Self::Constraint(message),
            StoreError::PermissionDenied { .. } => Self::PermissionDenied(message),
            StoreError::NotSupported(_) => Self::NotSupported(message),
            StoreError::UpdateConflict { .. } => Self::UpdateConflict(message),
            StoreError::Versioning(_) => Self::Versioning(message),
        }
    }
}

impl From<TypeError> for ServiceError {
    fn from(err: TypeError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
