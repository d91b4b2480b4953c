use cmis_types::{ChangeToken, ObjectId, Permission};

/// Errors from object store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No object exists for the given id or path.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The operation does not apply to this kind of object or argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sibling with the same name already exists.
    #[error("an object named '{name}' already exists in folder {folder}")]
    NameConstraintViolation { name: String, folder: ObjectId },

    /// A repository constraint would be violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The principal lacks the required permission.
    #[error("{principal} lacks {permission} on object {id}")]
    PermissionDenied {
        principal: String,
        permission: Permission,
        id: ObjectId,
    },

    /// The repository does not support the operation.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The caller's change token is stale.
    #[error("update conflict on {id}: change token {given} does not match {current}")]
    UpdateConflict {
        id: ObjectId,
        given: ChangeToken,
        current: ChangeToken,
    },

    /// The version series is in the wrong state for the operation.
    #[error("versioning error: {0}")]
    Versioning(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::NotFound`] keyed by object id.
    pub fn not_found(id: ObjectId) -> Self {
        Self::NotFound(id.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
