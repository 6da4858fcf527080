//! Error types for token store operations.

use thiserror::Error;

use crate::storage::StorageError;

/// Result codes returned by the admin API, sent as their numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperationCode {
    Success = 0,
    ParamError = 1,
    UserExists = 2,
    SaveError = 3,
    UserEmpty = 4,
    TokenEmpty = 5,
}

impl OperationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationCode::Success => "success",
            OperationCode::ParamError => "param_error",
            OperationCode::UserExists => "user_exists",
            OperationCode::SaveError => "save_error",
            OperationCode::UserEmpty => "user_empty",
            OperationCode::TokenEmpty => "token_empty",
        }
    }
}

/// Failures of ACL store operations.
#[derive(Debug, Error)]
pub enum AclError {
    /// User identifier is blank.
    #[error("user cannot be empty")]
    UserEmpty,

    /// Token is blank.
    #[error("token cannot be empty")]
    TokenEmpty,

    /// User identifier contains characters the token file cannot hold.
    #[error("user [{0}] contains invalid characters")]
    InvalidUser(String),

    /// Token contains whitespace.
    #[error("token for user [{0}] contains whitespace")]
    InvalidToken(String),

    /// A record with this identifier already exists.
    #[error("user [{0}] exist")]
    UserExists(String),

    /// No record with this identifier.
    #[error("user [{0}] not exist")]
    UserNotFound(String),

    /// An update tried to rename the user.
    #[error("user [{before}] cannot be renamed to [{after}]")]
    IdentifierChanged { before: String, after: String },

    /// A bulk operation was called with no users.
    #[error("no user selected")]
    EmptySelection,

    /// The durable save failed; nothing was committed.
    #[error("save failed: {0}")]
    Save(#[from] StorageError),
}

impl AclError {
    /// Admin API code for this failure.
    pub fn code(&self) -> OperationCode {
        match self {
            AclError::UserEmpty => OperationCode::UserEmpty,
            AclError::TokenEmpty => OperationCode::TokenEmpty,
            AclError::UserExists(_) => OperationCode::UserExists,
            AclError::Save(_) => OperationCode::SaveError,
            AclError::InvalidUser(_)
            | AclError::InvalidToken(_)
            | AclError::UserNotFound(_)
            | AclError::IdentifierChanged { .. }
            | AclError::EmptySelection => OperationCode::ParamError,
        }
    }
}

/// Result type for ACL store operations.
pub type AclResult<T> = Result<T, AclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(AclError::UserEmpty.code(), OperationCode::UserEmpty);
        assert_eq!(AclError::UserExists("a".into()).code(), OperationCode::UserExists);
        assert_eq!(AclError::EmptySelection.code(), OperationCode::ParamError);
        assert_eq!(
            AclError::Save(StorageError::Rejected("x".into())).code(),
            OperationCode::SaveError
        );
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(OperationCode::Success as u8, 0);
        assert_eq!(OperationCode::TokenEmpty as u8, 5);
    }
}
