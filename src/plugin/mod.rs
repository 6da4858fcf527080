//! frps server plugin: admission decisions for client lifecycle events.
//!
//! # Data Flow
//! ```text
//! POST /handler {"op", "content"}
//!     → handler.rs (JSON envelope, HTTP status mapping)
//!     → dispatcher.rs (op tag → typed LifecycleEvent)
//!     → policy.rs (allow / deny against acl::AclStore)
//!     → protocol::Response {"reject", "reject_reason", "unchange"}
//! ```
//!
//! # Design Decisions
//! - A denial is a normal response (HTTP 200), never an error
//! - Unknown op tags are an explicit 400, not an empty success
//! - Malformed envelopes or payloads are 400; anything else is 500

pub mod dispatcher;
pub mod handler;
pub mod policy;
pub mod protocol;

use axum::http::StatusCode;
use thiserror::Error;

pub use dispatcher::Dispatcher;
pub use policy::{Decision, DenyReason, PolicyEvaluator, ProxyRequest};
pub use protocol::{LifecycleEvent, Operation, Request, Response};

/// Failures while handling a plugin request.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The envelope or payload could not be decoded.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The op tag is not one this plugin handles.
    #[error("unsupported operation [{0}]")]
    Unsupported(String),

    /// Something went wrong on our side.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PluginError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, PluginError::Malformed(_) | PluginError::Unsupported(_))
    }

    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PluginError::Malformed("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(PluginError::Unsupported("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PluginError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
