use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors reported by [`McpHandler::register`](crate::handler::McpHandler::register).
///
/// Registration is the only fallible step in the handler lifecycle. Option
/// application never fails; malformed configuration surfaces here instead of
/// as a route that silently never matches.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// `register` was called on a handler that already owns a transport.
    ///
    /// Rebuilding the transport while routes may already be receiving
    /// traffic is unsound, so a second call is rejected instead.
    #[error("MCP routes already registered")]
    AlreadyRegistered,

    /// A route suffix was empty or missing its leading `/`.
    #[error("route suffix {0:?} must be non-empty and start with '/'")]
    InvalidRouteSuffix(String),
}

/// Errors produced by the protocol engine behind the delegation facade.
///
/// The facade forwards these verbatim; nothing is retried or swallowed at
/// this layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The addressed session does not exist (or no longer exists).
    ///
    /// Non-fatal and scoped to the one call that named the session.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Any other engine-reported failure.
    #[error("engine error: {0}")]
    Internal(String),
}

/// Outcome of a context bridge that refused to propagate a request.
///
/// Returned by a [`ContextFn`](crate::context::ContextFn) when the request
/// must not reach the engine. Transports are required to act on it, and the
/// [`IntoResponse`] impl gives them the matching HTTP rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextRejection {
    /// The auth predicate evaluated to false.
    #[error("request failed authentication")]
    Unauthorized,

    /// The bridge denied propagation for another stated reason.
    #[error("context propagation denied: {0}")]
    Denied(String),
}

impl IntoResponse for ContextRejection {
    fn into_response(self) -> Response {
        let status = match &self {
            ContextRejection::Unauthorized => StatusCode::UNAUTHORIZED,
            ContextRejection::Denied(_) => StatusCode::FORBIDDEN,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_codes() {
        let response = ContextRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ContextRejection::Denied("tenant suspended".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_session_not_found_display() {
        let err = EngineError::SessionNotFound("abc".to_string());
        assert_eq!(err.to_string(), "session not found: abc");
    }
}
