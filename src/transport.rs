//! The transport seam between the router and the protocol engine.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::context::{ContextFn, RequestContext};

/// Per-connection mount-path resolver for multi-tenant setups.
///
/// Invoked by the transport with the request's [`RequestContext`] and the
/// session id. Returning `None` (or an empty string) is not an error; it
/// degrades to the configured fallback path. Runs on the hot path of every
/// connection, so implementations must be cheap, non-blocking, and safe
/// for concurrent invocation.
pub type DynamicBasePathFn =
    Arc<dyn Fn(&RequestContext, &str) -> Option<String> + Send + Sync>;

/// How the client-visible mount path is determined.
#[derive(Clone)]
pub enum PathStrategy {
    /// One normalized path, fixed at registration.
    Static(String),
    /// Resolved per connection; `fallback` is the normalized static path
    /// used when the resolver yields nothing.
    Dynamic {
        resolve: DynamicBasePathFn,
        fallback: String,
    },
}

impl PathStrategy {
    /// The mount path advertised for this connection.
    pub fn mount_path(&self, ctx: &RequestContext, session_id: &str) -> String {
        match self {
            PathStrategy::Static(path) => path.clone(),
            PathStrategy::Dynamic { resolve, fallback } => resolve(ctx, session_id)
                .filter(|path| !path.is_empty())
                .unwrap_or_else(|| fallback.clone()),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, PathStrategy::Dynamic { .. })
    }
}

impl fmt::Debug for PathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStrategy::Static(path) => f.debug_tuple("Static").field(path).finish(),
            PathStrategy::Dynamic { fallback, .. } => f
                .debug_struct("Dynamic")
                .field("fallback", fallback)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything a transport needs from the handler configuration.
///
/// Assembled by `register` and handed to the engine's transport
/// constructor exactly once.
#[derive(Clone)]
pub struct TransportConfig {
    pub path_strategy: PathStrategy,
    /// Route suffix of the streaming endpoint, e.g. `/sse`.
    pub sse_path: String,
    /// Route suffix of the inbound message endpoint, e.g. `/message`.
    pub post_path: String,
    /// Absolute URL prefix for endpoint advertisement, when the
    /// client-visible origin differs from the listener.
    pub base_url: Option<String>,
    /// Context bridge applied per connection and message. When it returns
    /// `Err`, the transport must reject the exchange.
    pub context_fn: Option<ContextFn>,
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("path_strategy", &self.path_strategy)
            .field("sse_path", &self.sse_path)
            .field("post_path", &self.post_path)
            .field("base_url", &self.base_url)
            .field("context_fn", &self.context_fn.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Per-registration transport: turns raw HTTP exchanges into engine traffic.
///
/// The installed routes forward the raw request verbatim; no protocol logic
/// lives in the routing layer.
#[async_trait]
pub trait SseTransport: Send + Sync + 'static {
    /// Open the streaming connection (GET endpoint).
    async fn handle_sse(&self, ctx: RequestContext, request: Request) -> Response;

    /// Deliver a protocol message for an existing session (POST endpoint).
    async fn handle_message(&self, ctx: RequestContext, request: Request) -> Response;

    /// Unified entry point used when mounted at a static base path.
    /// Dispatches on the HTTP method.
    async fn handle(&self, ctx: RequestContext, request: Request) -> Response {
        let method = request.method().clone();
        match method.as_str() {
            "GET" => self.handle_sse(ctx, request).await,
            "POST" => self.handle_message(ctx, request).await,
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_strategy_ignores_context() {
        let strategy = PathStrategy::Static("/mcp".to_string());
        let ctx = RequestContext::default().with_param("tenant", "acme");
        assert_eq!(strategy.mount_path(&ctx, "s1"), "/mcp");
    }

    #[test]
    fn test_dynamic_strategy_prefers_resolver() {
        let strategy = PathStrategy::Dynamic {
            resolve: Arc::new(|ctx, _session_id| {
                ctx.param("tenant").map(|tenant| format!("/t/{tenant}/mcp"))
            }),
            fallback: "/mcp".to_string(),
        };

        let ctx = RequestContext::default().with_param("tenant", "acme");
        assert_eq!(strategy.mount_path(&ctx, "s1"), "/t/acme/mcp");
    }

    #[test]
    fn test_dynamic_strategy_falls_back_when_unresolved() {
        let strategy = PathStrategy::Dynamic {
            resolve: Arc::new(|ctx, _session_id| {
                ctx.param("tenant").map(|tenant| format!("/t/{tenant}/mcp"))
            }),
            fallback: "/mcp".to_string(),
        };

        assert_eq!(strategy.mount_path(&RequestContext::default(), "s1"), "/mcp");
    }

    #[test]
    fn test_dynamic_strategy_treats_empty_as_unresolved() {
        let strategy = PathStrategy::Dynamic {
            resolve: Arc::new(|_ctx, _session_id| Some(String::new())),
            fallback: "/mcp".to_string(),
        };

        assert_eq!(strategy.mount_path(&RequestContext::default(), "s1"), "/mcp");
    }
}
