//! Handler configuration, route registration, and the delegation facade.
//!
//! A [`McpHandler`] is built once, registered once, and then used only for
//! delegated engine operations. Configuration happens through chained
//! builder setters applied in call order; for a field set twice the later
//! call wins, and the option-list setters append instead of replacing.
//!
//! ```rust,no_run
//! use axum::Router;
//! use axum_mcp::handler::McpHandler;
//! use axum_mcp::test_utils::doubles::InMemoryEngine;
//!
//! # fn run() -> Result<(), axum_mcp::error::RegisterError> {
//! let mut handler = McpHandler::<InMemoryEngine>::builder("example-server", "1.0.0")
//!     .base_path("/api/mcp")
//!     .build();
//!
//! let app: Router = handler.register(Router::new())?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request},
    http::Extensions,
    routing::{get, post},
    Router,
};
use tracing::{debug, info};

use crate::context::{ContextFn, RequestContext};
use crate::engine::{McpEngine, ServerTool};
use crate::error::{ContextRejection, EngineError, RegisterError};
use crate::path::{join_route, normalize_base_path};
use crate::transport::{DynamicBasePathFn, PathStrategy, SseTransport, TransportConfig};

/// Builder for [`McpHandler`].
///
/// Finalizing with [`build`](McpHandlerBuilder::build) constructs the
/// engine eagerly from the accumulated engine options; the transport is
/// not created until registration.
pub struct McpHandlerBuilder<E: McpEngine> {
    name: String,
    version: String,
    base_path: String,
    sse_route: String,
    message_route: String,
    base_url: Option<String>,
    dynamic_base_path: Option<DynamicBasePathFn>,
    context_fn: Option<ContextFn>,
    engine_options: Vec<E::EngineOption>,
    transport_options: Vec<E::TransportOption>,
}

impl<E: McpEngine> McpHandlerBuilder<E> {
    fn new(name: String, version: String) -> Self {
        Self {
            name,
            version,
            base_path: "/mcp".to_string(),
            sse_route: "/sse".to_string(),
            message_route: "/message".to_string(),
            base_url: None,
            dynamic_base_path: None,
            context_fn: None,
            engine_options: Vec::new(),
            transport_options: Vec::new(),
        }
    }

    /// URL prefix the two protocol routes are installed under.
    ///
    /// Normalized at registration; `"api/mcp/"` becomes `/api/mcp`. May
    /// contain axum captures (`/t/{tenant}/mcp`) when paired with a
    /// dynamic base path.
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Route suffix of the streaming endpoint. Defaults to `/sse`.
    pub fn sse_route(mut self, route: impl Into<String>) -> Self {
        self.sse_route = route.into();
        self
    }

    /// Route suffix of the inbound message endpoint. Defaults to `/message`.
    pub fn message_route(mut self, route: impl Into<String>) -> Self {
        self.message_route = route.into();
        self
    }

    /// Absolute URL prefix advertised to clients, for deployments where
    /// the externally visible origin differs from the listener.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Resolve the client-visible mount path per connection instead of
    /// using the static base path.
    ///
    /// Takes precedence over [`base_path`](McpHandlerBuilder::base_path)
    /// at registration; the static path remains as the fallback for
    /// connections the resolver cannot place.
    pub fn dynamic_base_path<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&RequestContext, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.dynamic_base_path = Some(Arc::new(resolve));
        self
    }

    /// Dynamic base path derived from a named route capture.
    ///
    /// `template` must contain a `{}` placeholder which is replaced with
    /// the captured value: `base_path_from_param("tenant", "/t/{}/mcp")`
    /// advertises `/t/acme/mcp` for a request that captured
    /// `tenant = "acme"`. A missing or empty capture falls back to the
    /// static base path.
    pub fn base_path_from_param(
        self,
        param: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        let param = param.into();
        let template = template.into();
        self.dynamic_base_path(move |ctx, _session_id| {
            ctx.param(&param)
                .filter(|value| !value.is_empty())
                .map(|value| template.replacen("{}", value, 1))
        })
    }

    /// Bridge router-native request data into the engine's per-connection
    /// context carrier. See [`ContextFn`].
    pub fn context_fn<F>(mut self, bridge: F) -> Self
    where
        F: Fn(Extensions, &RequestContext) -> Result<Extensions, ContextRejection>
            + Send
            + Sync
            + 'static,
    {
        self.context_fn = Some(Arc::new(bridge));
        self
    }

    /// Gate context propagation on a request predicate.
    ///
    /// When the predicate returns false the bridge yields
    /// [`ContextRejection::Unauthorized`] and the transport rejects the
    /// exchange. Installs a context bridge, so it overrides (and is
    /// overridden by) [`context_fn`](McpHandlerBuilder::context_fn).
    pub fn auth<F>(self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.context_fn(move |extensions, ctx| {
            if predicate(ctx) {
                Ok(extensions)
            } else {
                Err(ContextRejection::Unauthorized)
            }
        })
    }

    /// Append engine-construction options, preserving call order.
    pub fn engine_options(mut self, options: impl IntoIterator<Item = E::EngineOption>) -> Self {
        self.engine_options.extend(options);
        self
    }

    /// Append transport-construction options, preserving call order.
    pub fn transport_options(
        mut self,
        options: impl IntoIterator<Item = E::TransportOption>,
    ) -> Self {
        self.transport_options.extend(options);
        self
    }

    /// Freeze the configuration and construct the engine.
    pub fn build(self) -> McpHandler<E> {
        let engine = Arc::new(E::build(&self.name, &self.version, self.engine_options));
        McpHandler {
            base_path: self.base_path,
            sse_route: self.sse_route,
            message_route: self.message_route,
            base_url: self.base_url,
            dynamic_base_path: self.dynamic_base_path,
            context_fn: self.context_fn,
            transport_options: Some(self.transport_options),
            engine,
            transport: None,
        }
    }
}

/// Mounts a protocol engine's SSE endpoints on an axum [`Router`].
///
/// Owns the engine from construction and the transport from registration
/// onward. After [`register`](McpHandler::register) the configuration is
/// frozen; only the delegation methods and accessors remain useful, and
/// all of them are safe to call from many tasks at once.
pub struct McpHandler<E: McpEngine> {
    base_path: String,
    sse_route: String,
    message_route: String,
    base_url: Option<String>,
    dynamic_base_path: Option<DynamicBasePathFn>,
    context_fn: Option<ContextFn>,
    transport_options: Option<Vec<E::TransportOption>>,
    engine: Arc<E>,
    transport: Option<Arc<E::Transport>>,
}

impl<E: McpEngine> McpHandler<E> {
    /// Start configuring a handler for an engine with the given protocol
    /// name and version.
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> McpHandlerBuilder<E> {
        McpHandlerBuilder::new(name.into(), version.into())
    }

    /// Construct the transport and install the two protocol routes.
    ///
    /// Installs `GET <base><sse_route>` and `POST <base><message_route>`
    /// on the given router, where `<base>` is the normalized static base
    /// path, or the configured route pattern verbatim when a dynamic
    /// resolver is present (the pattern may contain captures the resolver
    /// reads back per connection). The route bodies forward the raw
    /// request into the transport; no protocol logic runs here.
    ///
    /// Must complete before the router starts accepting traffic. A second
    /// call returns [`RegisterError::AlreadyRegistered`].
    pub fn register(&mut self, router: Router) -> Result<Router, RegisterError> {
        if self.transport.is_some() {
            return Err(RegisterError::AlreadyRegistered);
        }
        for suffix in [&self.sse_route, &self.message_route] {
            if suffix.is_empty() || !suffix.starts_with('/') {
                return Err(RegisterError::InvalidRouteSuffix(suffix.clone()));
            }
        }

        let strategy = match self.dynamic_base_path.clone() {
            Some(resolve) => PathStrategy::Dynamic {
                resolve,
                fallback: normalize_base_path(&self.base_path),
            },
            None => {
                self.base_path = normalize_base_path(&self.base_path);
                PathStrategy::Static(self.base_path.clone())
            }
        };
        let dynamic = strategy.is_dynamic();
        debug!(?strategy, "resolved mounting strategy");

        let config = TransportConfig {
            path_strategy: strategy,
            sse_path: self.sse_route.clone(),
            post_path: self.message_route.clone(),
            base_url: self.base_url.clone(),
            context_fn: self.context_fn.clone(),
        };
        let options = self.transport_options.take().unwrap_or_default();
        let transport = Arc::new(E::transport(self.engine.clone(), config, options));
        self.transport = Some(transport.clone());

        let sse_path = join_route(&self.base_path, &self.sse_route);
        let message_path = join_route(&self.base_path, &self.message_route);
        info!(sse = %sse_path, message = %message_path, "registering MCP routes");

        let router = if dynamic {
            let sse_transport = transport.clone();
            let message_transport = transport;
            router
                .route(
                    &sse_path,
                    get(move |params: RawPathParams, request: Request| {
                        let transport = sse_transport.clone();
                        async move {
                            let ctx = RequestContext::from_request(&params, &request);
                            transport.handle_sse(ctx, request).await
                        }
                    }),
                )
                .route(
                    &message_path,
                    post(move |params: RawPathParams, request: Request| {
                        let transport = message_transport.clone();
                        async move {
                            let ctx = RequestContext::from_request(&params, &request);
                            transport.handle_message(ctx, request).await
                        }
                    }),
                )
        } else {
            let sse_transport = transport.clone();
            let message_transport = transport;
            router
                .route(
                    &sse_path,
                    get(move |params: RawPathParams, request: Request| {
                        let transport = sse_transport.clone();
                        async move {
                            let ctx = RequestContext::from_request(&params, &request);
                            transport.handle(ctx, request).await
                        }
                    }),
                )
                .route(
                    &message_path,
                    post(move |params: RawPathParams, request: Request| {
                        let transport = message_transport.clone();
                        async move {
                            let ctx = RequestContext::from_request(&params, &request);
                            transport.handle(ctx, request).await
                        }
                    }),
                )
        };

        Ok(router)
    }

    /// The underlying engine instance.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// The transport instance, once registered.
    pub fn transport(&self) -> Option<&Arc<E::Transport>> {
        self.transport.as_ref()
    }

    /// The configured base path; rewritten to its normalized form by a
    /// static registration.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Add a tool visible to every session.
    pub async fn add_tool(&self, tool: ServerTool) {
        self.engine.add_tool(tool).await;
    }

    /// Add several tools visible to every session.
    pub async fn add_tools(&self, tools: Vec<ServerTool>) {
        self.engine.add_tools(tools).await;
    }

    /// Add a tool visible only to the named session.
    pub async fn add_session_tool(
        &self,
        session_id: &str,
        tool: ServerTool,
    ) -> Result<(), EngineError> {
        self.engine.add_session_tool(session_id, tool).await
    }

    /// Add several tools visible only to the named session.
    pub async fn add_session_tools(
        &self,
        session_id: &str,
        tools: Vec<ServerTool>,
    ) -> Result<(), EngineError> {
        self.engine.add_session_tools(session_id, tools).await
    }

    /// Remove the named tools from the named session.
    pub async fn delete_session_tools(
        &self,
        session_id: &str,
        names: &[String],
    ) -> Result<(), EngineError> {
        self.engine.delete_session_tools(session_id, names).await
    }

    /// Broadcast a notification to every connected client.
    pub async fn notify_all_clients(
        &self,
        method: &str,
        params: serde_json::Map<String, serde_json::Value>,
    ) {
        self.engine.notify_all_clients(method, params).await;
    }

    /// Send a notification to one connected client.
    pub async fn notify_client(
        &self,
        session_id: &str,
        method: &str,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), EngineError> {
        self.engine.notify_client(session_id, method, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::doubles::InMemoryEngine;

    #[test]
    fn test_builder_defaults() {
        let builder = McpHandler::<InMemoryEngine>::builder("t", "1");
        assert_eq!(builder.base_path, "/mcp");
        assert_eq!(builder.sse_route, "/sse");
        assert_eq!(builder.message_route, "/message");
        assert!(builder.base_url.is_none());
        assert!(builder.dynamic_base_path.is_none());
        assert!(builder.context_fn.is_none());
    }

    #[test]
    fn test_later_setter_wins_per_field() {
        let builder = McpHandler::<InMemoryEngine>::builder("t", "1")
            .base_path("/first")
            .sse_route("/stream")
            .base_path("/second");

        assert_eq!(builder.base_path, "/second");
        // Distinct fields are untouched by later setters for other fields.
        assert_eq!(builder.sse_route, "/stream");
    }

    #[test]
    fn test_auth_installs_context_bridge() {
        let builder = McpHandler::<InMemoryEngine>::builder("t", "1").auth(|_ctx| false);
        let bridge = builder.context_fn.expect("auth installs a bridge");

        let denied = bridge(Extensions::new(), &RequestContext::default());
        assert_eq!(denied.unwrap_err(), ContextRejection::Unauthorized);
    }
}
