//! The protocol-engine contract this crate binds against.
//!
//! The engine owns everything protocol-shaped: session lifecycle, SSE
//! framing, per-client tool registries, notification fan-out. This module
//! specifies only the surface the binding layer consumes: construction,
//! transport construction, and the delegated tool, session-tool, and
//! notification operations. Tool definitions and call results use the
//! `rmcp` model vocabulary so engines and callers speak standard MCP types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use rmcp::model::{CallToolResult, Tool};
use rmcp::ErrorData;

use crate::error::EngineError;
use crate::transport::{SseTransport, TransportConfig};

/// Boxed asynchronous tool handler.
///
/// Receives the arguments object from a `tools/call` request (if any) and
/// resolves to the call result or a protocol-level error.
pub type ToolHandlerFn = Arc<
    dyn Fn(
            Option<serde_json::Map<String, serde_json::Value>>,
        ) -> BoxFuture<'static, Result<CallToolResult, ErrorData>>
        + Send
        + Sync,
>;

/// A tool definition paired with the handler that executes it.
#[derive(Clone)]
pub struct ServerTool {
    pub tool: Tool,
    pub handler: ToolHandlerFn,
}

impl ServerTool {
    pub fn new<F, Fut>(tool: Tool, handler: F) -> Self
    where
        F: Fn(Option<serde_json::Map<String, serde_json::Value>>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult, ErrorData>> + Send + 'static,
    {
        Self {
            tool,
            handler: Arc::new(move |arguments| Box::pin(handler(arguments))),
        }
    }

    pub fn name(&self) -> &str {
        self.tool.name.as_ref()
    }
}

impl fmt::Debug for ServerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTool")
            .field("tool", &self.tool.name)
            .finish_non_exhaustive()
    }
}

/// Contract consumed from the external protocol engine.
///
/// Implementations must be safe for concurrent use: once the handler is
/// registered, delegation calls and transport traffic arrive from
/// arbitrarily many tasks at once.
///
/// The session-addressed operations surface
/// [`EngineError::SessionNotFound`] when the named session does not exist;
/// callers treat that as non-fatal and scoped to the one call.
#[async_trait]
pub trait McpEngine: Send + Sync + Sized + 'static {
    /// Opaque engine-construction option, accumulated by the handler
    /// builder and handed to [`McpEngine::build`] in application order.
    type EngineOption: Send;

    /// Opaque transport-construction option, forwarded to
    /// [`McpEngine::transport`] in application order.
    type TransportOption: Send;

    /// The transport type produced for a registration.
    type Transport: SseTransport;

    /// Construct the engine. Called eagerly when the handler builder is
    /// finalized, before any routes exist.
    fn build(name: &str, version: &str, options: Vec<Self::EngineOption>) -> Self;

    /// Construct the transport that turns raw HTTP exchanges into engine
    /// traffic. Called exactly once per registration.
    fn transport(
        engine: Arc<Self>,
        config: TransportConfig,
        options: Vec<Self::TransportOption>,
    ) -> Self::Transport;

    /// Add a tool visible to every session.
    async fn add_tool(&self, tool: ServerTool);

    /// Add several tools visible to every session.
    async fn add_tools(&self, tools: Vec<ServerTool>);

    /// Add a tool visible only to the named session.
    async fn add_session_tool(&self, session_id: &str, tool: ServerTool)
        -> Result<(), EngineError>;

    /// Add several tools visible only to the named session.
    async fn add_session_tools(
        &self,
        session_id: &str,
        tools: Vec<ServerTool>,
    ) -> Result<(), EngineError>;

    /// Remove the named tools from the named session.
    async fn delete_session_tools(
        &self,
        session_id: &str,
        names: &[String],
    ) -> Result<(), EngineError>;

    /// Broadcast a notification to every connected client.
    async fn notify_all_clients(
        &self,
        method: &str,
        params: serde_json::Map<String, serde_json::Value>,
    );

    /// Send a notification to one connected client.
    async fn notify_client(
        &self,
        session_id: &str,
        method: &str,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), EngineError>;
}
