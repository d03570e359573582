//! Mount an SSE-based MCP protocol engine on an axum [`Router`](axum::Router).
//!
//! This crate is the binding layer between an axum application and a
//! session-oriented MCP server ("the protocol engine"): one process serves
//! its ordinary HTTP routes and the two long-lived protocol endpoints
//! (`GET <base>/sse`, `POST <base>/message`) side by side, under a
//! configurable URL prefix. The engine itself is a collaborator behind the
//! [`McpEngine`] trait; session lifecycle, SSE framing, and notification
//! fan-out stay its business, while tool definitions and call results use
//! the standard `rmcp` model types.
//!
//! # Mounting
//!
//! Build a handler, add tools, register it on a router:
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
//! // SSE endpoint at /api/mcp/sse, messages at /api/mcp/message.
//! let app: Router = handler.register(Router::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Multi-tenant mounting
//!
//! With a dynamic base path the route pattern is fixed at registration but
//! the mount path advertised to each client is recomputed per connection
//! from the route's captures:
//!
//! ```rust,no_run
//! use axum::Router;
//! use axum_mcp::handler::McpHandler;
//! use axum_mcp::test_utils::doubles::InMemoryEngine;
//!
//! # fn run() -> Result<(), axum_mcp::error::RegisterError> {
//! let mut handler = McpHandler::<InMemoryEngine>::builder("tenant-server", "1.0.0")
//!     .base_path("/t/{tenant}/mcp")
//!     .base_path_from_param("tenant", "/t/{}/mcp")
//!     .build();
//!
//! let app: Router = handler.register(Router::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! After registration the handler is a thin delegation facade: tool and
//! session-tool management and client notifications forward to the engine
//! unchanged, and engine-reported failures come back verbatim.

pub mod context;
pub mod engine;
pub mod error;
pub mod handler;
pub mod path;
pub mod transport;

// Available to both unit tests and integration tests.
pub mod test_utils;

pub use context::{ContextFn, RequestContext};
pub use engine::{McpEngine, ServerTool, ToolHandlerFn};
pub use error::{ContextRejection, EngineError, RegisterError};
pub use handler::{McpHandler, McpHandlerBuilder};
pub use path::normalize_base_path;
pub use transport::{DynamicBasePathFn, PathStrategy, SseTransport, TransportConfig};
