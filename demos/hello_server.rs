//! Minimal server mounting the MCP handler next to an ordinary route.
//!
//! Uses the in-memory engine double in place of a live protocol backend,
//! which keeps the demo self-contained: the streaming endpoint still
//! answers with its endpoint advertisement and the `hello` tool is
//! registered and invocable through the engine.
//!
//! Run with `cargo run --example hello_server`, then:
//!
//! ```text
//! curl http://127.0.0.1:8080/ping
//! curl http://127.0.0.1:8080/api/mcp/sse
//! ```

use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Json, Router};
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use axum_mcp::engine::ServerTool;
use axum_mcp::handler::McpHandler;
use axum_mcp::test_utils::doubles::{EngineSetting, InMemoryEngine};

fn hello_tool() -> ServerTool {
    let schema = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "name to greet" }
        },
        "required": ["name"],
    });
    let definition = Tool {
        name: "hello".into(),
        description: Some("Greet someone by name".into()),
        input_schema: Arc::new(schema.as_object().cloned().expect("object schema")),
        annotations: None,
        title: None,
        icons: None,
        output_schema: None,
    };

    ServerTool::new(definition, |arguments| async move {
        let name = arguments
            .as_ref()
            .and_then(|args| args.get("name"))
            .and_then(|value| value.as_str())
            .unwrap_or("world");
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Hello, {name}!"
        ))]))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut handler = McpHandler::<InMemoryEngine>::builder("example-server", "1.0.0")
        .base_path("/api/mcp")
        .engine_options([EngineSetting::ToolCapabilities(true)])
        .build();

    handler.add_tool(hello_tool()).await;

    let app = handler
        .register(Router::new())?
        .route("/ping", get(|| async { Json(json!({"message": "pong"})) }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!("serving on http://127.0.0.1:8080 (SSE endpoint at /api/mcp/sse)");
    axum::serve(listener, app).await?;

    Ok(())
}
