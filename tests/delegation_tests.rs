//! Delegation facade behavior against the in-memory engine.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::json;

use axum_mcp::engine::ServerTool;
use axum_mcp::error::EngineError;
use axum_mcp::handler::McpHandler;
use axum_mcp::test_utils::doubles::InMemoryEngine;

fn tool(name: &str) -> ServerTool {
    let schema = json!({
        "type": "object",
        "properties": {},
    });
    let definition = Tool {
        name: name.to_string().into(),
        description: Some(format!("test tool {name}").into()),
        input_schema: Arc::new(schema.as_object().cloned().unwrap()),
        annotations: None,
        title: None,
        icons: None,
        output_schema: None,
    };

    let reply = format!("{name} ok");
    ServerTool::new(definition, move |_arguments| {
        let reply = reply.clone();
        async move { Ok(CallToolResult::success(vec![Content::text(reply)])) }
    })
}

fn params(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// Global tools
// ============================================================================

#[tokio::test]
async fn test_add_tool_is_forwarded_and_invocable() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    handler.add_tool(tool("hello")).await;
    assert_eq!(handler.engine().tool_names().await, vec!["hello"]);

    let result = handler.engine().call_tool("hello", None).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_add_tools_registers_every_tool() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    handler.add_tools(vec![tool("alpha"), tool("beta")]).await;
    assert_eq!(handler.engine().tool_names().await, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_concurrent_add_tool_calls_both_succeed() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    tokio::join!(handler.add_tool(tool("alpha")), handler.add_tool(tool("beta")));

    assert_eq!(handler.engine().tool_names().await, vec!["alpha", "beta"]);
    assert!(handler.engine().call_tool("alpha", None).await.is_ok());
    assert!(handler.engine().call_tool("beta", None).await.is_ok());
}

// ============================================================================
// Session-scoped tools
// ============================================================================

#[tokio::test]
async fn test_add_session_tool_unknown_session_is_an_error() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    let err = handler.add_session_tool("missing", tool("x")).await.unwrap_err();
    assert_eq!(err, EngineError::SessionNotFound("missing".to_string()));

    // Nothing leaked into the global registry.
    assert!(handler.engine().tool_names().await.is_empty());
}

#[tokio::test]
async fn test_delete_session_tools_unknown_session_is_an_error() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    let err = handler
        .delete_session_tools("missing", &["x".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionNotFound("missing".to_string()));
}

#[tokio::test]
async fn test_session_tool_roundtrip() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();
    handler.engine().open_session("s1").await;

    handler
        .add_session_tools("s1", vec![tool("alpha"), tool("beta")])
        .await
        .unwrap();
    assert_eq!(
        handler.engine().session_tool_names("s1").await,
        Some(vec!["alpha".to_string(), "beta".to_string()])
    );

    handler
        .delete_session_tools("s1", &["alpha".to_string()])
        .await
        .unwrap();
    assert_eq!(
        handler.engine().session_tool_names("s1").await,
        Some(vec!["beta".to_string()])
    );

    // Session scoping never touches the global registry.
    assert!(handler.engine().tool_names().await.is_empty());
}

#[tokio::test]
async fn test_session_tools_are_isolated_per_session() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();
    handler.engine().open_session("s1").await;
    handler.engine().open_session("s2").await;

    handler.add_session_tool("s1", tool("alpha")).await.unwrap();

    assert_eq!(
        handler.engine().session_tool_names("s1").await,
        Some(vec!["alpha".to_string()])
    );
    assert_eq!(handler.engine().session_tool_names("s2").await, Some(vec![]));
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_notify_all_clients_is_recorded_as_broadcast() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    handler
        .notify_all_clients(
            "notifications/tools/list_changed",
            params(json!({"reason": "reload"})),
        )
        .await;

    let notifications = handler.engine().notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].session_id, None);
    assert_eq!(notifications[0].method, "notifications/tools/list_changed");
    assert_eq!(notifications[0].params["reason"], json!("reload"));
}

#[tokio::test]
async fn test_notify_client_requires_existing_session() {
    let handler = McpHandler::<InMemoryEngine>::builder("t", "1").build();

    let err = handler
        .notify_client("missing", "notifications/message", params(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SessionNotFound("missing".to_string()));

    handler.engine().open_session("s1").await;
    handler
        .notify_client("s1", "notifications/message", params(json!({"level": "info"})))
        .await
        .unwrap();

    let notifications = handler.engine().notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].session_id.as_deref(), Some("s1"));
}
