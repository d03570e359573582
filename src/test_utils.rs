//! Test doubles standing in for the external protocol engine.
//!
//! Available to both unit tests and integration tests (and to demos that
//! need an engine without a live MCP backend). [`doubles::InMemoryEngine`]
//! records every delegated operation so tests can assert on what reached
//! the engine, and [`doubles::RecordingTransport`] honors the full
//! transport contract: it applies the context bridge, resolves the mount
//! path per connection, and answers the streaming endpoint with an
//! SSE-style endpoint advertisement.

pub mod doubles {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        extract::Request,
        http::{Extensions, StatusCode},
        response::{IntoResponse, Response},
    };
    use rmcp::model::CallToolResult;
    use tokio::sync::RwLock;

    use crate::context::RequestContext;
    use crate::engine::{McpEngine, ServerTool};
    use crate::error::EngineError;
    use crate::path::join_route;
    use crate::transport::{SseTransport, TransportConfig};

    /// Engine-construction option understood by [`InMemoryEngine`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum EngineSetting {
        ToolCapabilities(bool),
        PromptCapabilities(bool),
        Instructions(String),
    }

    /// Transport-construction option understood by [`RecordingTransport`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TransportSetting {
        KeepAliveSecs(u64),
        EventBufferSize(usize),
    }

    /// One recorded notification; `session_id` is `None` for broadcasts.
    #[derive(Debug, Clone)]
    pub struct Notification {
        pub session_id: Option<String>,
        pub method: String,
        pub params: serde_json::Map<String, serde_json::Value>,
    }

    #[derive(Default)]
    struct EngineState {
        tools: HashMap<String, ServerTool>,
        session_tools: HashMap<String, HashMap<String, ServerTool>>,
        notifications: Vec<Notification>,
    }

    /// In-memory protocol engine.
    ///
    /// Sessions are explicit: operations addressing a session id that was
    /// never opened with [`open_session`](InMemoryEngine::open_session)
    /// fail with [`EngineError::SessionNotFound`], mirroring how a real
    /// engine treats unknown clients.
    pub struct InMemoryEngine {
        name: String,
        version: String,
        settings: Vec<EngineSetting>,
        state: RwLock<EngineState>,
    }

    impl InMemoryEngine {
        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn version(&self) -> &str {
            &self.version
        }

        /// Engine options in the order they were applied.
        pub fn settings(&self) -> &[EngineSetting] {
            &self.settings
        }

        /// Create an empty session so session-scoped operations succeed.
        pub async fn open_session(&self, session_id: &str) {
            self.state
                .write()
                .await
                .session_tools
                .entry(session_id.to_string())
                .or_default();
        }

        /// Names of all globally registered tools, sorted.
        pub async fn tool_names(&self) -> Vec<String> {
            let state = self.state.read().await;
            let mut names: Vec<String> = state.tools.keys().cloned().collect();
            names.sort();
            names
        }

        /// Names of the tools scoped to one session, sorted. `None` when
        /// the session does not exist.
        pub async fn session_tool_names(&self, session_id: &str) -> Option<Vec<String>> {
            let state = self.state.read().await;
            let session = state.session_tools.get(session_id)?;
            let mut names: Vec<String> = session.keys().cloned().collect();
            names.sort();
            Some(names)
        }

        /// Every notification recorded so far, in delivery order.
        pub async fn notifications(&self) -> Vec<Notification> {
            self.state.read().await.notifications.clone()
        }

        /// Invoke a globally registered tool by name.
        pub async fn call_tool(
            &self,
            name: &str,
            arguments: Option<serde_json::Map<String, serde_json::Value>>,
        ) -> Result<CallToolResult, EngineError> {
            let handler = {
                let state = self.state.read().await;
                state.tools.get(name).map(|tool| tool.handler.clone())
            };
            match handler {
                Some(handler) => handler(arguments)
                    .await
                    .map_err(|err| EngineError::Internal(err.to_string())),
                None => Err(EngineError::Internal(format!("tool not found: {name}"))),
            }
        }
    }

    #[async_trait]
    impl McpEngine for InMemoryEngine {
        type EngineOption = EngineSetting;
        type TransportOption = TransportSetting;
        type Transport = RecordingTransport;

        fn build(name: &str, version: &str, options: Vec<EngineSetting>) -> Self {
            Self {
                name: name.to_string(),
                version: version.to_string(),
                settings: options,
                state: RwLock::new(EngineState::default()),
            }
        }

        fn transport(
            engine: Arc<Self>,
            config: TransportConfig,
            options: Vec<TransportSetting>,
        ) -> RecordingTransport {
            RecordingTransport {
                engine,
                config,
                settings: options,
            }
        }

        async fn add_tool(&self, tool: ServerTool) {
            self.state
                .write()
                .await
                .tools
                .insert(tool.name().to_string(), tool);
        }

        async fn add_tools(&self, tools: Vec<ServerTool>) {
            let mut state = self.state.write().await;
            for tool in tools {
                state.tools.insert(tool.name().to_string(), tool);
            }
        }

        async fn add_session_tool(
            &self,
            session_id: &str,
            tool: ServerTool,
        ) -> Result<(), EngineError> {
            let mut state = self.state.write().await;
            let session = state
                .session_tools
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            session.insert(tool.name().to_string(), tool);
            Ok(())
        }

        async fn add_session_tools(
            &self,
            session_id: &str,
            tools: Vec<ServerTool>,
        ) -> Result<(), EngineError> {
            let mut state = self.state.write().await;
            let session = state
                .session_tools
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            for tool in tools {
                session.insert(tool.name().to_string(), tool);
            }
            Ok(())
        }

        async fn delete_session_tools(
            &self,
            session_id: &str,
            names: &[String],
        ) -> Result<(), EngineError> {
            let mut state = self.state.write().await;
            let session = state
                .session_tools
                .get_mut(session_id)
                .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
            for name in names {
                session.remove(name);
            }
            Ok(())
        }

        async fn notify_all_clients(
            &self,
            method: &str,
            params: serde_json::Map<String, serde_json::Value>,
        ) {
            self.state.write().await.notifications.push(Notification {
                session_id: None,
                method: method.to_string(),
                params,
            });
        }

        async fn notify_client(
            &self,
            session_id: &str,
            method: &str,
            params: serde_json::Map<String, serde_json::Value>,
        ) -> Result<(), EngineError> {
            let mut state = self.state.write().await;
            if !state.session_tools.contains_key(session_id) {
                return Err(EngineError::SessionNotFound(session_id.to_string()));
            }
            state.notifications.push(Notification {
                session_id: Some(session_id.to_string()),
                method: method.to_string(),
                params,
            });
            Ok(())
        }
    }

    /// Transport double.
    ///
    /// `handle_sse` answers with the endpoint advertisement a streaming
    /// client would receive on connect, which makes the resolved mount
    /// path observable from plain HTTP assertions. `handle_message`
    /// acknowledges with 202. Both apply the configured context bridge
    /// first and surface its rejection as the response.
    pub struct RecordingTransport {
        engine: Arc<InMemoryEngine>,
        config: TransportConfig,
        settings: Vec<TransportSetting>,
    }

    impl RecordingTransport {
        // Stand-in for engine-issued session ids; the double does not
        // manage real sessions.
        const SESSION_ID: &'static str = "session-1";

        pub fn engine(&self) -> &Arc<InMemoryEngine> {
            &self.engine
        }

        pub fn config(&self) -> &TransportConfig {
            &self.config
        }

        /// Transport options in the order they were applied.
        pub fn settings(&self) -> &[TransportSetting] {
            &self.settings
        }

        fn bridge_context(&self, ctx: &RequestContext) -> Result<Extensions, Response> {
            match &self.config.context_fn {
                Some(context_fn) => {
                    context_fn(Extensions::new(), ctx).map_err(|rejection| rejection.into_response())
                }
                None => Ok(Extensions::new()),
            }
        }
    }

    #[async_trait]
    impl SseTransport for RecordingTransport {
        async fn handle_sse(&self, ctx: RequestContext, _request: Request) -> Response {
            if let Err(rejection) = self.bridge_context(&ctx) {
                return rejection;
            }

            let mount = self.config.path_strategy.mount_path(&ctx, Self::SESSION_ID);
            let endpoint = format!(
                "{}{}?sessionId={}",
                self.config.base_url.as_deref().unwrap_or(""),
                join_route(&mount, &self.config.post_path),
                Self::SESSION_ID,
            );
            (
                StatusCode::OK,
                [("content-type", "text/event-stream")],
                format!("event: endpoint\ndata: {endpoint}\n\n"),
            )
                .into_response()
        }

        async fn handle_message(&self, ctx: RequestContext, _request: Request) -> Response {
            if let Err(rejection) = self.bridge_context(&ctx) {
                return rejection;
            }
            StatusCode::ACCEPTED.into_response()
        }
    }
}
