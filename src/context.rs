//! Explicit propagation of router-native request data into the engine.
//!
//! Route handlers installed by [`register`](crate::handler::McpHandler::register)
//! snapshot the values axum attached to the matched request (path captures,
//! headers, URI) into a [`RequestContext`] and thread it, as an explicit
//! parameter, into the transport. A [`ContextFn`] can then fold those values
//! into the per-connection [`Extensions`] carrier the engine sees, or refuse
//! propagation altogether.

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request},
    http::{Extensions, HeaderMap, Uri},
};

use crate::error::ContextRejection;

/// Bridges router-native request data into the engine's per-connection
/// context carrier.
///
/// Invoked by the transport for every connection and message. Returning
/// `Err` signals that propagation is denied and the transport must reject
/// the exchange; [`ContextRejection`] converts into the matching HTTP
/// response. Supplied functions run on the hot path of every request, so
/// they must be cheap, non-blocking, and safe for concurrent invocation.
pub type ContextFn =
    Arc<dyn Fn(Extensions, &RequestContext) -> Result<Extensions, ContextRejection> + Send + Sync>;

/// Router-native request data, captured at dispatch time.
///
/// A cheap snapshot of what the router knew about the request when the
/// route matched. Handed to dynamic base-path resolvers and context
/// bridges instead of having them dig values back out of the raw request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    params: Vec<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
}

impl RequestContext {
    /// Context for a request with no captured path parameters.
    pub fn new(uri: Uri, headers: HeaderMap) -> Self {
        Self {
            params: Vec::new(),
            headers,
            uri,
        }
    }

    pub(crate) fn from_request(params: &RawPathParams, request: &Request) -> Self {
        let mut captured = Vec::new();
        for (name, value) in params {
            captured.push((name.to_string(), value.to_string()));
        }
        Self {
            params: captured,
            headers: request.headers().clone(),
            uri: request.uri().clone(),
        }
    }

    /// Add a captured path parameter. Mainly useful when constructing
    /// contexts by hand, outside of a routed request.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Value of the named path capture from the matched route pattern.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_lookup() {
        let ctx = RequestContext::default()
            .with_param("tenant", "acme")
            .with_param("region", "eu");

        assert_eq!(ctx.param("tenant"), Some("acme"));
        assert_eq!(ctx.param("region"), Some("eu"));
        assert_eq!(ctx.param("missing"), None);
    }

    #[test]
    fn test_default_context_is_empty() {
        let ctx = RequestContext::default();
        assert_eq!(ctx.param("tenant"), None);
        assert!(ctx.headers().is_empty());
    }
}
