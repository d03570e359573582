//! Base-path canonicalization.

/// Canonicalize a configured base path.
///
/// The result always starts with `/` and never ends with `/`, with `/`
/// itself as the only exception. The empty string maps to `/`. Total over
/// all inputs and idempotent, so it is safe to apply to paths that were
/// already normalized.
pub fn normalize_base_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// Join a mount path and a route suffix without producing `//` when the
/// mount path is the root.
pub(crate) fn join_route(base: &str, suffix: &str) -> String {
    if base == "/" {
        suffix.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_maps_to_root() {
        assert_eq!(normalize_base_path(""), "/");
    }

    #[test]
    fn test_missing_leading_slash_prepended() {
        assert_eq!(normalize_base_path("mcp"), "/mcp");
        assert_eq!(normalize_base_path("api/mcp"), "/api/mcp");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        assert_eq!(normalize_base_path("/mcp/"), "/mcp");
        assert_eq!(normalize_base_path("api/mcp/"), "/api/mcp");
    }

    #[test]
    fn test_root_is_fixpoint() {
        assert_eq!(normalize_base_path("/"), "/");
    }

    #[test]
    fn test_idempotent() {
        for input in ["", "/", "mcp", "/mcp", "/mcp/", "mcp/", "/a/b/c/", "///", "/mcp//"] {
            let once = normalize_base_path(input);
            assert_eq!(normalize_base_path(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_repeated_trailing_slashes_stripped() {
        assert_eq!(normalize_base_path("/mcp//"), "/mcp");
        assert_eq!(normalize_base_path("///"), "/");
    }

    #[test]
    fn test_join_route() {
        assert_eq!(join_route("/mcp", "/sse"), "/mcp/sse");
        assert_eq!(join_route("/", "/sse"), "/sse");
    }
}
