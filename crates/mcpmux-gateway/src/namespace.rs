//! Namespacing helpers for tools, prompts, and resources.
//!
//! Grounded on `original_source/mcp_manager/routing/router.py`
//! (`_parse_namespaced_tool`, `_parse_namespaced_resource`) and
//! `original_source/mcp_manager/routing/aggregator.py`'s rewrite rules.
//! Namespacing is total and injective per spec.md §3 invariant 6:
//! `(server_id, name) ↔ "server_id.name"` and
//! `(server_id, uri) ↔ "mcp://server_id/uri"`.

use crate::error::GatewayError;

/// Build the namespaced tool or prompt identifier `server_id.name`.
pub fn namespace_item(server_id: &str, name: &str) -> String {
    format!("{server_id}.{name}")
}

/// Parse a namespaced tool or prompt identifier into `(server_id, name)`.
///
/// The prefix up to the first `.` is the server id; a missing `.` is a
/// parse error.
pub fn parse_namespaced_item(namespaced: &str) -> Result<(&str, &str), GatewayError> {
    namespaced.split_once('.').ok_or_else(|| {
        GatewayError::invalid_request(format!(
            "'{namespaced}' is not a namespaced identifier (expected 'server.name')"
        ))
    })
}

/// Build the namespaced resource URI `mcp://server_id/uri`.
pub fn namespace_resource(server_id: &str, uri: &str) -> String {
    format!("mcp://{server_id}/{uri}")
}

/// Parse a namespaced resource URI into `(server_id, uri)`.
pub fn parse_namespaced_resource(namespaced: &str) -> Result<(&str, &str), GatewayError> {
    let rest = namespaced.strip_prefix("mcp://").ok_or_else(|| {
        GatewayError::invalid_request(format!(
            "'{namespaced}' is not a namespaced resource uri (expected 'mcp://server/uri')"
        ))
    })?;
    rest.split_once('/').ok_or_else(|| {
        GatewayError::invalid_request(format!(
            "'{namespaced}' is missing a backend-native uri after the server id"
        ))
    })
}

/// Prefix a description with `[server_id]`, per §4.D/§6.
pub fn namespace_description(server_id: &str, description: Option<&str>) -> String {
    match description {
        Some(description) => format!("[{server_id}] {description}"),
        None => format!("[{server_id}]"),
    }
}

/// Reduce a resource uri to a bare "resource name" for access-rule matching:
/// if it contains a `scheme://host/` prefix, drop the scheme and the first
/// path segment, keeping the remainder. Grounded on
/// `original_source/mcp_manager/access/permission_engine.py`'s
/// `_extract_resource_name`.
pub fn resource_name_for_matching(uri: &str) -> &str {
    match uri.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or(rest, |(_, remainder)| remainder),
        None => uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn item_round_trips() {
        let namespaced = namespace_item("fs", "read_file");
        assert_eq!(namespaced, "fs.read_file");
        assert_eq!(parse_namespaced_item(&namespaced).unwrap(), ("fs", "read_file"));
    }

    #[test]
    fn resource_round_trips() {
        let namespaced = namespace_resource("fs", "file:///a/b");
        assert_eq!(namespaced, "mcp://fs/file:///a/b");
        assert_eq!(
            parse_namespaced_resource(&namespaced).unwrap(),
            ("fs", "file:///a/b")
        );
    }

    #[test]
    fn item_without_dot_is_a_parse_error() {
        assert!(parse_namespaced_item("no_dot_here").is_err());
    }

    #[test]
    fn resource_without_scheme_is_a_parse_error() {
        assert!(parse_namespaced_resource("fs/file.txt").is_err());
    }

    #[test]
    fn resource_name_drops_scheme_and_host() {
        assert_eq!(resource_name_for_matching("file:///a/b"), "/a/b");
        assert_eq!(resource_name_for_matching("bare-name"), "bare-name");
    }

    fn arb_segment() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_-]{0,15}".prop_map(String::from)
    }

    proptest! {
        #[test]
        fn prop_item_namespace_round_trips(server_id in arb_segment(), name in arb_segment()) {
            let namespaced = namespace_item(&server_id, &name);
            let (parsed_server, parsed_name) = parse_namespaced_item(&namespaced).unwrap();
            prop_assert_eq!(parsed_server, server_id.as_str());
            prop_assert_eq!(parsed_name, name.as_str());
        }

        #[test]
        fn prop_resource_namespace_round_trips(server_id in arb_segment(), uri in arb_segment()) {
            let namespaced = namespace_resource(&server_id, &uri);
            let (parsed_server, parsed_uri) = parse_namespaced_resource(&namespaced).unwrap();
            prop_assert_eq!(parsed_server, server_id.as_str());
            prop_assert_eq!(parsed_uri, uri.as_str());
        }
    }
}
