//! Deny-first authorization over configured client rules.
//!
//! Grounded on `original_source/mcp_manager/access/permission_engine.py`'s
//! `PermissionEngine`: explicit deny rules always win over explicit allow
//! rules, and a client with no matching rule at all falls back to the
//! `"default"` rule (or is denied outright if even that is absent).

use std::collections::HashMap;

use turbomcp_protocol::types::{Resource, Tool};

use crate::config::{AccessRule, ClientRule};
use crate::namespace::{parse_namespaced_item, parse_namespaced_resource, resource_name_for_matching};

/// Evaluates tool and resource access against configured per-client rules.
pub struct PermissionEngine {
    client_rules: HashMap<String, ClientRule>,
}

impl PermissionEngine {
    /// Build an engine over the given client rules, keyed by client id.
    pub fn new(client_rules: HashMap<String, ClientRule>) -> Self {
        Self { client_rules }
    }

    /// Whether `client_id` may call `tool_name` on `server_id`.
    pub fn check_tool_access(&self, client_id: &str, server_id: &str, tool_name: &str) -> bool {
        let Some(rule) = self.rule_for(client_id) else {
            return false;
        };

        if rule.deny.iter().any(|r| matches(r, server_id, tool_name, Target::Tools)) {
            return false;
        }
        if rule.allow.iter().any(|r| matches(r, server_id, tool_name, Target::Tools)) {
            return true;
        }
        !rule.deny_all_except_allowed
    }

    /// Whether `client_id` may read `resource_uri` on `server_id`.
    pub fn check_resource_access(&self, client_id: &str, server_id: &str, resource_uri: &str) -> bool {
        let Some(rule) = self.rule_for(client_id) else {
            return false;
        };
        let resource_name = resource_name_for_matching(resource_uri);

        if rule
            .deny
            .iter()
            .any(|r| matches(r, server_id, resource_name, Target::Resources))
        {
            return false;
        }
        if rule
            .allow
            .iter()
            .any(|r| matches(r, server_id, resource_name, Target::Resources))
        {
            return true;
        }
        !rule.deny_all_except_allowed
    }

    /// Keep only the tools each client is authorized to call, preserving
    /// the invariant that list responses and direct calls share one
    /// authorization check. `tools_by_server` maps server id to that
    /// server's (already namespaced) tools; a server whose every tool is
    /// filtered out is dropped from the result entirely rather than kept
    /// as an empty entry.
    pub fn filter_tools(
        &self,
        client_id: &str,
        tools_by_server: HashMap<String, Vec<Tool>>,
    ) -> HashMap<String, Vec<Tool>> {
        tools_by_server
            .into_iter()
            .filter_map(|(server_id, tools)| {
                let filtered: Vec<Tool> = tools
                    .into_iter()
                    .filter(|tool| {
                        let tool_name = parse_namespaced_item(&tool.name)
                            .map_or(tool.name.as_str(), |(_, name)| name);
                        self.check_tool_access(client_id, &server_id, tool_name)
                    })
                    .collect();
                (!filtered.is_empty()).then_some((server_id, filtered))
            })
            .collect()
    }

    /// Keep only the resources each client is authorized to read, with the
    /// same per-server mapping shape and empty-list dropping as
    /// [`PermissionEngine::filter_tools`].
    pub fn filter_resources(
        &self,
        client_id: &str,
        resources_by_server: HashMap<String, Vec<Resource>>,
    ) -> HashMap<String, Vec<Resource>> {
        resources_by_server
            .into_iter()
            .filter_map(|(server_id, resources)| {
                let filtered: Vec<Resource> = resources
                    .into_iter()
                    .filter(|resource| {
                        let native_uri = parse_namespaced_resource(&resource.uri)
                            .map_or(resource.uri.as_str(), |(_, uri)| uri);
                        self.check_resource_access(client_id, &server_id, native_uri)
                    })
                    .collect();
                (!filtered.is_empty()).then_some((server_id, filtered))
            })
            .collect()
    }

    fn rule_for(&self, client_id: &str) -> Option<&ClientRule> {
        self.client_rules
            .get(client_id)
            .or_else(|| self.client_rules.get("default"))
    }
}

#[derive(Clone, Copy)]
enum Target {
    Tools,
    Resources,
}

/// A rule matches when its `server` equals `server_id` and `item_name` is
/// covered by the relevant item list: `None` covers everything, `Some([])`
/// covers nothing, and a non-empty list matches by exact name, a literal
/// `"*"`, or a trailing-`*` wildcard prefix.
fn matches(rule: &AccessRule, server_id: &str, item_name: &str, target: Target) -> bool {
    if rule.server != server_id {
        return false;
    }
    let items = match target {
        Target::Tools => &rule.tools,
        Target::Resources => &rule.resources,
    };
    let Some(patterns) = items else {
        return true;
    };
    patterns
        .iter()
        .any(|pattern| pattern == item_name || wildcard_match(item_name, pattern))
}

/// Shell-style trailing-`*` match; any other pattern shape is an exact
/// match, matching the identifier's wildcard convention.
fn wildcard_match(name: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}
