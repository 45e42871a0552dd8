//! Resolve an inbound connection's client id from its [`ConnectionContext`].
//!
//! Grounded on `original_source/mcp_manager/access/client_identifier.py`'s
//! `ClientIdentifier.identify_client`: walk the configured client rules in
//! order, and return the first whose `identify_by` conditions all match;
//! fall back to `"default"` when nothing matches.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::config::ClientRule;
use crate::model::ConnectionContext;

/// Resolves a client id from connection metadata against configured rules.
pub struct ClientIdentifier {
    rules: Vec<(String, ClientRule)>,
}

impl ClientIdentifier {
    /// Build an identifier over the given client rules, keyed by client id,
    /// preserving the order they were declared in the config file — rules
    /// are evaluated first-match-wins in that order.
    pub fn new(clients: IndexMap<String, ClientRule>) -> Self {
        Self {
            rules: clients.into_iter().collect(),
        }
    }

    /// Identify the client behind `context`, writing the resolved id back
    /// onto it, and returning the same id.
    pub fn identify(&self, context: &mut ConnectionContext) -> String {
        for (client_id, rule) in &self.rules {
            if matches_rule(context, &rule.identify_by) {
                context.client_id = Some(client_id.clone());
                return client_id.clone();
            }
        }
        context.client_id = Some("default".to_string());
        "default".to_string()
    }
}

/// A rule matches when every condition map in `identify_by` matches, and a
/// condition map matches when every (key, expected) pair inside it matches
/// the context.
fn matches_rule(context: &ConnectionContext, conditions: &[HashMap<String, String>]) -> bool {
    conditions.iter().all(|condition| {
        condition
            .iter()
            .all(|(key, expected)| matches_value(&context.extract(key), expected))
    })
}

/// A trailing `*` in `expected` matches any value sharing that prefix;
/// otherwise the match is exact.
fn matches_value(actual: &str, expected: &str) -> bool {
    match expected.strip_suffix('*') {
        Some(prefix) => actual.starts_with(prefix),
        None => actual == expected,
    }
}
