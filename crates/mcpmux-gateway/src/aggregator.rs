//! Response Aggregator: fan out `list_tools`/`list_resources`/`list_prompts`
//! across every running backend, namespace the results, and merge them into
//! one list.
//!
//! Grounded on `original_source/mcp_manager/routing/aggregator.py`'s
//! `ResponseAggregator`: a concurrent `asyncio.gather(..., return_exceptions=True)`
//! fan-out per item kind, where a failing or timed-out backend contributes
//! nothing and is logged rather than aborting the whole aggregation.
//! Prompts are tolerated as unsupported per backend (`_get_server_prompts`'s
//! `hasattr(process, "list_prompts")` fallback to an empty result) — here
//! restated as "an error calling `list_prompts` contributes nothing", since
//! every [`BackendSession`] exposes the method uniformly.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;
use turbomcp_protocol::types::{Prompt, Resource, Tool};

use crate::namespace::{namespace_description, namespace_item, namespace_resource};
use crate::session::BackendSession;

/// Aggregates per-backend list responses into one namespaced list.
pub struct Aggregator;

impl Aggregator {
    /// Collect tools from every session in `sessions`, namespaced as
    /// `server_id.tool_name` with a `[server_id]`-prefixed description.
    /// The merged list is ordered by server-id (sessions may arrive from a
    /// `DashMap` iterator in no particular order); each backend's own tool
    /// order is preserved within its namespace.
    pub async fn aggregate_tools(sessions: &[Arc<BackendSession>]) -> Vec<Tool> {
        if sessions.is_empty() {
            warn!("no active backend sessions for tool aggregation");
            return Vec::new();
        }

        let mut join_set = JoinSet::new();
        for session in sessions {
            let session = Arc::clone(session);
            join_set.spawn(async move {
                let server_id = session.server_id().to_string();
                let result = session.list_tools().await;
                (server_id, result)
            });
        }

        let mut by_server = std::collections::HashMap::new();
        while let Some(outcome) = join_set.join_next().await {
            match outcome {
                Ok((server_id, Ok(tools))) => {
                    by_server.insert(server_id, tools);
                }
                Ok((server_id, Err(e))) => {
                    warn!(server_id = %server_id, error = %e, "failed to list tools");
                }
                Err(join_err) => warn!(error = %join_err, "list_tools task panicked"),
            }
        }

        let mut server_ids: Vec<String> = by_server.keys().cloned().collect();
        server_ids.sort_unstable();

        let mut all_tools = Vec::new();
        for server_id in server_ids {
            let Some(tools) = by_server.remove(&server_id) else {
                continue;
            };
            for tool in tools {
                all_tools.push(Tool {
                    name: namespace_item(&server_id, &tool.name),
                    description: Some(namespace_description(&server_id, tool.description.as_deref())),
                    ..tool
                });
            }
        }
        all_tools
    }

    /// Collect resources from every session in `sessions`, namespaced as
    /// `mcp://server_id/uri`.
    pub async fn aggregate_resources(sessions: &[Arc<BackendSession>]) -> Vec<Resource> {
        if sessions.is_empty() {
            warn!("no active backend sessions for resource aggregation");
            return Vec::new();
        }

        let mut join_set = JoinSet::new();
        for session in sessions {
            let session = Arc::clone(session);
            join_set.spawn(async move {
                let server_id = session.server_id().to_string();
                let result = session.list_resources().await;
                (server_id, result)
            });
        }

        let mut by_server = std::collections::HashMap::new();
        while let Some(outcome) = join_set.join_next().await {
            match outcome {
                Ok((server_id, Ok(resources))) => {
                    by_server.insert(server_id, resources);
                }
                Ok((server_id, Err(e))) => {
                    warn!(server_id = %server_id, error = %e, "failed to list resources");
                }
                Err(join_err) => warn!(error = %join_err, "list_resources task panicked"),
            }
        }

        let mut server_ids: Vec<String> = by_server.keys().cloned().collect();
        server_ids.sort_unstable();

        let mut all_resources = Vec::new();
        for server_id in server_ids {
            let Some(resources) = by_server.remove(&server_id) else {
                continue;
            };
            for resource in resources {
                all_resources.push(Resource {
                    uri: namespace_resource(&server_id, &resource.uri),
                    name: namespace_item(&server_id, &resource.name),
                    description: Some(namespace_description(
                        &server_id,
                        resource.description.as_deref(),
                    )),
                    ..resource
                });
            }
        }
        all_resources
    }

    /// Collect prompts from every session in `sessions`, namespaced as
    /// `server_id.prompt_name`. A backend that errors on `list_prompts`
    /// (including one that simply doesn't support prompts) contributes
    /// nothing, matching the original's tolerant fallback.
    pub async fn aggregate_prompts(sessions: &[Arc<BackendSession>]) -> Vec<Prompt> {
        if sessions.is_empty() {
            return Vec::new();
        }

        let mut join_set = JoinSet::new();
        for session in sessions {
            let session = Arc::clone(session);
            join_set.spawn(async move {
                let server_id = session.server_id().to_string();
                let result = session.list_prompts().await;
                (server_id, result)
            });
        }

        let mut by_server = std::collections::HashMap::new();
        while let Some(outcome) = join_set.join_next().await {
            match outcome {
                Ok((server_id, Ok(prompts))) => {
                    by_server.insert(server_id, prompts);
                }
                Ok((server_id, Err(e))) => {
                    warn!(server_id = %server_id, error = %e, "failed to list prompts (or unsupported)");
                }
                Err(join_err) => warn!(error = %join_err, "list_prompts task panicked"),
            }
        }

        let mut server_ids: Vec<String> = by_server.keys().cloned().collect();
        server_ids.sort_unstable();

        let mut all_prompts = Vec::new();
        for server_id in server_ids {
            let Some(prompts) = by_server.remove(&server_id) else {
                continue;
            };
            for prompt in prompts {
                all_prompts.push(Prompt {
                    name: namespace_item(&server_id, &prompt.name),
                    description: Some(namespace_description(
                        &server_id,
                        prompt.description.as_deref(),
                    )),
                    ..prompt
                });
            }
        }
        all_prompts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_session_list_yields_empty_aggregation() {
        let sessions: Vec<Arc<BackendSession>> = Vec::new();
        assert!(Aggregator::aggregate_tools(&sessions).await.is_empty());
        assert!(Aggregator::aggregate_resources(&sessions).await.is_empty());
        assert!(Aggregator::aggregate_prompts(&sessions).await.is_empty());
    }
}
