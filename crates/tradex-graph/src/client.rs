//! HTTP client for the Tradex graph API.
//!
//! Every canvas mutation maps to one REST call under
//! `{base_url}/strategies/{strategy_id}`:
//!
//! | Call | Method | Path |
//! |------|--------|------|
//! | create_node | POST | `/nodes` |
//! | delete_node | DELETE | `/nodes/{node_id}` |
//! | move_node | PATCH | `/nodes/{node_id}` |
//! | attach_file | POST | `/nodes/{node_id}/files` |
//! | detach_file | DELETE | `/nodes/{node_id}/files` |
//! | create_edge | POST | `/edges` |
//! | delete_edge | DELETE | `/edges/{edge_id}` |

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, info, warn};
use tradex_core::{EdgeRef, NodeRef, Position, StrategyId};

use crate::error::{GraphError, GraphResult};
use crate::mutation::{BoxFuture, GraphMutation};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`RestGraphClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root (e.g., "https://api.tradex.ai/api").
    pub base_url: String,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct CreateNodeRequest<'a> {
    tool_type: &'a str,
    position: Position,
}

#[derive(Debug, Serialize)]
struct DeleteNodeRequest<'a> {
    tool_type: &'a str,
}

#[derive(Debug, Serialize)]
struct MoveNodeRequest {
    position: Position,
}

#[derive(Debug, Serialize)]
struct FileRequest<'a> {
    file_url: &'a str,
}

/// Client for the remote graph mutation API.
pub struct RestGraphClient {
    /// HTTP client.
    client: Client,
    /// API root.
    base_url: Url,
    /// Bearer token.
    auth_token: Option<String>,
}

impl RestGraphClient {
    /// Create a new graph client.
    pub fn new(config: ClientConfig) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GraphError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GraphError::HttpClient(format!("Invalid base URL {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(GraphError::HttpClient(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token,
        })
    }

    /// `{base_url}/strategies/{strategy_id}/{segments...}`.
    ///
    /// Ids are pushed as single path segments, so `/`, `?` and `#` are
    /// percent-encoded instead of changing the route.
    fn strategy_url(&self, strategy_id: &StrategyId, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("strategies")
                .push(strategy_id.as_str())
                .extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and map non-success statuses to errors.
    async fn send(&self, request: RequestBuilder, what: &str) -> GraphResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GraphError::HttpClient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!(what, "Graph API returned 404");
            return Err(GraphError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(what, status = status.as_u16(), "Graph API call failed");
            return Err(GraphError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl GraphMutation for RestGraphClient {
    fn create_node<'a>(
        &'a self,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<NodeRef>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["nodes"]);
            debug!(%url, tool_type, %position, "Creating node");

            let request = self.client.post(url).json(&CreateNodeRequest {
                tool_type,
                position,
            });
            let node: NodeRef = self
                .send(request, "create node")
                .await?
                .json()
                .await
                .map_err(|e| GraphError::HttpClient(format!("Failed to parse node: {e}")))?;

            info!(node_id = %node.id, tool_type, %strategy_id, "Node created");
            Ok(node)
        })
    }

    fn delete_node<'a>(
        &'a self,
        node_id: &'a str,
        tool_type: &'a str,
        strategy_id: &'a StrategyId,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["nodes", node_id]);
            debug!(%url, "Deleting node");

            let request = self
                .client
                .delete(url)
                .json(&DeleteNodeRequest { tool_type });
            self.send(request, &format!("node {node_id}")).await?;

            info!(node_id, tool_type, %strategy_id, "Node deleted");
            Ok(())
        })
    }

    fn create_edge<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        edge: &'a EdgeRef,
    ) -> BoxFuture<'a, GraphResult<EdgeRef>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["edges"]);
            debug!(%url, source = %edge.source, target = %edge.target, "Creating edge");

            let created: EdgeRef = self
                .send(self.client.post(url).json(edge), "create edge")
                .await?
                .json()
                .await
                .map_err(|e| GraphError::HttpClient(format!("Failed to parse edge: {e}")))?;

            info!(edge_id = %created.id, %strategy_id, "Edge created");
            Ok(created)
        })
    }

    fn delete_edge<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        edge_id: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["edges", edge_id]);
            self.send(self.client.delete(url), &format!("edge {edge_id}"))
                .await?;

            info!(edge_id, %strategy_id, "Edge deleted");
            Ok(())
        })
    }

    fn move_node<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        position: Position,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["nodes", node_id]);
            let request = self.client.patch(url).json(&MoveNodeRequest { position });
            self.send(request, &format!("node {node_id}")).await?;

            debug!(node_id, %position, "Node moved");
            Ok(())
        })
    }

    fn attach_file<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["nodes", node_id, "files"]);
            let request = self.client.post(url).json(&FileRequest { file_url });
            self.send(request, &format!("node {node_id}")).await?;

            info!(node_id, file_url, "File attached");
            Ok(())
        })
    }

    fn detach_file<'a>(
        &'a self,
        strategy_id: &'a StrategyId,
        node_id: &'a str,
        file_url: &'a str,
    ) -> BoxFuture<'a, GraphResult<()>> {
        Box::pin(async move {
            let url = self.strategy_url(strategy_id, &["nodes", node_id, "files"]);
            let request = self.client.delete(url).json(&FileRequest { file_url });
            self.send(request, &format!("file {file_url}")).await?;

            info!(node_id, file_url, "File detached");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_node_request_serialization() {
        let request = CreateNodeRequest {
            tool_type: "image",
            position: Position::new(1.5, 2.0),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"tool_type":"image","position":{"x":1.5,"y":2.0}}"#);
    }

    #[test]
    fn test_strategy_url_trims_trailing_slash() {
        let client = RestGraphClient::new(ClientConfig::new("http://localhost:8080/api/")).unwrap();
        assert_eq!(
            client.strategy_url(&StrategyId::new("s1"), &["nodes"]).as_str(),
            "http://localhost:8080/api/strategies/s1/nodes"
        );
    }

    #[test]
    fn test_strategy_url_escapes_reserved_characters() {
        let client = RestGraphClient::new(ClientConfig::new("http://localhost:8080/api")).unwrap();
        let url = client.strategy_url(&StrategyId::new("s/1"), &["nodes", "a/b?x#y"]);
        assert_eq!(url.path(), "/api/strategies/s%2F1/nodes/a%2Fb%3Fx%23y");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(matches!(
            RestGraphClient::new(ClientConfig::new("not a url")),
            Err(GraphError::HttpClient(_))
        ));
    }
}
