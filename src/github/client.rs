use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
    Patch,
    Delete,
}

/// Minimal surface of the GitHub REST API the aggregator needs.
///
/// Paths are relative to the API root (`/orgs/prologin/members`). Implementations turn non-2xx
/// responses into [`crate::error::Error::Upstream`].
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Fetches a single resource or page. `query` is appended as URL query parameters.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;

    /// Performs a mutation. Returns `None` when GitHub answers without a body (`204 No Content`).
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Value>>;
}
