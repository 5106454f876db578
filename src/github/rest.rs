use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
    config::OrgDeskConfig,
    error::{Error, Result},
    github::{GitHubApi, Method},
};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const X_GITHUB_API_VERSION: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
const X_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// [`GitHubApi`] over HTTPS, authenticated with the caller's bearer token.
pub struct RestClient {
    http: Client,
    base: Url,
    token: String,
}

impl RestClient {
    pub fn new(config: &OrgDeskConfig, token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::config("access token is required"));
        }

        let http = Client::builder().user_agent(&config.user_agent).build()?;

        // `Url::join` drops the last path segment unless the base ends with a slash, which
        // matters for GitHub Enterprise roots like `https://host/api/v3`
        let mut base = config.github_api_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            http,
            base,
            token: token.to_owned(),
        })
    }

    /// Resolves `path` under the API root. Dot segments and escapes are refused, since
    /// `Url::join` would resolve them and leave the intended endpoint.
    fn url(&self, path: &str) -> Result<Url> {
        let escapes_root = path.contains('%')
            || path
                .split('/')
                .any(|segment| segment == "." || segment == "..");
        if escapes_root {
            return Err(Error::invalid_argument(format!(
                "refusing to request `{}`",
                path
            )));
        }

        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::invalid_argument(format!("invalid API path `{}`: {}", path, e)))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, GITHUB_MEDIA_TYPE)
            .header(X_GITHUB_API_VERSION, API_VERSION)
    }
}

#[derive(Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}

fn log_rate_limit(response: &Response) {
    let remaining = response
        .headers()
        .get(X_RATELIMIT_REMAINING)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    match remaining {
        Some(0) => warn!("GitHub rate limit exhausted, further requests will fail"),
        Some(remaining) => debug!("{} GitHub requests left in rate limit window", remaining),
        None => {}
    }
}

async fn handle_response(response: Response) -> Result<Option<Value>> {
    log_rate_limit(&response);
    let status = response.status();

    if !status.is_success() {
        let message = match response.json::<GitHubErrorBody>().await {
            Ok(GitHubErrorBody {
                message: Some(message),
            }) => message,
            _ => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_owned(),
        };
        debug!("GitHub answered {}: {}", status, message);
        return Err(Error::upstream(status.as_u16(), message));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = response.bytes().await?;
    if body.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&body)?))
}

#[async_trait]
impl GitHubApi for RestClient {
    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path)?;
        trace!("GET {} {:?}", url, query);

        let response = self
            .request(reqwest::Method::GET, url)
            .query(query)
            .send()
            .await?;

        handle_response(response)
            .await?
            .ok_or_else(|| Error::upstream(204, format!("GET {} returned no content", path)))
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Option<Value>> {
        let url = self.url(path)?;
        trace!("{:?} {}", method, url);

        let method = match method {
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut request = self.request(method, url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        handle_response(request.send().await?).await
    }
}
