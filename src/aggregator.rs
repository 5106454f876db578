use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{
    config::{OrgDeskConfig, MAX_PAGE_SIZE},
    error::{Error, Result},
    github::{paginate, GitHubApi, Method, RestClient},
};

mod members;
mod repositories;
mod teams;

/// Outcome of fetching a secondary detail for one item of a list.
///
/// A failed detail fetch doesn't fail the list: the documented default is substituted and the
/// item is marked [`Enriched::Defaulted`].
#[derive(Debug, Clone, PartialEq)]
pub enum Enriched<T> {
    Detailed(T),
    Defaulted(T),
}

impl<T> Enriched<T> {
    /// Keeps the fetched detail, or falls back to `T::default()` and logs why.
    pub fn or_default(detail: Result<T>, subject: &str) -> Self
    where
        T: Default,
    {
        match detail {
            Ok(detail) => Self::Detailed(detail),
            Err(e) => {
                warn!(
                    "couldn't fetch details for {}, falling back to defaults: {}",
                    subject, e
                );
                Self::Defaulted(T::default())
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Enriched<U> {
        match self {
            Self::Detailed(value) => Enriched::Detailed(f(value)),
            Self::Defaulted(value) => Enriched::Defaulted(f(value)),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Detailed(value) | Self::Defaulted(value) => value,
        }
    }
}

/// Reads and mutates the state of one GitHub organization on behalf of one caller.
///
/// Every list is fully paginated, and derived views (owner-only repositories, potential
/// collaborators) are computed from fresh upstream data on each call. Operations are split by
/// resource in the `members`, `teams` and `repositories` modules.
pub struct OrgDataAggregator<C> {
    api: C,
    org: String,
    per_page: u32,
}

impl OrgDataAggregator<RestClient> {
    /// Builds an aggregator talking to GitHub with the caller's `token`.
    pub fn from_config(config: &OrgDeskConfig, token: &str) -> Result<Self> {
        config.validate()?;
        let api = RestClient::new(config, token)?;

        Ok(Self::new(api, config.github_org.clone())?.with_page_size(config.page_size))
    }
}

impl<C: GitHubApi> OrgDataAggregator<C> {
    pub fn new(api: C, org: impl Into<String>) -> Result<Self> {
        let org = org.into();
        if org.trim().is_empty() {
            return Err(Error::config("organization name is required"));
        }

        Ok(Self {
            api,
            org,
            per_page: MAX_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }

    async fn paginate<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        paginate(&self.api, path, &[], self.per_page).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.api.get(path, &[]).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends a mutation whose response body we need.
    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, body: Value) -> Result<T> {
        let response = self.api.send(method, path, Some(body)).await?;
        Ok(serde_json::from_value(response.unwrap_or(Value::Null))?)
    }

    /// Sends a mutation and discards whatever GitHub answers.
    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        self.api.send(method, path, body).await.map(|_| ())
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid_argument(format!("{} is required", what)))
    } else {
        Ok(())
    }
}

/// Checks a login, slug or repository name before it is spliced into an API path.
///
/// Separators, escapes and dot segments would let the value address another endpoint once the
/// path is resolved against the API root.
fn path_segment(value: &str, what: &str) -> Result<()> {
    require(value, what)?;

    let forbidden = |c: char| matches!(c, '/' | '\\' | '%' | '?' | '#') || c.is_control();
    if value == "." || value == ".." || value.contains(forbidden) {
        return Err(Error::invalid_argument(format!(
            "`{}` isn't a valid {}",
            value, what
        )));
    }

    Ok(())
}
