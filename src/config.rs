use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// GitHub never serves more than this many items per page.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct OrgDeskConfig {
    /// Login of the GitHub organization managed by this instance
    pub github_org: String,
    /// Base URL of the GitHub REST API, override it for GitHub Enterprise Server
    #[serde(default = "default_api_url")]
    pub github_api_url: Url,
    /// Number of items requested per page on every list endpoint
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// `User-Agent` sent to GitHub, which rejects requests without one
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> Url {
    Url::parse("https://api.github.com/").expect("static URL is valid")
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_user_agent() -> String {
    format!("orgdesk/{}", env!("CARGO_PKG_VERSION"))
}

impl OrgDeskConfig {
    #[cfg(test)]
    pub fn new(github_org: impl Into<String>) -> Self {
        Self {
            github_org: github_org.into(),
            github_api_url: default_api_url(),
            page_size: default_page_size(),
            user_agent: default_user_agent(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.github_org.trim().is_empty() {
            return Err(Error::config("GitHub organization not configured"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        Ok(())
    }
}
