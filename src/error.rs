use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while talking to GitHub on behalf of a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing organization, missing token or otherwise unusable settings. Detected before any
    /// upstream call is made.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected locally before any upstream call, e.g. an empty team name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// GitHub answered with a non-2xx status.
    #[error("GitHub responded with {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("couldn't reach GitHub: {0}")]
    Network(#[from] reqwest::Error),

    #[error("couldn't decode GitHub response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    InvalidArgument,
    NotFound,
    /// 422: the resource already exists or the request was semantically invalid.
    Invalid,
    Unauthorized,
    RateLimited,
    Upstream,
    Network,
    Decode,
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status GitHub answered with, if the failure came from GitHub at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Upstream { status, message } => match status {
                404 => ErrorKind::NotFound,
                422 => ErrorKind::Invalid,
                429 => ErrorKind::RateLimited,
                // GitHub reports primary rate limits as a 403
                403 if message.to_lowercase().contains("rate limit") => ErrorKind::RateLimited,
                401 | 403 => ErrorKind::Unauthorized,
                _ => ErrorKind::Upstream,
            },
            Self::Network(_) => ErrorKind::Network,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }
}
