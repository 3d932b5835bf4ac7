use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, SpiderError>;

/// Every way a pipeline stage can fail.
///
/// The expected failures (blocked, empty, no match, no filings, bad status) are reported back
/// to the caller as values; [`SpiderError::is_fault`] separates out the ones that should be
/// propagated instead.
#[derive(Debug, thiserror::Error)]
pub enum SpiderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("request to {url} was blocked (403); try a different IP or User-Agent")]
    Blocked { url: String },

    #[error("no entries found in the feed at {url}")]
    EmptyFeed { url: String },

    #[error("no filing of type(s) {requested} found in the feed")]
    NoMatch { requested: String },

    #[error("no filings found in the HTML page at {url}")]
    NoFilingsFound { url: String },

    #[error("failed to download {url}, status code {status}")]
    Download { url: String, status: StatusCode },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpiderError {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "NetworkError",
            Self::Blocked { .. } => "BlockedError",
            Self::EmptyFeed { .. } => "EmptyFeedError",
            Self::NoMatch { .. } => "NoMatchError",
            Self::NoFilingsFound { .. } => "NoFilingsFoundError",
            Self::Download { .. } => "DownloadError",
            Self::Url(_) => "UrlError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IOError",
        }
    }

    /// Local faults are not part of the normal failure paths and propagate to the caller.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_failures_are_faults() {
        let io = SpiderError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert!(io.is_fault());
        assert_eq!(io.kind(), "IOError");

        let blocked = SpiderError::Blocked {
            url: "https://www.sec.gov/feed".to_string(),
        };
        assert!(!blocked.is_fault());
        assert_eq!(blocked.kind(), "BlockedError");

        let download = SpiderError::Download {
            url: "https://www.sec.gov/x.htm".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        assert!(!download.is_fault());
        assert!(download.to_string().contains("404"));
    }
}
