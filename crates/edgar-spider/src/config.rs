use crate::error::{Result, SpiderError};
use crate::http::var;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_DOMAIN_ROOT: &str = "https://www.sec.gov";
pub const DEFAULT_USER_AGENT: &str = "MyApp/1.0 (praveen@example.com)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FOLDER: &str = "./buffer/filings";

/// EDGAR's "latest filings" Atom feed.
pub const DEFAULT_FEED: &str = "https://www.sec.gov/cgi-bin/browse-edgar?action=getcurrent&type=&company=&dateb=&owner=include&start=0&count=40&output=atom";

/// How the random part of a written file name is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Naming {
    /// A short identifier generated once per pipeline run.
    #[default]
    Slug,

    /// The first characters of the SHA-256 of the file content.
    ContentHash,
}

impl std::str::FromStr for Naming {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slug" => Ok(Naming::Slug),
            "hash" => Ok(Naming::ContentHash),
            other => Err(SpiderError::Config(format!(
                "FILE_NAMING must be `slug` or `hash`, got `{other}`"
            ))),
        }
    }
}

/// Immutable settings shared by every stage of the pipeline.
///
/// Read once from the environment with [`Config::from_env`], or built directly (tests point
/// `domain_root` at a fake upstream).
#[derive(Clone, Debug)]
pub struct Config {
    pub domain_root: String,
    pub host: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub folder: PathBuf,
    pub naming: Naming,
}

impl Config {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            domain_root: DEFAULT_DOMAIN_ROOT.to_string(),
            host: "www.sec.gov".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            folder: folder.into(),
            naming: Naming::default(),
        }
    }

    /// Build from environment variables, reading a `.env` file first if one exists.
    ///
    /// | variable            | default                            |
    /// |---------------------|------------------------------------|
    /// | `FOLDER_PATH`       | `./buffer/filings`                 |
    /// | `SEC_DOMAIN`        | `https://www.sec.gov`              |
    /// | `USER_AGENT`        | `MyApp/1.0 (praveen@example.com)`  |
    /// | `HTTP_TIMEOUT_SECS` | `30`                               |
    /// | `FILE_NAMING`       | `slug`                             |
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let folder = var("FOLDER_PATH").unwrap_or_else(|_| DEFAULT_FOLDER.to_string());
        let mut config = Config::new(folder);

        if let Ok(domain) = var("SEC_DOMAIN") {
            config = config.with_domain_root(&domain)?;
        }
        if let Ok(user_agent) = var("USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Ok(secs) = var("HTTP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|err| {
                SpiderError::Config(format!("HTTP_TIMEOUT_SECS `{secs}`, error({err})"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(naming) = var("FILE_NAMING") {
            config.naming = naming.parse()?;
        }

        Ok(config)
    }

    /// Point the pipeline at another domain root; the `Host` header follows it.
    pub fn with_domain_root(mut self, root: &str) -> Result<Self> {
        let parsed = Url::parse(root)?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SpiderError::Config(format!("domain root `{root}` has no host")))
            }
        };
        self.domain_root = root.trim_end_matches('/').to_string();
        self.host = host;
        Ok(self)
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_root_sets_host() {
        let config = Config::new("./filings")
            .with_domain_root("http://127.0.0.1:8080/")
            .unwrap();
        assert_eq!(config.domain_root, "http://127.0.0.1:8080");
        assert_eq!(config.host, "127.0.0.1:8080");

        let config = Config::new("./filings");
        assert_eq!(config.domain_root, "https://www.sec.gov");
        assert_eq!(config.host, "www.sec.gov");
    }

    #[test]
    fn bad_domain_root_is_rejected() {
        assert!(Config::new(".").with_domain_root("not a url").is_err());
    }

    #[test]
    fn naming_from_str() {
        assert_eq!("slug".parse::<Naming>().unwrap(), Naming::Slug);
        assert_eq!(" HASH ".parse::<Naming>().unwrap(), Naming::ContentHash);
        assert!(matches!(
            "uuid".parse::<Naming>(),
            Err(SpiderError::Config(_))
        ));
    }
}
