use crate::client::Client;
use crate::config::Config;
use crate::error::{Result, SpiderError};
use crate::fs::FileNamer;
use reqwest::StatusCode;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info};
use url::Url;

/// Appended to every downloaded file name (`x.htm` is saved as `x.html`).
pub const NAME_SUFFIX: char = 'l';

/// A filing document saved to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DownloadArtifact {
    pub file_path: PathBuf,
    pub source_url: String,
}

/// Resolve an inline viewer link to the raw document it displays.
///
/// `.../ix?doc=/Archives/x.htm` becomes `{domain_root}/Archives/x.htm`; other links are
/// returned unchanged.
pub fn resolve_url(url: &str, domain_root: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let doc = parsed
        .query_pairs()
        .find(|(key, value)| key == "doc" && !value.is_empty())
        .map(|(_, value)| value.into_owned());

    Ok(match doc {
        Some(doc) => format!("{domain_root}{doc}"),
        None => url.to_string(),
    })
}

/// The basename of the URL path with [`NAME_SUFFIX`] appended.
pub fn artifact_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let basename = parsed.path().rsplit('/').next().unwrap_or_default();
    Ok(format!("{basename}{NAME_SUFFIX}"))
}

/// GET the document behind `url` and write its raw bytes into the configured folder.
///
/// The file keeps its plain name unless an earlier run already saved one under it, in which
/// case the run's identifier is prefixed.
pub async fn download(
    client: &Client,
    config: &Config,
    namer: &FileNamer,
    url: &str,
) -> Result<DownloadArtifact> {
    info!("fetching: {url}");
    let resolved = resolve_url(url, &config.domain_root)?;
    if resolved != url {
        debug!("inline viewer link resolved to {resolved}");
    }

    let fetched = client.fetch(&resolved).await?;
    if fetched.status != StatusCode::OK {
        error!(
            "failed to download file from {resolved}, status code {}",
            fetched.status
        );
        return Err(SpiderError::Download {
            url: resolved,
            status: fetched.status,
        });
    }

    let name = artifact_name(&resolved)?;
    let names = [
        name.clone(),
        format!("{}_{name}", namer.key(&fetched.body)),
    ];
    let file_path = namer.save(&config.folder, &names, &fetched.body).await?;

    info!("file saved as {:?}", file_path);
    Ok(DownloadArtifact {
        file_path,
        source_url: resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://www.sec.gov";

    #[test]
    fn inline_viewer_links_resolve_to_the_document() {
        assert_eq!(
            resolve_url(
                "https://www.sec.gov/ixviewer/ix.html?doc=/Archives/foo.xml",
                ROOT
            )
            .unwrap(),
            "https://www.sec.gov/Archives/foo.xml"
        );
        assert_eq!(
            resolve_url("http://127.0.0.1:9000/ix?doc=/Archives/foo.xml", "http://127.0.0.1:9000")
                .unwrap(),
            "http://127.0.0.1:9000/Archives/foo.xml"
        );
    }

    #[test]
    fn plain_links_are_unchanged() {
        let url = "https://www.sec.gov/Archives/edgar/data/1/full.txt";
        assert_eq!(resolve_url(url, ROOT).unwrap(), url);
        let url = "https://www.sec.gov/ix?doc=";
        assert_eq!(resolve_url(url, ROOT).unwrap(), url);
        assert!(matches!(
            resolve_url("/Archives/foo.xml", ROOT),
            Err(SpiderError::Url(_))
        ));
    }

    // The trailing `l` turns `.htm` into `.html`, but also `.xml` into `.xmll`.
    #[test]
    fn artifact_name_appends_suffix() {
        assert_eq!(
            artifact_name("https://www.sec.gov/Archives/edgar/data/1/document.htm").unwrap(),
            "document.html"
        );
        assert_eq!(
            artifact_name("https://www.sec.gov/Archives/edgar/data/1/document.html").unwrap(),
            "document.htmll"
        );
        assert_eq!(
            artifact_name("https://www.sec.gov/Archives/foo.xml?x=1").unwrap(),
            "foo.xmll"
        );
        assert_eq!(artifact_name("https://www.sec.gov/").unwrap(), "l");
    }
}
