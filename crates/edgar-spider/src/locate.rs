use crate::client::{Client, ResponseKind};
use crate::config::Config;
use crate::error::{Result, SpiderError};
use crate::feed::{self, FeedEntry};
use crate::fs::{file_safe, FileNamer};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};

/// Table rows mentioning any of these are treated as filing rows.
const FILING_KEYWORDS: [&str; 3] = ["10-K", "10-Q", "8-K"];

/// What a filing link turned out to point at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocatedDocument {
    /// A sub-feed: its first entry, recorded to `path`.
    Record { path: PathBuf, entry: FeedEntry },

    /// A filing index page: the absolute filing links found in its table rows, in page order,
    /// listed in the file at `path`. Never empty; the first link is held apart.
    Links {
        path: PathBuf,
        first: String,
        rest: Vec<String>,
    },
}

impl LocatedDocument {
    pub fn path(&self) -> &Path {
        match self {
            LocatedDocument::Record { path, .. } | LocatedDocument::Links { path, .. } => path,
        }
    }

    /// The document the pipeline goes on to download.
    pub fn first_url(&self) -> &str {
        match self {
            LocatedDocument::Record { entry, .. } => &entry.link,
            LocatedDocument::Links { first, .. } => first,
        }
    }

    /// Located links that the pipeline does not download.
    pub fn remaining(&self) -> &[String] {
        match self {
            LocatedDocument::Record { .. } => &[],
            LocatedDocument::Links { rest, .. } => rest,
        }
    }
}

/// Fetch `link` and work out which document it refers to, saving what was found.
pub async fn locate(
    client: &Client,
    config: &Config,
    namer: &FileNamer,
    link: &str,
) -> Result<LocatedDocument> {
    debug!("locating document at {link}");
    let fetched = client.fetch(link).await?;

    if fetched.status != StatusCode::OK {
        error!("document not found at {link}, status code {}", fetched.status);
        return Err(SpiderError::Download {
            url: link.to_string(),
            status: fetched.status,
        });
    }

    let body = fetched.text();
    match fetched.kind() {
        ResponseKind::XmlFeed => record_first_entry(config, namer, link, &body).await,
        ResponseKind::HtmlIndex => list_filings(config, namer, link, &body).await,
        ResponseKind::Other => {
            debug!(
                "unexpected content type [{}] at {link}; scanning as HTML",
                fetched.content_type
            );
            list_filings(config, namer, link, &body).await
        }
    }
}

async fn record_first_entry(
    config: &Config,
    namer: &FileNamer,
    link: &str,
    xml: &str,
) -> Result<LocatedDocument> {
    let Some(entry) = feed::parse(xml).into_iter().next() else {
        warn!("no entries found in the feed at {link}");
        return Err(SpiderError::EmptyFeed {
            url: link.to_string(),
        });
    };

    let contents = record(&entry);
    let name = format!(
        "{}_{}.xml",
        namer.key(contents.as_bytes()),
        file_safe(&entry.title)
    );
    let path = namer
        .save(&config.folder, &[name], contents.as_bytes())
        .await?;

    info!("feed entry saved successfully: {:?}", path);
    Ok(LocatedDocument::Record { path, entry })
}

async fn list_filings(
    config: &Config,
    namer: &FileNamer,
    link: &str,
    html: &str,
) -> Result<LocatedDocument> {
    let mut links = scan_index(html, &config.domain_root).into_iter();
    let Some(first) = links.next() else {
        warn!("no filings found in the HTML page at {link}");
        return Err(SpiderError::NoFilingsFound {
            url: link.to_string(),
        });
    };
    let rest: Vec<String> = links.collect();

    let contents: String = std::iter::once(&first)
        .chain(rest.iter())
        .map(|link| format!("{link}\n"))
        .collect();
    let name = format!("{}_filings.html", namer.key(contents.as_bytes()));
    let path = namer
        .save(&config.folder, &[name], contents.as_bytes())
        .await?;

    info!("{} filings saved successfully: {:?}", rest.len() + 1, path);
    Ok(LocatedDocument::Links { path, first, rest })
}

/// The four-line text record written for a feed entry.
pub fn record(entry: &FeedEntry) -> String {
    format!(
        "Title: {}\nLink: {}\nPublished: {}\nSummary: {}\n",
        entry.title, entry.link, entry.published, entry.summary
    )
}

/// Absolute filing links from the table rows of an EDGAR filing index page.
///
/// A row counts when its text mentions a filing type; its first anchor is taken. Inline
/// viewer paths (`/ix?doc=...`) are rewritten to the browsable viewer.
pub fn scan_index(html: &str, domain_root: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let rows = Selector::parse("tr").expect("valid row selector");
    let anchors = Selector::parse("a").expect("valid anchor selector");

    let mut links = Vec::new();
    for row in document.select(&rows) {
        let text: String = row.text().collect();
        if !FILING_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
            continue;
        }

        match row.select(&anchors).next() {
            Some(anchor) => match anchor.value().attr("href") {
                Some(href) => {
                    let link = format!("{domain_root}{href}").replace("ix?", "ixviewer/ix.html?");
                    trace!("filing link found: {link}");
                    links.push(link);
                }
                None => debug!("filing row has an anchor without href: {}", text.trim()),
            },
            None => trace!("filing row without a link: {}", text.trim()),
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<html><body>
<table class="tableFile" summary="Document Format Files">
  <tr><th>Seq</th><th>Description</th><th>Document</th><th>Type</th><th>Size</th></tr>
  <tr>
    <td>1</td><td>10-K</td>
    <td><a href="/ix?doc=/Archives/edgar/data/1/x.htm">x.htm</a> iXBRL</td>
    <td>10-K</td><td>1000</td>
  </tr>
  <tr>
    <td>2</td><td>EXHIBIT 21</td>
    <td><a href="/Archives/edgar/data/1/ex21.htm">ex21.htm</a></td>
    <td>EX-21</td><td>10</td>
  </tr>
  <tr>
    <td>3</td><td>Complete submission text file</td>
    <td><a href="/Archives/edgar/data/1/full.txt">full.txt</a></td>
    <td>8-K</td><td>2000</td>
  </tr>
  <tr><td>4</td><td>10-Q</td><td>no link here</td></tr>
</table>
</body></html>"#;

    #[test]
    fn scans_rows_mentioning_filing_types() {
        let links = scan_index(INDEX, "https://www.sec.gov");
        assert_eq!(
            links,
            vec![
                "https://www.sec.gov/ixviewer/ix.html?doc=/Archives/edgar/data/1/x.htm",
                "https://www.sec.gov/Archives/edgar/data/1/full.txt",
            ]
        );
    }

    #[test]
    fn page_without_filing_rows_has_no_links() {
        let html = "<table><tr><td>S-1</td><td><a href='/a.htm'>a</a></td></tr></table>";
        assert!(scan_index(html, "https://www.sec.gov").is_empty());
        assert!(scan_index("<p>10-K</p>", "https://www.sec.gov").is_empty());
    }

    #[test]
    fn record_has_four_labelled_lines() {
        let entry = FeedEntry {
            title: "10-K - ACME".to_string(),
            link: "https://www.sec.gov/a".to_string(),
            published: "2024-10-17".to_string(),
            summary: "Annual".to_string(),
        };
        assert_eq!(
            record(&entry),
            "Title: 10-K - ACME\nLink: https://www.sec.gov/a\nPublished: 2024-10-17\nSummary: Annual\n"
        );
    }

    #[test]
    fn located_links_keep_order() {
        let located = LocatedDocument::Links {
            path: PathBuf::from("f"),
            first: "a".to_string(),
            rest: vec!["b".to_string(), "c".to_string()],
        };
        assert_eq!(located.first_url(), "a");
        assert_eq!(located.remaining(), ["b", "c"]);
    }
}
