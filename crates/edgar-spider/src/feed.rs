use crate::client::Client;
use crate::error::{Result, SpiderError};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

/// One announcement from an RSS/Atom feed, in the order the feed lists it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub summary: String,
}

/// Fetch the feed at `url` and return its entries.
///
/// A 403 means EDGAR is blocking this identity; the body is not parsed.
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<FeedEntry>> {
    debug!("fetching feed {url}");
    let fetched = client.fetch(url).await?;

    if fetched.status == StatusCode::FORBIDDEN {
        error!("SEC is blocking the request to {url}; try a different IP or User-Agent");
        return Err(SpiderError::Blocked {
            url: url.to_string(),
        });
    }

    let entries = parse(&fetched.text());
    if entries.is_empty() {
        warn!("no entries found in the feed at {url}");
        return Err(SpiderError::EmptyFeed {
            url: url.to_string(),
        });
    }

    info!("{} entries found in the feed at {url}", entries.len());
    Ok(entries)
}

/// Parse an Atom or RSS 2.0 document.
///
/// Anything that is not a well-formed feed parses to no entries, in the manner of lenient feed
/// readers; the caller decides whether that is an error.
pub fn parse(xml: &str) -> Vec<FeedEntry> {
    let parsed = match root_element(xml).as_deref() {
        Some("feed") => quick_xml::de::from_str::<Atom>(xml).map(Atom::into_entries),
        Some("rss") => quick_xml::de::from_str::<Rss>(xml).map(Rss::into_entries),
        Some(other) => {
            warn!("unrecognised feed root element <{other}>");
            return vec![];
        }
        None => {
            warn!("feed body has no root element");
            return vec![];
        }
    };

    parsed.unwrap_or_else(|err| {
        warn!("failed to parse feed, error({err})");
        vec![]
    })
}

// local name of the first element in the document
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

// de
// ----------------------------------------------------------------------------
//
// Feeds may interleave repeated elements (`entry`, `item`, `link`) with others; the
// `overlapped-lists` feature of quick-xml collects them into one `Vec` regardless.

// Element text; attributes such as `type="html"` are ignored.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

fn text(field: Option<Text>) -> String {
    field.map(|t| t.value.trim().to_string()).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<Text>,
    updated: Option<Text>,
    summary: Option<Text>,
    content: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl Atom {
    fn into_entries(self) -> Vec<FeedEntry> {
        self.entries
            .into_iter()
            .map(|entry| {
                // EDGAR's current-events feed only carries <updated>
                let published = entry.published.or(entry.updated);
                let summary = entry.summary.or(entry.content);
                let link = entry
                    .links
                    .iter()
                    .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
                    .or_else(|| entry.links.first())
                    .map(|link| link.href.trim().to_string())
                    .unwrap_or_default();

                FeedEntry {
                    title: text(entry.title),
                    link,
                    published: text(published),
                    summary: text(summary),
                }
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<Text>,
    link: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<Text>,
    description: Option<Text>,
}

impl Rss {
    fn into_entries(self) -> Vec<FeedEntry> {
        self.channel
            .items
            .into_iter()
            .map(|item| FeedEntry {
                title: text(item.title),
                link: text(item.link),
                published: text(item.pub_date),
                summary: text(item.description),
            })
            .collect()
    }
}
