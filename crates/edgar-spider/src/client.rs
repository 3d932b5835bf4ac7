use crate::config::Config;
use crate::error::{Result, SpiderError};
use crate::http::*;
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, CONNECTION, CONTENT_TYPE, HOST, USER_AGENT,
};
use reqwest::{ClientBuilder, StatusCode};
use tracing::{debug, error, trace};

/// The shape of a fetched body, decided once from its `Content-Type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    XmlFeed,
    HtmlIndex,
    Other,
}

/// Raw response metadata and body; status codes are left for the caller to interpret.
#[derive(Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Fetched {
    pub fn kind(&self) -> ResponseKind {
        let content_type = self.content_type.to_ascii_lowercase();
        if ["application/xml", "text/xml", "application/atom+xml", "application/rss+xml"]
            .iter()
            .any(|xml| content_type.contains(xml))
        {
            ResponseKind::XmlFeed
        } else if content_type.contains("text/html") {
            ResponseKind::HtmlIndex
        } else {
            ResponseKind::Other
        }
    }

    /// The body decoded with the `charset` of its `Content-Type`, else the encoding its XML
    /// declaration names, else UTF-8. A byte-order mark overrides both.
    pub fn text(&self) -> String {
        let encoding = self
            .charset()
            .or_else(|| declared_encoding(&self.body))
            .unwrap_or(UTF_8);
        let (text, used, malformed) = encoding.decode(&self.body);
        if malformed {
            debug!("body is not valid {}; bad bytes replaced", used.name());
        }
        text.into_owned()
    }

    fn charset(&self) -> Option<&'static Encoding> {
        self.content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("charset") {
                return None;
            }
            Encoding::for_label(value.trim().trim_matches('"').as_bytes())
        })
    }
}

// `<?xml version="1.0" encoding="ISO-8859-1"?>`
fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    match Reader::from_reader(body).read_event() {
        Ok(Event::Decl(decl)) => {
            let label = decl.encoding()?.ok()?;
            Encoding::for_label(&label)
        }
        _ => None,
    }
}

/// HTTP client that identifies itself the way EDGAR asks crawlers to.
///
/// The SEC blocks anonymous traffic, so every request carries the configured `User-Agent`
/// (with a contact address), an explicit `Host`, and XML `Accept` headers. `Accept-Encoding`
/// is negotiated by reqwest itself (`gzip, deflate`), which also decompresses the body.
#[derive(Clone, Debug)]
pub struct Client {
    inner: HttpClient,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|err| SpiderError::Config(format!("header value `{value}`, error({err})")))
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header(&config.user_agent)?);
        headers.insert(HOST, header(&config.host)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml, text/xml"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let inner = ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|err| {
                error!("failed to build reqwest client, error({err})");
                SpiderError::Config(format!("http client, error({err})"))
            })?;

        Ok(Self { inner })
    }

    /// GET `url`. No retries; transport failures surface as [`SpiderError::Network`].
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        trace!("GET {url}");
        let response = self.inner.get(url).send().await.map_err(|err| {
            error!("failed to fetch {url}, error({err})");
            err
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|err| {
                error!("failed to read body of {url}, error({err})");
                err
            })?
            .to_vec();

        debug!(
            "{url} -> {status} [{content_type}] {len} bytes",
            len = body.len()
        );

        Ok(Fetched {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(content_type: &str) -> Fetched {
        with_body(content_type, vec![])
    }

    fn with_body(content_type: &str, body: Vec<u8>) -> Fetched {
        Fetched {
            status: StatusCode::OK,
            content_type: content_type.to_string(),
            body,
        }
    }

    #[test]
    fn kind_from_content_type() {
        assert_eq!(fetched("application/xml").kind(), ResponseKind::XmlFeed);
        assert_eq!(fetched("text/xml; charset=utf-8").kind(), ResponseKind::XmlFeed);
        assert_eq!(fetched("application/atom+xml").kind(), ResponseKind::XmlFeed);
        assert_eq!(fetched("text/html; charset=UTF-8").kind(), ResponseKind::HtmlIndex);
        assert_eq!(fetched("application/json").kind(), ResponseKind::Other);
        assert_eq!(fetched("").kind(), ResponseKind::Other);
    }

    #[test]
    fn latin1_feed_is_decoded_by_its_declaration() {
        let mut body = br#"<?xml version="1.0" encoding="ISO-8859-1" ?><title>8-K - SOCI"#.to_vec();
        body.push(0xC9);
        body.extend_from_slice(b"TE</title>");

        let text = with_body("application/atom+xml", body).text();
        assert!(text.ends_with("<title>8-K - SOCI\u{C9}TE</title>"), "{text}");
    }

    #[test]
    fn content_type_charset_wins_over_the_declaration() {
        let body = r#"<?xml version="1.0" encoding="ISO-8859-1"?><t>é</t>"#.as_bytes().to_vec();
        assert_eq!(
            with_body("text/xml; charset=\"UTF-8\"", body.clone()).text(),
            r#"<?xml version="1.0" encoding="ISO-8859-1"?><t>é</t>"#
        );
        assert!(with_body("text/xml", body).text().ends_with("<t>\u{C3}\u{A9}</t>"));
    }

    #[test]
    fn undeclared_body_is_utf8() {
        let body = "<html><p>Société</p></html>".as_bytes().to_vec();
        assert_eq!(with_body("text/html", body).text(), "<html><p>Société</p></html>");
        assert_eq!(with_body("", vec![0xFF]).text(), "\u{FFFD}");
    }

    #[test]
    fn bad_user_agent_is_a_config_error() {
        let mut config = Config::new(".");
        config.user_agent = "bad\nagent".to_string();
        assert!(matches!(Client::new(&config), Err(SpiderError::Config(_))));
    }
}
