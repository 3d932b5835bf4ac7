use crate::error::{Result, SpiderError};
use crate::feed::FeedEntry;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// The filing forms this scraper recognises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilingType {
    EightK,
    TenK,
    TenQ,
}

impl FilingType {
    pub const ALL: [FilingType; 3] = [FilingType::EightK, FilingType::TenK, FilingType::TenQ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingType::EightK => "8-K",
            FilingType::TenK => "10-K",
            FilingType::TenQ => "10-Q",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact match only: `10-k` or `10-K/A` are not recognised.
impl FromStr for FilingType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FilingType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unrecognised filing type `{s}`, expected one of 8-K, 10-K, 10-Q"))
    }
}

/// The set of filing types a caller asks for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestedTypes(BTreeSet<FilingType>);

impl RequestedTypes {
    pub fn all() -> Self {
        Self(FilingType::ALL.into_iter().collect())
    }

    pub fn contains(&self, ty: FilingType) -> bool {
        self.0.contains(&ty)
    }
}

impl FromIterator<FilingType> for RequestedTypes {
    fn from_iter<I: IntoIterator<Item = FilingType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RequestedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<&str> = self.0.iter().map(FilingType::as_str).collect();
        write!(f, "{{{}}}", types.join(", "))
    }
}

/// The filing type an entry announces: the title up to the first `" - "`, trimmed.
///
/// ```rust
/// use edgar_spider::filing::{filing_type_of, FilingType};
///
/// assert_eq!(filing_type_of("10-K - EXAMPLE CORP (0000000001) (Filer)"), Some(FilingType::TenK));
/// assert_eq!(filing_type_of("4 - SOMEONE (0000000002) (Reporting)"), None);
/// ```
pub fn filing_type_of(title: &str) -> Option<FilingType> {
    let prefix = title.split(" - ").next().unwrap_or_default().trim();
    prefix.parse().ok()
}

/// Link of the first entry, in feed order, whose filing type is requested.
pub fn match_filing<'a>(entries: &'a [FeedEntry], requested: &RequestedTypes) -> Result<&'a str> {
    info!("scraping {requested} filings ...");

    let found = entries.iter().find(|entry| {
        filing_type_of(&entry.title).is_some_and(|ty| requested.contains(ty))
    });

    match found {
        Some(entry) => {
            info!("found filing: {}", entry.title);
            info!("document link: {}", entry.link);
            Ok(&entry.link)
        }
        None => {
            warn!("no matching filings found among {} entries", entries.len());
            Err(SpiderError::NoMatch {
                requested: requested.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, link: &str) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: link.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn filing_type_is_the_title_prefix() {
        assert_eq!(filing_type_of("8-K - ACME"), Some(FilingType::EightK));
        assert_eq!(filing_type_of("  10-Q   - ACME - Subsidiary"), Some(FilingType::TenQ));
        assert_eq!(filing_type_of("10-Q"), Some(FilingType::TenQ));
        assert_eq!(filing_type_of("10-K/A - ACME"), None);
        assert_eq!(filing_type_of("10-k - ACME"), None);
        assert_eq!(filing_type_of("ACME 10-K"), None);
        assert_eq!(filing_type_of(""), None);
    }

    #[test]
    fn first_requested_entry_wins() {
        let entries = vec![
            entry("4 - INSIDER", "a"),
            entry("10-Q - FIRST", "b"),
            entry("8-K - SECOND", "c"),
            entry("10-Q - THIRD", "d"),
        ];

        let all = RequestedTypes::all();
        assert_eq!(match_filing(&entries, &all).unwrap(), "b");

        let eight_k: RequestedTypes = [FilingType::EightK].into_iter().collect();
        assert_eq!(match_filing(&entries, &eight_k).unwrap(), "c");
    }

    #[test]
    fn no_requested_entry_is_no_match() {
        let entries = vec![entry("8-K - ACME", "a"), entry("S-1 - WIDGET", "b")];
        let ten_k: RequestedTypes = [FilingType::TenK].into_iter().collect();
        assert!(matches!(
            match_filing(&entries, &ten_k),
            Err(SpiderError::NoMatch { .. })
        ));

        assert!(matches!(
            match_filing(&[], &RequestedTypes::all()),
            Err(SpiderError::NoMatch { .. })
        ));
        assert!(matches!(
            match_filing(&entries, &RequestedTypes::default()),
            Err(SpiderError::NoMatch { .. })
        ));
    }

    #[test]
    fn requested_types_display() {
        let types: RequestedTypes = [FilingType::TenQ, FilingType::EightK].into_iter().collect();
        assert_eq!(types.to_string(), "{8-K, 10-Q}");
    }
}
