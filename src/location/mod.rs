//! Location handling for Tidewalk
//!
//! Locations are opaque identifiers supplied by the caller. Most of the time
//! they are URLs or paths relative to a site; this module decides which ones
//! the crawl accepts and how the host turns them into fetchable URLs.

mod matcher;

pub use matcher::matches_pattern;

use std::collections::HashSet;
use url::Url;

/// Filters raw locations down to the ones a crawl will visit
///
/// Blank entries and entries whose path does not match `pattern` are dropped
/// silently. Repeated identifiers keep only their first occurrence, since
/// attempt counts are tracked per identifier. The result is truncated to
/// `max_items` entries and keeps the input order.
///
/// For absolute URLs the pattern is matched against the URL path; any other
/// identifier is matched as written.
///
/// # Arguments
///
/// * `raw` - Locations as submitted, possibly untrimmed
/// * `pattern` - `*`/`?` wildcard pattern a location must match
/// * `max_items` - Upper bound on the returned list
///
/// # Returns
///
/// The accepted locations, trimmed, in submission order
///
/// # Example
///
/// ```
/// use tidewalk::location::filter_locations;
///
/// let accepted = filter_locations(["/a.html", "", "/b.txt", "/a.html"], "*.html", 10);
/// assert_eq!(accepted, vec!["/a.html"]);
/// ```
pub fn filter_locations<I, S>(raw: I, pattern: &str, max_items: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for entry in raw {
        if accepted.len() >= max_items {
            break;
        }

        let location = entry.as_ref().trim();
        if location.is_empty() {
            continue;
        }

        if !matches_pattern(pattern, &match_subject(location)) {
            tracing::debug!("Dropping location {} (does not match {})", location, pattern);
            continue;
        }

        if seen.insert(location.to_string()) {
            accepted.push(location.to_string());
        }
    }

    accepted
}

/// Resolves a location into an absolute URL
///
/// Absolute URLs are returned unchanged; anything else is joined onto `base`.
pub fn resolve_location(location: &str, base: Option<&Url>) -> Result<Url, url::ParseError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(location),
            None => Err(url::ParseError::RelativeUrlWithoutBase),
        },
        Err(e) => Err(e),
    }
}

fn match_subject(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => location.to_string(),
    }
}
