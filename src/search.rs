use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::fetch::{FetchOutcome, PageSource};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Result of the best-effort LinkedIn lookup. Unavailable covers every
/// failure mode: missing prerequisite fields, the search host throttling
/// us, transport errors, no match in the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    Unavailable,
}

/// Try to find a LinkedIn profile for the scraped name and location by
/// querying a public search endpoint. Both fields are required to build a
/// query narrow enough to be useful.
pub fn linkedin_url(
    source: &dyn PageSource,
    full_name: Option<&str>,
    location: Option<&str>,
) -> Lookup {
    let (Some(name), Some(location)) = (full_name, location) else {
        return Lookup::Unavailable;
    };
    // City part only; full "City, Country" strings over-constrain the query.
    let region = location.split(", ").next().unwrap_or(location);
    let query = format!(r#""{name}" "{region}" site:linkedin.com/in"#);
    let url = format!("{SEARCH_ENDPOINT}?q={}", percent_encode(&query));

    match source.fetch(&url) {
        Ok(FetchOutcome::Page(body)) => first_linkedin_link(&body),
        Ok(FetchOutcome::RateLimited { retry_after }) => {
            warn!(?retry_after, "search host throttled the lookup, skipping");
            Lookup::Unavailable
        }
        Err(e) => {
            warn!(error = %e, "linkedin lookup failed, skipping");
            Lookup::Unavailable
        }
    }
}

/// First linkedin.com/in link in the result markup. Result hrefs are often
/// wrapped in a redirect with a percent-encoded target, so both encoded and
/// plain forms are matched.
fn first_linkedin_link(body: &str) -> Lookup {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINK_RE.get_or_init(|| {
        Regex::new(r"https?(?:%3A%2F%2F|://)(?:www\.)?linkedin\.com(?:%2F|/)in(?:%2F|/)[A-Za-z0-9_%.-]+")
            .unwrap()
    });
    match re.find(body) {
        Some(m) => Lookup::Found(decode_component(m.as_str())),
        None => Lookup::Unavailable,
    }
}

fn decode_component(s: &str) -> String {
    s.replace("%3A", ":").replace("%2F", "/")
}

/// Minimal application/x-www-form-urlencoded encoding for the query string.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b' ' => out.push('+'),
            b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            b if b.is_ascii_alphanumeric() => out.push(b as char),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubSource;

    #[test]
    fn encodes_query() {
        assert_eq!(
            percent_encode(r#""Jane Doe" site:linkedin.com/in"#),
            "%22Jane+Doe%22+site%3Alinkedin.com%2Fin"
        );
    }

    #[test]
    fn finds_redirect_wrapped_link() {
        let body = r#"<a class="result__a"
            href="/l/?uddg=https%3A%2F%2Fwww.linkedin.com%2Fin%2Fjane-doe-123">Jane Doe</a>"#;
        assert_eq!(
            first_linkedin_link(body),
            Lookup::Found("https://www.linkedin.com/in/jane-doe-123".to_string())
        );
    }

    #[test]
    fn finds_plain_link() {
        let body = r#"<a href="https://linkedin.com/in/jdoe">profile</a>"#;
        assert_eq!(
            first_linkedin_link(body),
            Lookup::Found("https://linkedin.com/in/jdoe".to_string())
        );
    }

    #[test]
    fn no_match_is_unavailable() {
        assert_eq!(first_linkedin_link("<html></html>"), Lookup::Unavailable);
    }

    #[test]
    fn missing_fields_skip_the_request() {
        // Empty stub: any fetch would come back as an error.
        let source = StubSource::default();
        assert_eq!(
            linkedin_url(&source, Some("Jane Doe"), None),
            Lookup::Unavailable
        );
        assert_eq!(linkedin_url(&source, None, None), Lookup::Unavailable);
    }

    #[test]
    fn throttled_search_host_is_unavailable() {
        let query = percent_encode(r#""Jane Doe" "Oslo" site:linkedin.com/in"#);
        let url = format!("{SEARCH_ENDPOINT}?q={query}");
        let source = StubSource::default()
            .with_outcome(&url, FetchOutcome::RateLimited { retry_after: None });
        assert_eq!(
            linkedin_url(&source, Some("Jane Doe"), Some("Oslo, Norway")),
            Lookup::Unavailable
        );
    }
}
