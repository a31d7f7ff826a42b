use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::settings::Settings;

/// Result of fetching one page. Rate limiting is a first-class outcome,
/// not an error: callers must branch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Page(String),
    RateLimited { retry_after: Option<u64> },
}

/// Where pages come from. The binary uses HTTP; tests use canned bodies.
pub trait PageSource: Sync {
    fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(settings: &Settings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(HttpSource { client })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text()?;
        classify(status, retry_after.as_deref(), body, url)
    }
}

/// Map a raw response to an outcome. 429 surfaces as RateLimited with the
/// Retry-After seconds when the header parses; other non-2xx are transient
/// failures.
pub fn classify(
    status: u16,
    retry_after: Option<&str>,
    body: String,
    url: &str,
) -> Result<FetchOutcome, FetchError> {
    match status {
        429 => Ok(FetchOutcome::RateLimited {
            retry_after: retry_after.and_then(|v| v.trim().parse().ok()),
        }),
        200..=299 => Ok(FetchOutcome::Page(body)),
        _ => Err(FetchError::Status {
            status,
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
pub mod stub {
    use std::collections::HashMap;

    use super::{FetchOutcome, PageSource};
    use crate::error::FetchError;

    /// Canned responses keyed by URL; unknown URLs come back as status 404.
    #[derive(Default)]
    pub struct StubSource {
        responses: HashMap<String, FetchOutcome>,
    }

    impl StubSource {
        pub fn with_page(mut self, url: &str, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), FetchOutcome::Page(body.to_string()));
            self
        }

        pub fn with_outcome(mut self, url: &str, outcome: FetchOutcome) -> Self {
            self.responses.insert(url.to_string(), outcome);
            self
        }
    }

    impl PageSource for StubSource {
        fn fetch(&self, url: &str) -> Result<FetchOutcome, FetchError> {
            match self.responses.get(url) {
                Some(outcome) => Ok(outcome.clone()),
                None => Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited_with_retry_after() {
        let outcome = classify(429, Some("30"), String::new(), "http://x/").unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::RateLimited {
                retry_after: Some(30)
            }
        );
    }

    #[test]
    fn status_429_without_header() {
        let outcome = classify(429, None, String::new(), "http://x/").unwrap();
        assert_eq!(outcome, FetchOutcome::RateLimited { retry_after: None });
    }

    #[test]
    fn unparsable_retry_after_is_dropped() {
        let outcome = classify(429, Some("soon"), String::new(), "http://x/").unwrap();
        assert_eq!(outcome, FetchOutcome::RateLimited { retry_after: None });
    }

    #[test]
    fn success_carries_body() {
        let outcome = classify(200, None, "<html/>".to_string(), "http://x/").unwrap();
        assert_eq!(outcome, FetchOutcome::Page("<html/>".to_string()));
    }

    #[test]
    fn other_statuses_are_transient_failures() {
        let err = classify(503, None, String::new(), "http://x/").unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status, 503),
            other => panic!("unexpected error: {other}"),
        }
    }
}
