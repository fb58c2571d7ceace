//! Page fetcher - blocking HTTP with browser-like headers.
//!
//! Listing and detail pages go through the [`PageFetcher`] trait so the
//! extractor and walker can be exercised against canned responses in tests.
//! Non-2xx statuses are returned as data; only transport failures
//! (timeout, DNS, connection reset) surface as errors.

use std::error::Error;
use std::time::Duration;

use crate::rate_limiter::RateLimiter;

/// AOTY serves an error page to clients without a browser user-agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub trait PageFetcher {
    fn fetch(&mut self, url: &str) -> Result<PageResponse, Box<dyn Error>>;
}

/// Real fetcher: one ureq agent, fixed timeout, paced requests.
pub struct HttpFetcher {
    agent: ureq::Agent,
    limiter: RateLimiter,
}

impl HttpFetcher {
    /// `pace_millis` is the minimum gap between successive page requests.
    pub fn new(pace_millis: u64) -> Self {
        HttpFetcher {
            agent: ureq::AgentBuilder::new().timeout(PAGE_TIMEOUT).build(),
            limiter: RateLimiter::from_millis("aoty", pace_millis),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&mut self, url: &str) -> Result<PageResponse, Box<dyn Error>> {
        self.limiter.wait_if_needed();

        match self.agent.get(url).set("User-Agent", USER_AGENT).call() {
            Ok(resp) => {
                let status = resp.status();
                Ok(PageResponse { status, body: resp.into_string()? })
            }
            // Non-2xx is a page-level signal for the walker, not a failure.
            Err(ureq::Error::Status(code, resp)) => Ok(PageResponse {
                status: code,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
