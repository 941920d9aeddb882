use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, SubwatchError};

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "it-IT,it;q=0.8,en-US;q=0.5,en;q=0.3";

/// Anything that can turn a URL into raw markup
pub trait PageSource {
    fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP page source with fixed browser-like headers
pub struct HttpFetcher {
    agent: ureq::Agent,
    headers: Vec<(&'static str, String)>,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, origin: &str, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            headers: request_headers(user_agent, origin),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.user_agent,
            &config.marketplace.origin,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }
}

impl PageSource for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String> {
        let mut request = self.agent.get(url);
        for (key, value) in &self.headers {
            request = request.header(*key, value.as_str());
        }

        // Non-2xx statuses surface as ureq::Error::StatusCode
        let response = request.call().map_err(|e| {
            warn!(url, "request failed: {}", e);
            SubwatchError::FetchError(format!("{}: {}", url, e))
        })?;

        let html = response.into_body().read_to_string()?;
        debug!(url, bytes = html.len(), "fetched page");
        Ok(html)
    }
}

/// Headers sent with every page request
pub fn request_headers(user_agent: &str, origin: &str) -> Vec<(&'static str, String)> {
    vec![
        ("User-Agent", user_agent.to_string()),
        ("Accept", ACCEPT.to_string()),
        ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
        ("Referer", format!("{}/", origin.trim_end_matches('/'))),
        ("Connection", "keep-alive".to_string()),
    ]
}
