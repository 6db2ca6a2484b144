//! In-memory [`MockTransport`].

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dynapack_core::{AssetPlan, Descriptor, Error, LoaderConfig, Result, Transport};

/// Transport serving canned responses from memory.
///
/// Every fetch is logged. Lookups ignore the query string, so cache-busted
/// URLs hit the same response. A URL with no response is a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Option<Duration>,
    log: Mutex<Vec<String>>,
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn insert(&self, url: impl AsRef<str>, body: impl Into<Vec<u8>>) {
        self.responses
            .lock()
            .unwrap()
            .insert(strip_query(url.as_ref()).to_string(), body.into());
    }

    pub fn with_response(self, url: impl AsRef<str>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    /// Fail every fetch of `url`, even if a response is registered.
    pub fn with_failure(self, url: impl AsRef<str>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(strip_query(url.as_ref()).to_string());
        self
    }

    /// Delay fetches of `url` by `delay`.
    pub fn with_delay(self, url: impl AsRef<str>, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(strip_query(url.as_ref()).to_string(), delay);
        self
    }

    /// Delay every fetch without a URL-specific delay.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Serve a whole package: its descriptor plus every asset the descriptor
    /// plans, as `config` lays them out.
    ///
    /// # Panics
    /// Panics if `descriptor_json` does not parse.
    pub fn with_package(self, config: &LoaderConfig, id: &str, descriptor_json: &str) -> Self {
        let descriptor = Descriptor::from_json(id, descriptor_json.as_bytes())
            .unwrap_or_else(|e| panic!("invalid test descriptor for {id}: {e}"));
        self.insert(config.descriptor_url(id), descriptor_json);
        let plan = AssetPlan::new(config, id, &descriptor);
        for url in plan.urls() {
            self.insert(url, format!("/* {id}: {url} */"));
        }
        self
    }

    /// Every fetched URL, in fetch order, query strings included.
    pub fn fetch_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Number of fetches of `url`, ignoring query strings.
    pub fn fetch_count(&self, url: &str) -> usize {
        let url = strip_query(url);
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|fetched| strip_query(fetched) == url)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.log.lock().unwrap().push(url.to_string());
        let key = strip_query(url);

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.lock().unwrap().contains(key) {
            return Err(Error::transport(url, "injected failure"));
        }
        self.responses
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::transport(url, "404 Not Found"))
    }
}
