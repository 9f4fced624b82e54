// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Authenticated JSON GET/POST against the work-tracking REST API with retry/backoff
// role: clients/http-api
// inputs: Resource path (organization-prefixed), query pairs, optional JSON body; personal access token
// outputs: Parsed serde_json::Value bodies
// side_effects: Blocking network calls via ureq; sleeps between retries
// invariants:
// - `api-version` is injected into the query when the caller did not set one
// - Basic auth with an empty username and the token as password
// - Statuses 429/500/502/503/504 and transport failures are retried up to the budget with exponential backoff
// - Any other non-2xx status fails immediately
// errors: InsightsError::Transport after retries are exhausted or on a non-retryable status
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use base64::Engine;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::error::{InsightsError, Result};

pub const CORE_HOST: &str = "dev.azure.com";
pub const CORE_VERSION: &str = "6.0";
pub const GRAPH_HOST: &str = "vssps.dev.azure.com";
pub const GRAPH_VERSION: &str = "5.1-preview.1";

const API_VERSION_KEY: &str = "api-version";
const USER_AGENT: &str = "git-insights";

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
  pairs: Vec<(String, String)>,
}

impl Query {
  pub fn new() -> Self {
    Self::default()
  }

  /// Set `key`, replacing an existing value in place.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    let key = key.into();
    let value = value.into();

    match self.pairs.iter_mut().find(|(k, _)| *k == key) {
      Some(slot) => slot.1 = value,
      None => self.pairs.push((key, value)),
    }

    self
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  /// Add `api-version` unless the caller pinned one.
  pub fn with_api_version(self, version: &str) -> Self {
    if self.get(API_VERSION_KEY).is_some() {
      self
    } else {
      self.with(API_VERSION_KEY, version)
    }
  }

  /// `k=v&k=v` rendering for logs and error messages.
  pub fn describe(&self) -> String {
    self
      .pairs
      .iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect::<Vec<_>>()
      .join("&")
  }
}

/// API host plus the default `api-version` for calls against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
  pub scheme: String,
  pub host: String,
  pub version: String,
}

impl Endpoint {
  pub fn new(host: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      scheme: "https".to_string(),
      host: host.into(),
      version: version.into(),
    }
  }

  /// Plain-HTTP variant, for local stand-ins of the service.
  pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
    self.scheme = scheme.into();
    self
  }

  /// Git, pull request and work item APIs.
  pub fn core() -> Self {
    Self::new(CORE_HOST, CORE_VERSION)
  }

  /// Organization graph (entitlements) API.
  pub fn graph() -> Self {
    Self::new(GRAPH_HOST, GRAPH_VERSION)
  }

  pub fn url(&self, resource_path: &str) -> String {
    format!("{}://{}/{}", self.scheme, self.host, resource_path.trim_start_matches('/'))
  }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
  pub max_retries: u32,
  /// First retry waits this long; each later retry doubles it.
  pub backoff_factor: Duration,
  pub max_delay: Duration,
  pub retry_statuses: Vec<u16>,
  pub timeout: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 3,
      backoff_factor: Duration::from_secs(1),
      max_delay: Duration::from_secs(30),
      retry_statuses: vec![429, 500, 502, 503, 504],
      timeout: Duration::from_secs(5),
    }
  }
}

impl RetryPolicy {
  pub fn is_retryable_status(&self, status: u16) -> bool {
    self.retry_statuses.contains(&status)
  }

  /// Sleep schedule, one entry per allowed retry: factor, 2*factor, 4*factor, ...
  pub fn delays(&self) -> impl Iterator<Item = Duration> {
    // base 2 yields 2, 4, 8 ms before scaling, so halve the factor.
    let half_factor = (self.backoff_factor.as_millis() / 2) as u64;

    ExponentialBackoff::from_millis(2)
      .factor(half_factor)
      .max_delay(self.max_delay)
      .take(self.max_retries as usize)
  }
}

// --- Trait seam for the REST API ---
pub trait AdoApi {
  fn get_json(&self, resource_path: &str, query: &Query) -> Result<serde_json::Value>;
  fn post_json(&self, resource_path: &str, body: &serde_json::Value, query: &Query) -> Result<serde_json::Value>;
}

impl<T: AdoApi + ?Sized> AdoApi for &T {
  fn get_json(&self, resource_path: &str, query: &Query) -> Result<serde_json::Value> {
    (**self).get_json(resource_path, query)
  }

  fn post_json(&self, resource_path: &str, body: &serde_json::Value, query: &Query) -> Result<serde_json::Value> {
    (**self).post_json(resource_path, body, query)
  }
}

/// `Authorization` header value for a personal access token.
pub fn basic_auth_header(token: &str) -> String {
  let encoded = base64::engine::general_purpose::STANDARD.encode(format!(":{}", token));
  format!("Basic {}", encoded)
}

#[derive(Debug, Clone, Copy)]
enum Method<'b> {
  Get,
  Post(&'b serde_json::Value),
}

impl Method<'_> {
  fn as_str(&self) -> &'static str {
    match self {
      Method::Get => "GET",
      Method::Post(_) => "POST",
    }
  }
}

/// ureq-backed implementation of [`AdoApi`].
pub struct AdoHttpApi {
  agent: ureq::Agent,
  endpoint: Endpoint,
  authorization: String,
  retry: RetryPolicy,
}

impl AdoHttpApi {
  pub fn new(endpoint: Endpoint, token: &str) -> Self {
    Self::with_retry(endpoint, token, RetryPolicy::default())
  }

  pub fn with_retry(endpoint: Endpoint, token: &str, retry: RetryPolicy) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .timeout_global(Some(retry.timeout))
      .http_status_as_error(false)
      .build()
      .into();

    Self {
      agent,
      endpoint,
      authorization: basic_auth_header(token),
      retry,
    }
  }

  fn dispatch(
    &self,
    method: Method<'_>,
    url: &str,
    query: &Query,
  ) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match method {
      Method::Post(body) => {
        let mut req = self
          .agent
          .post(url)
          .header("Accept", "application/json")
          .header("User-Agent", USER_AGENT)
          .header("Authorization", &self.authorization);

        for (k, v) in query.iter() {
          req = req.query(k, v);
        }

        req.send_json(body)
      }
      Method::Get => {
        let mut req = self
          .agent
          .get(url)
          .header("Accept", "application/json")
          .header("User-Agent", USER_AGENT)
          .header("Authorization", &self.authorization);

        for (k, v) in query.iter() {
          req = req.query(k, v);
        }

        req.call()
      }
    }
  }

  fn send(&self, method: Method<'_>, resource_path: &str, query: &Query) -> Result<serde_json::Value> {
    let url = self.endpoint.url(resource_path);
    let query = query.clone().with_api_version(&self.endpoint.version);
    let transport_error = |detail: String| InsightsError::Transport {
      method: method.as_str().to_string(),
      url: format!("{}?{}", url, query.describe()),
      detail,
    };

    let mut delays = self.retry.delays();
    let mut retries = 0u32;

    loop {
      let failure = match self.dispatch(method, &url, &query) {
        Ok(mut resp) => {
          let status = resp.status().as_u16();

          if resp.status().is_success() {
            debug!(method = method.as_str(), %url, status, "api call succeeded");
            return resp
              .body_mut()
              .read_json::<serde_json::Value>()
              .map_err(|e| transport_error(format!("invalid JSON body: {}", e)));
          }

          if !self.retry.is_retryable_status(status) {
            return Err(transport_error(format!("HTTP status {}", status)));
          }

          format!("HTTP status {}", status)
        }
        Err(e) => e.to_string(),
      };

      let Some(delay) = delays.next() else {
        return Err(transport_error(format!("{} (after {} retries)", failure, retries)));
      };

      retries += 1;
      warn!(method = method.as_str(), %url, retry = retries, ?delay, "{}; retrying", failure);
      std::thread::sleep(delay);
    }
  }
}

impl AdoApi for AdoHttpApi {
  fn get_json(&self, resource_path: &str, query: &Query) -> Result<serde_json::Value> {
    self.send(Method::Get, resource_path, query)
  }

  fn post_json(&self, resource_path: &str, body: &serde_json::Value, query: &Query) -> Result<serde_json::Value> {
    self.send(Method::Post(body), resource_path, query)
  }
}
