// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Nested JSON extraction by key segments and typed conversion for serde_json::Value
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (optional, defaulted, or required extraction)
// invariants:
// - Paths are key segments, not dotted strings; work item field names contain dots ("System.State")
// - Missing paths yield None; `require` turns them into InsightsError::Response naming the path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

use crate::error::{InsightsError, Result};

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
  path: String,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`. JSON `null` counts as absent.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self
      .inner
      .filter(|v| !v.is_null())
      .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Deserialize as `T`, returning `T::default()` on failure.
  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Deserialize as `T` or fail with a response-shape error naming the path.
  pub fn require<T>(&self, context: &str) -> Result<T>
  where
    T: DeserializeOwned,
  {
    self
      .to::<T>()
      .ok_or_else(|| InsightsError::response(context, self.path.clone()))
  }

  /// Borrow the raw value when present.
  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner
  }

  pub fn exists(&self) -> bool {
    self.inner.is_some()
  }
}

/// Extension to fetch nested values by key segments, e.g. `&["author", "displayName"]`.
pub trait JsonFetch {
  fn fetch(&self, path: &[&str]) -> JsonFetched<'_>;

  /// Borrow an array at `path`, or fail naming the path.
  fn require_array(&self, path: &[&str], context: &str) -> Result<&[serde_json::Value]>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &[&str]) -> JsonFetched<'_> {
    let joined = path.join(".");
    let mut cur = self;

    for key in path {
      match cur.get(key) {
        Some(next) => cur = next,
        None => {
          return JsonFetched {
            inner: None,
            path: joined,
          }
        }
      }
    }

    JsonFetched {
      inner: Some(cur),
      path: joined,
    }
  }

  fn require_array(&self, path: &[&str], context: &str) -> Result<&[serde_json::Value]> {
    self
      .fetch(path)
      .value()
      .and_then(|v| v.as_array())
      .map(|a| a.as_slice())
      .ok_or_else(|| InsightsError::response(context, path.join(".")))
  }
}
