// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Error taxonomy shared by clients, manager, aggregation and output
// role: errors/taxonomy
// outputs: InsightsError and the crate Result alias
// invariants:
// - Config errors are raised before (or instead of) any network call and are never retried
// - Transport errors only surface after the HTTP retry budget is exhausted
// - Response errors name the JSON path that was missing or mistyped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightsError {
  /// Missing parameters, empty repo list, missing token, batch size exceeded, schema mismatch.
  #[error("configuration error: {0}")]
  Config(String),

  #[error("{method} {url} failed: {detail}")]
  Transport { method: String, url: String, detail: String },

  /// A required key was absent (or of the wrong type) in an API payload.
  #[error("unexpected response shape in {context}: missing or invalid `{path}`")]
  Response { context: String, path: String },

  #[error("unable to resolve secret `{name}`: {detail}")]
  Secret { name: String, detail: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl InsightsError {
  pub fn config(msg: impl Into<String>) -> Self {
    InsightsError::Config(msg.into())
  }

  pub fn response(context: impl Into<String>, path: impl Into<String>) -> Self {
    InsightsError::Response {
      context: context.into(),
      path: path.into(),
    }
  }

  pub fn is_config(&self) -> bool {
    matches!(self, InsightsError::Config(_))
  }
}

pub type Result<T, E = InsightsError> = std::result::Result<T, E>;
