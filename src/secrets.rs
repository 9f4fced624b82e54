// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve the named secret holding the personal access token
// role: config/secret-source
// inputs: Secret name
// outputs: Token string
// invariants: Absent or blank secrets are InsightsError::Secret; resolution happens before any API call
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::error::{InsightsError, Result};

pub const DEFAULT_PAT_SECRET_NAME: &str = "ADO_PAT";

pub trait SecretSource {
  fn secret(&self, name: &str) -> Result<String>;
}

/// Secrets read from environment variables of the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

impl SecretSource for EnvSecretSource {
  fn secret(&self, name: &str) -> Result<String> {
    let value = std::env::var(name).map_err(|e| InsightsError::Secret {
      name: name.to_string(),
      detail: e.to_string(),
    })?;

    if value.trim().is_empty() {
      return Err(InsightsError::Secret {
        name: name.to_string(),
        detail: "value is blank".into(),
      });
    }

    Ok(value)
  }
}
