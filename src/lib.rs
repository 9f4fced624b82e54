// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Library surface for collecting and aggregating contributor activity
// role: crate/root
// outputs: Public modules consumed by the binary and integration tests
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod aggregate;
pub mod cli;
pub mod clients;
pub mod error;
pub mod ext;
pub mod identity;
pub mod manager;
pub mod render;
pub mod schema;
pub mod secrets;
pub mod util;

pub use error::{InsightsError, Result};
