// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resource clients that fetch one entity type each and normalize it into schema Records
// role: clients/namespace
// inputs: ClientContext (api, organization, schema) at construction; Params per call
// outputs: ResourceClient trait, Params bag, shared JSON helpers; public client submodules
// invariants:
// - Required params are checked before any URL is built or request issued
// - Clients hold no mutable state beyond per-run caches
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod api;
pub mod comments;
pub mod commits;
pub mod entitlements;
pub mod pull_requests;
pub mod work_items;

use chrono::{DateTime, FixedOffset};

use crate::error::{InsightsError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::identity::IdentityMap;
use crate::schema::{Record, Schema};
use crate::util::parse_timestamp;

use self::api::AdoApi;

/// Configuration shared by every client; fixed at construction.
#[derive(Clone, Copy)]
pub struct ClientContext<'a> {
  pub api: &'a dyn AdoApi,
  pub organization: &'a str,
  pub schema: &'a Schema,
}

/// Fetch one resource type and deserialize it into complete records.
pub trait ResourceClient {
  fn fetch(&self, params: &Params<'_>) -> Result<Vec<Record>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
  Project,
  Repo,
  PullRequestId,
  TeamId,
  Identities,
}

impl Param {
  pub fn name(&self) -> &'static str {
    match self {
      Param::Project => "project",
      Param::Repo => "repo",
      Param::PullRequestId => "pull_request_id",
      Param::TeamId => "team_id",
      Param::Identities => "identities",
    }
  }
}

/// Named call parameters. Blank strings count as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Params<'a> {
  project: Option<&'a str>,
  repo: Option<&'a str>,
  pull_request_id: Option<i64>,
  team_id: Option<&'a str>,
  identities: Option<&'a IdentityMap>,
}

impl<'a> Params<'a> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn project(mut self, project: &'a str) -> Self {
    self.project = Some(project);
    self
  }

  pub fn repo(mut self, repo: &'a str) -> Self {
    self.repo = Some(repo);
    self
  }

  pub fn pull_request_id(mut self, id: i64) -> Self {
    self.pull_request_id = Some(id);
    self
  }

  pub fn team_id(mut self, team_id: &'a str) -> Self {
    self.team_id = Some(team_id);
    self
  }

  pub fn identities(mut self, identities: &'a IdentityMap) -> Self {
    self.identities = Some(identities);
    self
  }

  fn present(&self, param: Param) -> bool {
    let non_blank = |s: Option<&str>| s.map(|v| !v.trim().is_empty()).unwrap_or(false);

    match param {
      Param::Project => non_blank(self.project),
      Param::Repo => non_blank(self.repo),
      Param::PullRequestId => self.pull_request_id.is_some(),
      Param::TeamId => non_blank(self.team_id),
      Param::Identities => self.identities.is_some(),
    }
  }

  /// Fail with a configuration error listing every missing parameter.
  pub fn require(&self, client: &str, required: &[Param]) -> Result<()> {
    let missing: Vec<&str> = required
      .iter()
      .filter(|p| !self.present(**p))
      .map(Param::name)
      .collect();

    if missing.is_empty() {
      Ok(())
    } else {
      Err(InsightsError::config(format!(
        "{} client is missing required arguments: {}",
        client,
        missing.join(", ")
      )))
    }
  }

  fn missing(param: Param) -> InsightsError {
    InsightsError::config(format!("missing required argument: {}", param.name()))
  }

  pub fn get_project(&self) -> Result<&'a str> {
    self.project.ok_or_else(|| Self::missing(Param::Project))
  }

  pub fn get_repo(&self) -> Result<&'a str> {
    self.repo.ok_or_else(|| Self::missing(Param::Repo))
  }

  pub fn get_pull_request_id(&self) -> Result<i64> {
    self.pull_request_id.ok_or_else(|| Self::missing(Param::PullRequestId))
  }

  pub fn get_team_id(&self) -> Result<&'a str> {
    self.team_id.ok_or_else(|| Self::missing(Param::TeamId))
  }

  pub fn get_identities(&self) -> Result<&'a IdentityMap> {
    self.identities.ok_or_else(|| Self::missing(Param::Identities))
  }
}

/// Required timestamp at `path`; missing or unparseable values are response-shape errors.
pub(crate) fn require_timestamp(value: &serde_json::Value, path: &[&str], context: &str) -> Result<DateTime<FixedOffset>> {
  let raw = value.fetch(path).require::<String>(context)?;
  parse_timestamp(&raw).ok_or_else(|| InsightsError::response(context, path.join(".")))
}

/// Optional timestamp at `path`; unparseable values count as absent.
pub(crate) fn optional_timestamp(value: &serde_json::Value, path: &[&str]) -> Option<DateTime<FixedOffset>> {
  value.fetch(path).to::<String>().and_then(|raw| parse_timestamp(&raw))
}
