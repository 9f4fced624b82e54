// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Command-line and environment configuration, normalized into an EffectiveConfig
// role: config/cli
// inputs: argv; AdoOrgName, AdoProjectName, AdoRepos, BacklogTeamId, ProfileAliases, PatSecretName
// outputs: EffectiveConfig (validated settings, parsed aliases, group-by list, output location)
// invariants:
// - Repos keep their configured order; blank entries are dropped
// - Profile aliases accept single-quoted JSON (quotes are converted before parsing)
// errors: InsightsError::Config for missing settings or malformed alias JSON
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use clap::Parser;
use serde::Serialize;

use crate::error::{InsightsError, Result};
use crate::identity::IdentityMap;
use crate::manager::CollectionSettings;
use crate::secrets::DEFAULT_PAT_SECRET_NAME;

#[derive(Parser, Debug)]
#[command(
    name = "git-insights",
    version,
    about = "Aggregate pull request, commit, comment and user story activity per contributor/week/repo",
    long_about = None
)]
pub struct Cli {
  /// Organization name
  #[arg(long, env = "AdoOrgName")]
  pub organization: Option<String>,

  /// Project name
  #[arg(long, env = "AdoProjectName")]
  pub project: Option<String>,

  /// Comma-separated repository names or ids
  #[arg(long, env = "AdoRepos")]
  pub repos: Option<String>,

  /// Team id used for the user story query
  #[arg(long, env = "BacklogTeamId")]
  pub team_id: Option<String>,

  /// JSON object mapping commit email/username to display name
  #[arg(long, env = "ProfileAliases")]
  pub profile_aliases: Option<String>,

  /// Name of the secret holding the personal access token
  #[arg(long, env = "PatSecretName", default_value = DEFAULT_PAT_SECRET_NAME)]
  pub pat_secret_name: String,

  /// Comma-separated grouping columns
  #[arg(long, default_value = "contributor,week,repo")]
  pub group_by: String,

  /// Output file for the CSV (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Serialize)]
pub struct EffectiveConfig {
  pub organization: String,
  pub project: String,
  pub repos: Vec<String>,
  pub team_id: String,
  pub aliases: BTreeMap<String, String>,
  pub pat_secret_name: String,
  pub group_by: Vec<String>,
  pub out: String,
}

impl EffectiveConfig {
  pub fn collection_settings(&self) -> CollectionSettings {
    CollectionSettings {
      organization: self.organization.clone(),
      project: self.project.clone(),
      repos: self.repos.clone(),
      team_id: self.team_id.clone(),
      aliases: IdentityMap::from_pairs(self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
    }
  }

  pub fn group_by_columns(&self) -> Vec<&str> {
    self.group_by.iter().map(String::as_str).collect()
  }
}

fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

fn required(value: Option<String>, flag: &str, env: &str) -> Result<String> {
  match value {
    Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
    _ => Err(InsightsError::config(format!("provide --{} (or set {})", flag, env))),
  }
}

/// Parse the alias JSON; single quotes are accepted in place of double quotes.
pub fn parse_profile_aliases(raw: &str) -> Result<BTreeMap<String, String>> {
  if raw.trim().is_empty() {
    return Ok(BTreeMap::new());
  }

  serde_json::from_str(&raw.replace('\'', "\""))
    .map_err(|e| InsightsError::config(format!("profile aliases must be a JSON object of strings: {}", e)))
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let organization = required(cli.organization, "organization", "AdoOrgName")?;
  let project = required(cli.project, "project", "AdoProjectName")?;
  let team_id = required(cli.team_id, "team-id", "BacklogTeamId")?;

  let repos = split_list(cli.repos.as_deref().unwrap_or_default());
  if repos.is_empty() {
    return Err(InsightsError::config("provide at least one repository via --repos (or set AdoRepos)"));
  }

  let aliases = match cli.profile_aliases.as_deref() {
    Some(raw) => parse_profile_aliases(raw)?,
    None => BTreeMap::new(),
  };

  let group_by = split_list(&cli.group_by);
  if group_by.is_empty() {
    return Err(InsightsError::config("--group-by needs at least one column"));
  }

  Ok(EffectiveConfig {
    organization,
    project,
    repos,
    team_id,
    aliases,
    pat_secret_name: cli.pat_secret_name,
    group_by,
    out: cli.out,
  })
}
