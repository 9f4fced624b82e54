// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one collection run across repositories and hand the records to the aggregator
// role: orchestration/collection-manager
// inputs: CollectionSettings, token (or injected API seams), Schema
// outputs: Flat Vec<Record> (collect) or aggregated Table (aggregate)
// side_effects: Network calls through the core and graph API seams; info logs per repository
// invariants:
// - Settings (org, project, team, repos, token) are validated before any network call
// - Entitlements are loaded once and merged with configured aliases before any client runs
// - Repos are processed in configured order; per PR, commits then comments
// - Work items are fetched once and labeled with the first configured repo
// errors: Config for invalid settings; any client error aborts the run
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::info;

use crate::aggregate::{self, Table};
use crate::clients::api::{AdoApi, AdoHttpApi, Endpoint};
use crate::clients::comments::PullRequestCommentsClient;
use crate::clients::commits::PullRequestCommitsClient;
use crate::clients::entitlements::OrgEntitlementsClient;
use crate::clients::pull_requests::PullRequestsClient;
use crate::clients::work_items::WorkItemsClient;
use crate::clients::{ClientContext, Params, ResourceClient};
use crate::error::{InsightsError, Result};
use crate::identity::IdentityMap;
use crate::schema::{field, Record, Schema, Value};

/// Where to collect from.
#[derive(Debug, Clone, Default)]
pub struct CollectionSettings {
  pub organization: String,
  pub project: String,
  pub repos: Vec<String>,
  pub team_id: String,
  pub aliases: IdentityMap,
}

impl CollectionSettings {
  pub fn validate(&self) -> Result<()> {
    let blank = [
      ("organization", &self.organization),
      ("project", &self.project),
      ("team id", &self.team_id),
    ];

    for (name, value) in blank {
      if value.trim().is_empty() {
        return Err(InsightsError::config(format!("{} must not be empty", name)));
      }
    }

    if self.repos.iter().all(|r| r.trim().is_empty()) {
      return Err(InsightsError::config("at least one repository is required"));
    }

    Ok(())
  }

  /// Repo label attached to work item records.
  pub fn work_item_repo(&self) -> Result<&str> {
    self
      .repos
      .iter()
      .map(String::as_str)
      .find(|r| !r.trim().is_empty())
      .ok_or_else(|| InsightsError::config("at least one repository is required"))
  }
}

pub struct CollectionManager<'a> {
  settings: CollectionSettings,
  core: Box<dyn AdoApi + 'a>,
  graph: Box<dyn AdoApi + 'a>,
  schema: Schema,
}

impl CollectionManager<'static> {
  /// Manager backed by the live REST endpoints.
  pub fn new(settings: CollectionSettings, token: &str, schema: Schema) -> Result<Self> {
    if token.trim().is_empty() {
      return Err(InsightsError::config("personal access token is empty"));
    }
    settings.validate()?;

    Ok(Self::with_apis(
      settings,
      Box::new(AdoHttpApi::new(Endpoint::core(), token)),
      Box::new(AdoHttpApi::new(Endpoint::graph(), token)),
      schema,
    ))
  }
}

impl<'a> CollectionManager<'a> {
  pub fn with_apis(
    settings: CollectionSettings,
    core: Box<dyn AdoApi + 'a>,
    graph: Box<dyn AdoApi + 'a>,
    schema: Schema,
  ) -> Self {
    Self {
      settings,
      core,
      graph,
      schema,
    }
  }

  pub fn settings(&self) -> &CollectionSettings {
    &self.settings
  }

  pub fn schema(&self) -> &Schema {
    &self.schema
  }

  /// Entitlements merged with configured aliases.
  pub fn identities(&self) -> Result<IdentityMap> {
    let loaded = OrgEntitlementsClient::new(self.graph.as_ref(), &self.settings.organization).fetch_identities()?;
    Ok(IdentityMap::merge(&loaded, &self.settings.aliases))
  }

  /// Fetch every record for the configured repositories.
  pub fn collect(&self) -> Result<Vec<Record>> {
    self.settings.validate()?;

    let settings = &self.settings;
    let project = settings.project.as_str();
    let identities = self.identities()?;
    info!(identities = identities.len(), "resolved contributor identities");

    let ctx = ClientContext {
      api: self.core.as_ref(),
      organization: &settings.organization,
      schema: &self.schema,
    };
    let pull_requests = PullRequestsClient::new(ctx);
    let commits = PullRequestCommitsClient::new(ctx);
    let comments = PullRequestCommentsClient::new(ctx);
    let work_items = WorkItemsClient::new(ctx);

    let mut records = Vec::new();

    for repo in settings.repos.iter().filter(|r| !r.trim().is_empty()) {
      let repo_params = Params::new().project(project).repo(repo);
      let pr_records = pull_requests.fetch(&repo_params)?;
      let submitted: Vec<i64> = pr_records
        .iter()
        .filter(|r| r.int(field::PRS_SUBMITTED) == 1)
        .filter_map(|r| r.get(field::PULL_REQUEST_ID).and_then(Value::as_i64))
        .collect();
      let before = records.len();
      records.extend(pr_records);

      for pull_request_id in &submitted {
        let pr_params = repo_params.pull_request_id(*pull_request_id).identities(&identities);
        records.extend(commits.fetch(&pr_params)?);
        records.extend(comments.fetch(&pr_params)?);
      }

      info!(%repo, pull_requests = submitted.len(), records = records.len() - before, "collected repository");
    }

    // Work items are project-wide; they carry only the first repo's label.
    let label = settings.work_item_repo()?;
    let story_params = Params::new().project(project).team_id(&settings.team_id).repo(label);
    let stories = work_items.fetch(&story_params)?;
    info!(records = stories.len(), repo = %label, "collected work items");
    records.extend(stories);

    info!(records = records.len(), "collection complete");

    Ok(records)
  }

  /// Collect, then group by `group_by` using the schema's aggregation table.
  pub fn aggregate(&self, group_by: &[&str]) -> Result<Table> {
    aggregate::validate_group_by(&self.schema, group_by)?;
    let records = self.collect()?;
    aggregate::aggregate(&records, group_by, &self.schema)
  }
}
