// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Query user stories and emit created/assigned lifecycle records
// role: clients/work-items
// inputs: Params { project, team_id, repo }
// outputs: One "created" record per story; one "assigned" record per story past New with an assignee and activation date
// side_effects: One WIQL POST, then one GET per batch of at most 200 ids
// invariants:
// - A details call never carries more than WORK_ITEM_BATCH_LIMIT ids; larger requests fail before any call
// - Story points default to 0 when absent; completion days only for Closed/Resolved stories
// - Initial PR submission days use the earliest "Pull Request" artifact link created on/after activation
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::api::Query;
use super::{optional_timestamp, require_timestamp, ClientContext, Param, Params, ResourceClient};
use crate::error::{InsightsError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::schema::{field, Record, Value};
use crate::util::{elapsed_days, elapsed_days_by_minute, iso_week};

const CONTEXT: &str = "work items";

pub const WORK_ITEM_BATCH_LIMIT: usize = 200;

const USER_STORY_QUERY: &str =
  "Select [System.Id] From WorkItems Where [System.WorkItemType] = 'User Story' AND [State] <> 'Removed'";

const CREATED_BY: &str = "System.CreatedBy";
const CREATED_DATE: &str = "System.CreatedDate";
const STATE: &str = "System.State";
const ASSIGNED_TO: &str = "System.AssignedTo";
const ACTIVATED_DATE: &str = "Microsoft.VSTS.Common.ActivatedDate";
const RESOLVED_DATE: &str = "Microsoft.VSTS.Common.ResolvedDate";
const STORY_POINTS: &str = "Microsoft.VSTS.Scheduling.StoryPoints";

const STATE_NEW: &str = "New";
const COMPLETED_STATES: [&str; 2] = ["Closed", "Resolved"];

const ARTIFACT_LINK: &str = "ArtifactLink";
const PULL_REQUEST_LINK: &str = "Pull Request";

pub struct WorkItemsClient<'a> {
  ctx: ClientContext<'a>,
}

impl<'a> WorkItemsClient<'a> {
  pub fn new(ctx: ClientContext<'a>) -> Self {
    Self { ctx }
  }

  /// Ids of every user story not in the Removed state.
  pub fn query_story_ids(&self, project: &str, team_id: &str) -> Result<Vec<i64>> {
    let path = format!("{}/{}/{}/_apis/wit/wiql", self.ctx.organization, project, team_id);
    let body = serde_json::json!({ "query": USER_STORY_QUERY });
    let resp = self.ctx.api.post_json(&path, &body, &Query::new())?;

    resp
      .require_array(&["workItems"], CONTEXT)?
      .iter()
      .map(|w| w.fetch(&["id"]).require::<i64>(CONTEXT))
      .collect()
  }

  /// Full work items (with relations) for at most WORK_ITEM_BATCH_LIMIT ids.
  pub fn fetch_details(&self, project: &str, ids: &[i64]) -> Result<Vec<serde_json::Value>> {
    if ids.len() > WORK_ITEM_BATCH_LIMIT {
      return Err(InsightsError::config(format!(
        "the work items API supports at most {} ids per call, got {}",
        WORK_ITEM_BATCH_LIMIT,
        ids.len()
      )));
    }

    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    let path = format!("{}/{}/_apis/wit/workitems", self.ctx.organization, project);
    let query = Query::new().with("ids", joined).with("$expand", "Relations");
    let body = self.ctx.api.get_json(&path, &query)?;

    Ok(body.require_array(&["value"], CONTEXT)?.to_vec())
  }

  fn story_records(&self, item: &serde_json::Value, repo: &str) -> Result<Vec<Record>> {
    let creator = item.fetch(&["fields", CREATED_BY, "displayName"]).require::<String>(CONTEXT)?;
    let created = require_timestamp(item, &["fields", CREATED_DATE], CONTEXT)?;

    let mut out = vec![self.ctx.schema.build([
      (field::CONTRIBUTOR, Value::Text(creator)),
      (field::WEEK, Value::Text(iso_week(&created))),
      (field::REPO, Value::text(repo)),
      (field::USER_STORIES_CREATED, Value::Int(1)),
    ])?];

    let assignee = item.fetch(&["fields", ASSIGNED_TO, "displayName"]).to::<String>();
    let activated = item.fetch(&["fields", ACTIVATED_DATE]).to::<String>();

    let (Some(assignee), Some(_)) = (assignee, activated) else {
      return Ok(out);
    };

    let state = item.fetch(&["fields", STATE]).require::<String>(CONTEXT)?;
    if state == STATE_NEW {
      return Ok(out);
    }

    let activated = require_timestamp(item, &["fields", ACTIVATED_DATE], CONTEXT)?;
    let completed = COMPLETED_STATES.contains(&state.as_str());
    let points = item.fetch(&["fields", STORY_POINTS]).to::<f64>().unwrap_or(0.0);

    let completion_days = if completed {
      let resolved = require_timestamp(item, &["fields", RESOLVED_DATE], CONTEXT)?;
      Value::Float(elapsed_days(&activated, &resolved))
    } else {
      Value::Null
    };

    out.push(self.ctx.schema.build([
      (field::CONTRIBUTOR, Value::Text(assignee)),
      (field::WEEK, Value::Text(iso_week(&activated))),
      (field::REPO, Value::text(repo)),
      (field::USER_STORIES_ASSIGNED, Value::Int(1)),
      (field::USER_STORIES_COMPLETED, Value::Int(completed as i64)),
      (field::USER_STORY_POINTS_ASSIGNED, Value::Float(points)),
      (field::USER_STORY_POINTS_COMPLETED, Value::Float(if completed { points } else { 0.0 })),
      (field::USER_STORY_COMPLETION_DAYS, completion_days),
      (
        field::USER_STORY_INITIAL_PR_SUBMISSION_DAYS,
        Value::float_or_null(initial_pr_submission_days(item, &activated)),
      ),
    ])?);

    Ok(out)
  }
}

/// Days from activation to the earliest linked pull request created on/after activation.
pub fn initial_pr_submission_days(item: &serde_json::Value, activated: &DateTime<FixedOffset>) -> Option<f64> {
  let relations = item.fetch(&["relations"]).value()?.as_array()?;

  relations
    .iter()
    .filter(|rel| rel.fetch(&["rel"]).to::<String>().as_deref() == Some(ARTIFACT_LINK))
    .filter(|rel| rel.fetch(&["attributes", "name"]).to::<String>().as_deref() == Some(PULL_REQUEST_LINK))
    .filter_map(|rel| optional_timestamp(rel, &["attributes", "resourceCreatedDate"]))
    .filter(|created| created >= activated)
    .min()
    .map(|earliest| elapsed_days_by_minute(activated, &earliest))
}

impl ResourceClient for WorkItemsClient<'_> {
  fn fetch(&self, params: &Params<'_>) -> Result<Vec<Record>> {
    params.require("work items", &[Param::TeamId, Param::Project, Param::Repo])?;
    let project = params.get_project()?;
    let team_id = params.get_team_id()?;
    let repo = params.get_repo()?;

    let ids = self.query_story_ids(project, team_id)?;
    let mut items = Vec::with_capacity(ids.len());

    for batch in ids.chunks(WORK_ITEM_BATCH_LIMIT) {
      items.extend(self.fetch_details(project, batch)?);
    }

    let mut records = Vec::with_capacity(items.len() * 2);

    for item in &items {
      records.extend(self.story_records(item, repo)?);
    }

    debug!(%project, stories = items.len(), records = records.len(), "fetched work items");

    Ok(records)
  }
}
