// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fetch every pull request of a repo (any status) and emit submitted + reviewed records
// role: clients/pull-requests
// inputs: Params { project, repo }
// outputs: One "submitted" record per PR; one "reviewed" record per approving, non-container reviewer
// side_effects: One GET per call
// invariants:
// - prs_merged = 1 iff status == "completed"; completion date/days only for completed PRs
// - Reviewed records take the PR creation week, not the review time
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::debug;

use super::api::Query;
use super::{optional_timestamp, require_timestamp, ClientContext, Param, Params, ResourceClient};
use crate::error::{InsightsError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::schema::{field, Record, Value};
use crate::util::{elapsed_days, iso_week};

const CONTEXT: &str = "pull requests";
const STATUS_COMPLETED: &str = "completed";

/// Reviewer vote values reported by the pull request API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewerVote {
  Approved,
  ApprovedWithSuggestions,
  NoVote,
  WaitingForAuthor,
  Rejected,
}

impl ReviewerVote {
  pub fn from_i64(v: i64) -> Option<Self> {
    match v {
      10 => Some(ReviewerVote::Approved),
      5 => Some(ReviewerVote::ApprovedWithSuggestions),
      0 => Some(ReviewerVote::NoVote),
      -5 => Some(ReviewerVote::WaitingForAuthor),
      -10 => Some(ReviewerVote::Rejected),
      _ => None,
    }
  }

  pub fn is_approval(&self) -> bool {
    matches!(self, ReviewerVote::Approved | ReviewerVote::ApprovedWithSuggestions)
  }
}

pub struct PullRequestsClient<'a> {
  ctx: ClientContext<'a>,
}

impl<'a> PullRequestsClient<'a> {
  pub fn new(ctx: ClientContext<'a>) -> Self {
    Self { ctx }
  }

  fn submitted_record(&self, pr: &serde_json::Value, repo: &str) -> Result<Record> {
    let contributor = pr.fetch(&["createdBy", "displayName"]).require::<String>(CONTEXT)?;
    let status = pr.fetch(&["status"]).require::<String>(CONTEXT)?;
    let id = pr.fetch(&["pullRequestId"]).require::<i64>(CONTEXT)?;
    let created = require_timestamp(pr, &["creationDate"], CONTEXT)?;

    let (completion_date, completion_days) = if status == STATUS_COMPLETED {
      let closed = require_timestamp(pr, &["closedDate"], CONTEXT)?;
      (Value::Timestamp(closed), Value::Float(elapsed_days(&created, &closed)))
    } else {
      (Value::Null, Value::Null)
    };

    self.ctx.schema.build([
      (field::CONTRIBUTOR, Value::Text(contributor)),
      (field::PRS_SUBMITTED, Value::Int(1)),
      (field::PRS_MERGED, Value::Int((status == STATUS_COMPLETED) as i64)),
      (field::WEEK, Value::Text(iso_week(&created))),
      (field::CREATION_DATETIME, Value::Timestamp(created)),
      (field::COMPLETION_DATE, completion_date),
      (field::PR_COMPLETION_DAYS, completion_days),
      (field::REPO, Value::text(repo)),
      (field::PULL_REQUEST_ID, Value::Int(id)),
    ])
  }

  fn reviewed_records(&self, pr: &serde_json::Value, repo: &str) -> Result<Vec<Record>> {
    let Some(reviewers) = pr.fetch(&["reviewers"]).value().and_then(|v| v.as_array()) else {
      return Ok(Vec::new());
    };

    let week = optional_timestamp(pr, &["creationDate"])
      .map(|created| iso_week(&created))
      .ok_or_else(|| InsightsError::response(CONTEXT, "creationDate"))?;

    let mut out = Vec::new();

    for reviewer in reviewers {
      // group/team reviewers
      if reviewer.fetch(&["isContainer"]).exists() {
        continue;
      }

      let approved = reviewer
        .fetch(&["vote"])
        .to::<i64>()
        .and_then(ReviewerVote::from_i64)
        .map(|v| v.is_approval())
        .unwrap_or(false);

      if !approved {
        continue;
      }

      let name = reviewer.fetch(&["displayName"]).require::<String>(CONTEXT)?;

      out.push(self.ctx.schema.build([
        (field::CONTRIBUTOR, Value::Text(name)),
        (field::WEEK, Value::text(week.as_str())),
        (field::PRS_REVIEWED, Value::Int(1)),
        (field::REPO, Value::text(repo)),
      ])?);
    }

    Ok(out)
  }
}

impl ResourceClient for PullRequestsClient<'_> {
  fn fetch(&self, params: &Params<'_>) -> Result<Vec<Record>> {
    params.require("pull requests", &[Param::Repo, Param::Project])?;
    let repo = params.get_repo()?;
    let project = params.get_project()?;

    let path = format!(
      "{}/{}/_apis/git/repositories/{}/pullrequests",
      self.ctx.organization, project, repo
    );
    let query = Query::new().with("searchCriteria.status", "all");
    let body = self.ctx.api.get_json(&path, &query)?;
    let pull_requests = body.require_array(&["value"], CONTEXT)?;

    let mut records = Vec::with_capacity(pull_requests.len() * 2);

    for pr in pull_requests {
      records.push(self.submitted_record(pr, repo)?);
      records.extend(self.reviewed_records(pr, repo)?);
    }

    debug!(%repo, pull_requests = pull_requests.len(), records = records.len(), "fetched pull requests");

    Ok(records)
  }
}
