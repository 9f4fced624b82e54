// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Flatten pull request comment threads into one record per user comment
// role: clients/pull-request-comments
// inputs: Params { project, repo, pull_request_id }
// outputs: Records with pr_comments = 1, week from the comment's lastUpdatedDate
// side_effects: One GET per call
// invariants: commentType == "system" is excluded; comments without a commentType are kept
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::debug;

use super::api::Query;
use super::{require_timestamp, ClientContext, Param, Params, ResourceClient};
use crate::error::Result;
use crate::ext::serde_json::JsonFetch;
use crate::schema::{field, Record, Value};
use crate::util::iso_week;

const CONTEXT: &str = "pull request threads";
const SYSTEM_COMMENT: &str = "system";

pub struct PullRequestCommentsClient<'a> {
  ctx: ClientContext<'a>,
}

impl<'a> PullRequestCommentsClient<'a> {
  pub fn new(ctx: ClientContext<'a>) -> Self {
    Self { ctx }
  }

  fn comment_record(&self, comment: &serde_json::Value, repo: &str) -> Result<Record> {
    let author = comment.fetch(&["author", "displayName"]).require::<String>(CONTEXT)?;
    let updated = require_timestamp(comment, &["lastUpdatedDate"], CONTEXT)?;

    self.ctx.schema.build([
      (field::CONTRIBUTOR, Value::Text(author)),
      (field::WEEK, Value::Text(iso_week(&updated))),
      (field::PR_COMMENTS, Value::Int(1)),
      (field::REPO, Value::text(repo)),
    ])
  }
}

fn is_user_comment(comment: &serde_json::Value) -> bool {
  comment.fetch(&["commentType"]).to::<String>().as_deref() != Some(SYSTEM_COMMENT)
}

impl ResourceClient for PullRequestCommentsClient<'_> {
  fn fetch(&self, params: &Params<'_>) -> Result<Vec<Record>> {
    params.require("pull request comments", &[Param::Repo, Param::PullRequestId, Param::Project])?;
    let repo = params.get_repo()?;
    let project = params.get_project()?;
    let pull_request_id = params.get_pull_request_id()?;

    let path = format!(
      "{}/{}/_apis/git/repositories/{}/pullrequests/{}/threads",
      self.ctx.organization, project, repo, pull_request_id
    );
    let body = self.ctx.api.get_json(&path, &Query::new())?;
    let threads = body.require_array(&["value"], CONTEXT)?;

    let mut records = Vec::new();

    for thread in threads {
      for comment in thread.require_array(&["comments"], CONTEXT)? {
        if is_user_comment(comment) {
          records.push(self.comment_record(comment, repo)?);
        }
      }
    }

    debug!(%repo, pull_request_id, threads = threads.len(), records = records.len(), "fetched pull request comments");

    Ok(records)
  }
}
