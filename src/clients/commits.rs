// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Emit one record per pull request commit, with line change counts and a resolved contributor
// role: clients/pull-request-commits
// inputs: Params { project, repo, pull_request_id, identities }
// outputs: Records with pr_commits_pushed = 1 and commit_change_count_* from the repo history
// side_effects: One GET per call, plus a paginated history walk the first time a repo is seen
// invariants:
// - Repo change counts are loaded at most once per repo per client (per run) and reused read-only
// - History paging stops on the first page shorter than the page size
// - Commits absent from the repo history are skipped
// - An empty repo history is a Response error
// - Unresolved authors are kept under their raw alias and logged at warn
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use super::api::Query;
use super::{require_timestamp, ClientContext, Param, Params, ResourceClient};
use crate::error::{InsightsError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::identity::AuthorResolution;
use crate::schema::{field, Record, Value};
use crate::util::iso_week;

const CONTEXT: &str = "pull request commits";
const HISTORY_CONTEXT: &str = "repository commits";

pub const COMMIT_PAGE_SIZE: usize = 400;

/// Line change totals for a single commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
  pub additions: i64,
  pub deletes: i64,
  pub edits: i64,
}

/// Commit id → change counts for one repository.
pub type ChangeCountMap = HashMap<String, ChangeCounts>;

pub struct PullRequestCommitsClient<'a> {
  ctx: ClientContext<'a>,
  page_size: usize,
  change_counts: RefCell<HashMap<String, Rc<ChangeCountMap>>>,
}

impl<'a> PullRequestCommitsClient<'a> {
  pub fn new(ctx: ClientContext<'a>) -> Self {
    Self::with_page_size(ctx, COMMIT_PAGE_SIZE)
  }

  pub fn with_page_size(ctx: ClientContext<'a>, page_size: usize) -> Self {
    Self {
      ctx,
      page_size: page_size.max(1),
      change_counts: RefCell::new(HashMap::new()),
    }
  }

  /// Change counts for every commit in `repo`, loaded on first use.
  pub fn repo_change_counts(&self, project: &str, repo: &str) -> Result<Rc<ChangeCountMap>> {
    if let Some(cached) = self.change_counts.borrow().get(repo).cloned() {
      return Ok(cached);
    }

    let loaded = Rc::new(self.load_change_counts(project, repo)?);
    self.change_counts.borrow_mut().insert(repo.to_string(), Rc::clone(&loaded));

    Ok(loaded)
  }

  fn load_change_counts(&self, project: &str, repo: &str) -> Result<ChangeCountMap> {
    let path = format!(
      "{}/{}/_apis/git/repositories/{}/commits",
      self.ctx.organization, project, repo
    );

    let mut counts = ChangeCountMap::new();
    let mut skip = 0usize;
    let mut pages = 0usize;

    loop {
      let query = Query::new()
        .with("searchCriteria.$skip", skip.to_string())
        .with("searchCriteria.$top", self.page_size.to_string());
      let body = self.ctx.api.get_json(&path, &query)?;
      let page = body.require_array(&["value"], HISTORY_CONTEXT)?;
      pages += 1;

      for commit in page {
        let id = commit.fetch(&["commitId"]).require::<String>(HISTORY_CONTEXT)?;
        let change_counts = commit.fetch(&["changeCounts"]);

        if !change_counts.exists() {
          return Err(InsightsError::response(HISTORY_CONTEXT, "changeCounts"));
        }

        let entry = ChangeCounts {
          additions: commit.fetch(&["changeCounts", "Add"]).to_or_default(),
          deletes: commit.fetch(&["changeCounts", "Delete"]).to_or_default(),
          edits: commit.fetch(&["changeCounts", "Edit"]).to_or_default(),
        };

        counts.entry(id).or_insert(entry);
      }

      if page.len() < self.page_size {
        break;
      }

      skip += self.page_size;
    }

    if counts.is_empty() {
      return Err(InsightsError::response(HISTORY_CONTEXT, "value"));
    }

    debug!(%repo, pages, commits = counts.len(), "loaded repository change counts");

    Ok(counts)
  }
}

impl ResourceClient for PullRequestCommitsClient<'_> {
  fn fetch(&self, params: &Params<'_>) -> Result<Vec<Record>> {
    params.require(
      "pull request commits",
      &[Param::Repo, Param::Project, Param::PullRequestId, Param::Identities],
    )?;
    let repo = params.get_repo()?;
    let project = params.get_project()?;
    let pull_request_id = params.get_pull_request_id()?;
    let identities = params.get_identities()?;

    let path = format!(
      "{}/{}/_apis/git/repositories/{}/pullrequests/{}/commits",
      self.ctx.organization, project, repo, pull_request_id
    );
    let body = self.ctx.api.get_json(&path, &Query::new())?;
    let commits = body.require_array(&["value"], CONTEXT)?;

    let change_counts = self.repo_change_counts(project, repo)?;
    let mut records = Vec::with_capacity(commits.len());

    for commit in commits {
      let Some(commit_id) = commit.fetch(&["commitId"]).to::<String>() else {
        continue;
      };
      let Some(counts) = change_counts.get(&commit_id) else {
        continue;
      };

      let email = commit.fetch(&["author", "email"]).to::<String>();
      let name = commit.fetch(&["author", "name"]).to::<String>();
      let authored = require_timestamp(commit, &["author", "date"], CONTEXT)?;

      let contributor = match identities.resolve_author(email.as_deref(), name.as_deref()) {
        AuthorResolution::Resolved(canonical) => canonical,
        AuthorResolution::Unresolved(alias) => {
          warn!(
            alias = %alias,
            commit = %commit_id,
            "commit author alias not found; configure profile aliases with this commit email address"
          );
          alias
        }
      };

      records.push(self.ctx.schema.build([
        (field::CONTRIBUTOR, Value::Text(contributor)),
        (field::WEEK, Value::Text(iso_week(&authored))),
        (field::PR_COMMITS_PUSHED, Value::Int(1)),
        (field::COMMIT_CHANGE_COUNT_EDITS, Value::Int(counts.edits)),
        (field::COMMIT_CHANGE_COUNT_DELETES, Value::Int(counts.deletes)),
        (field::COMMIT_CHANGE_COUNT_ADDITIONS, Value::Int(counts.additions)),
        (field::REPO, Value::text(repo)),
      ])?);
    }

    debug!(%repo, pull_request_id, records = records.len(), "fetched pull request commits");

    Ok(records)
  }
}
