use std::cell::RefCell;

use git_insights::clients::api::{AdoApi, Query};
use git_insights::clients::ClientContext;
use git_insights::error::{InsightsError, Result};
use git_insights::manager::CollectionSettings;
use git_insights::schema::Schema;
use serde_json::Value;

pub const ORG: &str = "contoso";
pub const PROJECT: &str = "insights";
pub const TEAM: &str = "team-a";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
  pub method: &'static str,
  pub path: String,
  pub query: Query,
  pub body: Option<Value>,
}

type Responder = Box<dyn Fn(&Query) -> Value>;

struct Route {
  method: &'static str,
  pattern: String,
  respond: Responder,
}

/// `*` matches exactly one path segment.
fn path_matches(pattern: &str, path: &str) -> bool {
  let p: Vec<&str> = pattern.trim_matches('/').split('/').collect();
  let a: Vec<&str> = path.trim_matches('/').split('/').collect();
  p.len() == a.len() && p.iter().zip(&a).all(|(p, a)| *p == "*" || p == a)
}

/// In-memory `AdoApi` serving canned JSON by method + path pattern and recording every call.
#[derive(Default)]
pub struct FixtureApi {
  routes: Vec<Route>,
  calls: RefCell<Vec<Call>>,
}

#[allow(dead_code)]
impl FixtureApi {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(self, pattern: &str, body: Value) -> Self {
    self.get_with(pattern, move |_| body.clone())
  }

  pub fn get_with(mut self, pattern: &str, respond: impl Fn(&Query) -> Value + 'static) -> Self {
    self.routes.push(Route {
      method: "GET",
      pattern: pattern.to_string(),
      respond: Box::new(respond),
    });
    self
  }

  pub fn post(mut self, pattern: &str, body: Value) -> Self {
    self.routes.push(Route {
      method: "POST",
      pattern: pattern.to_string(),
      respond: Box::new(move |_| body.clone()),
    });
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.borrow().clone()
  }

  pub fn call_count(&self) -> usize {
    self.calls.borrow().len()
  }

  /// Number of recorded calls whose path matches `pattern`.
  pub fn count(&self, pattern: &str) -> usize {
    self.calls.borrow().iter().filter(|c| path_matches(pattern, &c.path)).count()
  }

  fn respond(&self, method: &'static str, path: &str, query: &Query, body: Option<&Value>) -> Result<Value> {
    self.calls.borrow_mut().push(Call {
      method,
      path: path.to_string(),
      query: query.clone(),
      body: body.cloned(),
    });

    self
      .routes
      .iter()
      .find(|r| r.method == method && path_matches(&r.pattern, path))
      .map(|r| (r.respond)(query))
      .ok_or_else(|| InsightsError::Transport {
        method: method.to_string(),
        url: path.to_string(),
        detail: "no fixture route".into(),
      })
  }
}

impl AdoApi for FixtureApi {
  fn get_json(&self, resource_path: &str, query: &Query) -> Result<Value> {
    self.respond("GET", resource_path, query, None)
  }

  fn post_json(&self, resource_path: &str, body: &Value, query: &Query) -> Result<Value> {
    self.respond("POST", resource_path, query, Some(body))
  }
}

pub fn fixture(name: &str) -> Value {
  test_support::read_fixture_json(name)
}

pub const USERS: &str = "contoso/_apis/graph/users";
pub const PULL_REQUESTS: &str = "contoso/insights/_apis/git/repositories/*/pullrequests";
pub const PR_COMMITS: &str = "contoso/insights/_apis/git/repositories/*/pullrequests/*/commits";
pub const PR_THREADS: &str = "contoso/insights/_apis/git/repositories/*/pullrequests/*/threads";
pub const REPO_COMMITS: &str = "contoso/insights/_apis/git/repositories/*/commits";
pub const WIQL: &str = "contoso/insights/team-a/_apis/wit/wiql";
pub const WORK_ITEMS: &str = "contoso/insights/_apis/wit/workitems";

/// Every route of the week-44 scenario; any repo name is served the same payloads.
pub fn scenario_api() -> FixtureApi {
  FixtureApi::new()
    .get(USERS, fixture("graph_users.json"))
    .get(PULL_REQUESTS, fixture("pull_requests.json"))
    .get(PR_COMMITS, fixture("pull_request_commits.json"))
    .get(PR_THREADS, fixture("pull_request_threads.json"))
    .get(REPO_COMMITS, fixture("repository_commits.json"))
    .post(WIQL, fixture("wiql_user_stories.json"))
    .get(WORK_ITEMS, fixture("work_items.json"))
}

pub fn ctx<'a>(api: &'a dyn AdoApi, schema: &'a Schema) -> ClientContext<'a> {
  ClientContext {
    api,
    organization: ORG,
    schema,
  }
}

#[allow(dead_code)]
pub fn settings(repos: &[&str]) -> CollectionSettings {
  CollectionSettings {
    organization: ORG.into(),
    project: PROJECT.into(),
    repos: repos.iter().map(|r| r.to_string()).collect(),
    team_id: TEAM.into(),
    aliases: git_insights::identity::IdentityMap::from_pairs([("ada@laptop.local", "Ada Lovelace")]),
  }
}
