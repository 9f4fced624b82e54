use git_insights::clients::commits::{ChangeCounts, PullRequestCommitsClient, COMMIT_PAGE_SIZE};
use git_insights::clients::{Params, ResourceClient};
use git_insights::error::InsightsError;
use git_insights::identity::IdentityMap;
use git_insights::schema::{field, Record, Schema};
use serde_json::json;

use crate::common::{ctx, fixture, scenario_api, FixtureApi, PROJECT, PR_COMMITS, REPO_COMMITS};

fn identities() -> IdentityMap {
  IdentityMap::from_pairs([
    ("ada@contoso.com", "Ada Lovelace"),
    ("grace@contoso.com", "Grace Hopper"),
    ("alan@contoso.com", "Alan Turing"),
    ("ada@laptop.local", "Ada Lovelace"),
  ])
}

fn contributors(records: &[Record]) -> Vec<&str> {
  records.iter().filter_map(|r| r.text(field::CONTRIBUTOR)).collect()
}

fn history_page(ids: impl Iterator<Item = usize>) -> serde_json::Value {
  let value: Vec<_> = ids
    .map(|i| json!({ "commitId": format!("h{:05}", i), "changeCounts": { "Add": 1, "Edit": 0, "Delete": 0 } }))
    .collect();
  json!({ "count": value.len(), "value": value })
}

#[test]
fn one_record_per_commit_with_change_counts() {
  test_support::init_tracing();
  let api = scenario_api();
  let schema = Schema::standard().unwrap();
  let ids = identities();
  let client = PullRequestCommitsClient::new(ctx(&api, &schema));

  let records = client
    .fetch(&Params::new().project(PROJECT).repo("repo1").pull_request_id(101).identities(&ids))
    .unwrap();

  assert_eq!(records.len(), 8);
  assert!(records.iter().all(|r| r.int(field::PR_COMMITS_PUSHED) == 1));
  assert!(records.iter().all(|r| r.text(field::WEEK) == Some("44")));
  assert_eq!(records.iter().map(|r| r.int(field::COMMIT_CHANGE_COUNT_ADDITIONS)).sum::<i64>(), 5);
  assert_eq!(records.iter().map(|r| r.int(field::COMMIT_CHANGE_COUNT_DELETES)).sum::<i64>(), 3);
  assert_eq!(records.iter().map(|r| r.int(field::COMMIT_CHANGE_COUNT_EDITS)).sum::<i64>(), 0);
  assert_eq!(
    contributors(&records),
    vec![
      "Ada Lovelace",
      "Ada Lovelace",
      "Ada Lovelace",
      "Grace Hopper",
      "Grace Hopper",
      "Alan Turing",
      "Alan Turing",
      "Ada Lovelace"
    ]
  );
}

#[test]
fn unresolved_authors_keep_their_alias() {
  let api = scenario_api();
  let schema = Schema::standard().unwrap();
  let ids = IdentityMap::from_pairs([("ada@contoso.com", "Ada Lovelace")]);
  let client = PullRequestCommitsClient::new(ctx(&api, &schema));

  let records = client
    .fetch(&Params::new().project(PROJECT).repo("repo1").pull_request_id(101).identities(&ids))
    .unwrap();

  assert_eq!(records.len(), 8);
  let names = contributors(&records);
  assert_eq!(names[3], "grace@contoso.com");
  assert_eq!(names[5], "alan turing");
  assert_eq!(names[7], "ada@laptop.local");
}

#[test]
fn repository_history_is_loaded_once_per_repo() {
  let api = scenario_api();
  let schema = Schema::standard().unwrap();
  let ids = identities();
  let client = PullRequestCommitsClient::new(ctx(&api, &schema));

  for pr in [101, 102, 103] {
    let params = Params::new().project(PROJECT).repo("repo1").pull_request_id(pr).identities(&ids);
    client.fetch(&params).unwrap();
  }
  let other = Params::new().project(PROJECT).repo("repo2").pull_request_id(101).identities(&ids);
  client.fetch(&other).unwrap();

  assert_eq!(api.count(PR_COMMITS), 4);
  assert_eq!(api.count(REPO_COMMITS), 2);
}

#[test]
fn history_paging_stops_on_short_page() {
  let api = FixtureApi::new().get_with(REPO_COMMITS, |query| {
    match query.get("searchCriteria.$skip") {
      Some("0") => history_page(0..COMMIT_PAGE_SIZE),
      _ => history_page(COMMIT_PAGE_SIZE..COMMIT_PAGE_SIZE + 3),
    }
  });
  let schema = Schema::standard().unwrap();
  let client = PullRequestCommitsClient::new(ctx(&api, &schema));

  let counts = client.repo_change_counts(PROJECT, "repo1").unwrap();

  assert_eq!(counts.len(), 403);
  assert_eq!(
    counts.get("h00402"),
    Some(&ChangeCounts {
      additions: 1,
      deletes: 0,
      edits: 0
    })
  );

  let calls = api.calls();
  assert_eq!(calls.len(), 2);
  assert_eq!(calls[0].query.get("searchCriteria.$skip"), Some("0"));
  assert_eq!(calls[0].query.get("searchCriteria.$top"), Some("400"));
  assert_eq!(calls[1].query.get("searchCriteria.$skip"), Some("400"));
}

#[test]
fn duplicate_ids_across_pages_count_once() {
  let api = FixtureApi::new().get_with(REPO_COMMITS, |query| match query.get("searchCriteria.$skip") {
    Some("0") => history_page(0..4),
    Some("4") => history_page(2..6),
    _ => history_page(6..7),
  });
  let schema = Schema::standard().unwrap();
  let client = PullRequestCommitsClient::with_page_size(ctx(&api, &schema), 4);

  let counts = client.repo_change_counts(PROJECT, "repo1").unwrap();

  assert_eq!(counts.len(), 7);
  assert_eq!(api.call_count(), 3);
}

#[test]
fn exact_page_multiple_needs_one_empty_page() {
  let api = FixtureApi::new().get_with(REPO_COMMITS, |query| match query.get("searchCriteria.$skip") {
    Some("0") => history_page(0..2),
    Some("2") => history_page(2..4),
    _ => history_page(0..0),
  });
  let schema = Schema::standard().unwrap();
  let client = PullRequestCommitsClient::with_page_size(ctx(&api, &schema), 2);

  assert_eq!(client.repo_change_counts(PROJECT, "repo1").unwrap().len(), 4);
  assert_eq!(api.call_count(), 3);
}

#[test]
fn commits_missing_from_history_are_skipped() {
  let api = FixtureApi::new()
    .get(
      PR_COMMITS,
      json!({ "value": [
        { "commitId": "h00000", "author": { "name": "Ada Lovelace", "email": "ada@contoso.com", "date": "2020-10-26T09:00:00Z" } },
        { "commitId": "rebased-away", "author": { "name": "Ada Lovelace", "email": "ada@contoso.com", "date": "2020-10-26T10:00:00Z" } }
      ]}),
    )
    .get(REPO_COMMITS, history_page(0..1));
  let schema = Schema::standard().unwrap();
  let ids = identities();

  let records = PullRequestCommitsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1").pull_request_id(5).identities(&ids))
    .unwrap();

  assert_eq!(records.len(), 1);
  assert_eq!(records[0].int(field::COMMIT_CHANGE_COUNT_ADDITIONS), 1);
}

#[test]
fn missing_change_counts_is_a_response_error() {
  let api = FixtureApi::new()
    .get(PR_COMMITS, fixture("pull_request_commits.json"))
    .get(REPO_COMMITS, json!({ "value": [{ "commitId": "abc" }] }));
  let schema = Schema::standard().unwrap();
  let ids = identities();

  let err = PullRequestCommitsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1").pull_request_id(5).identities(&ids))
    .unwrap_err();

  assert!(matches!(err, InsightsError::Response { ref path, .. } if path == "changeCounts"));
}

#[test]
fn missing_params_fail_before_any_call() {
  let api = FixtureApi::new();
  let schema = Schema::standard().unwrap();

  let err = PullRequestCommitsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1"))
    .unwrap_err();

  assert!(err.is_config());
  let msg = err.to_string();
  assert!(msg.contains("pull_request_id"));
  assert!(msg.contains("identities"));
  assert_eq!(api.call_count(), 0);
}

#[test]
fn empty_repository_history_is_a_response_error() {
  let api = FixtureApi::new()
    .get(PR_COMMITS, fixture("pull_request_commits.json"))
    .get(REPO_COMMITS, json!({ "count": 0, "value": [] }));
  let schema = Schema::standard().unwrap();
  let ids = identities();

  let err = PullRequestCommitsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1").pull_request_id(5).identities(&ids))
    .unwrap_err();

  assert!(matches!(err, InsightsError::Response { ref path, .. } if path == "value"));
  assert_eq!(api.count(REPO_COMMITS), 1);
}
