use git_insights::clients::pull_requests::PullRequestsClient;
use git_insights::clients::{Params, ResourceClient};
use git_insights::schema::{field, Schema, Value};
use serde_json::json;

use crate::common::{ctx, scenario_api, FixtureApi, PROJECT, PULL_REQUESTS};

#[test]
fn emits_submitted_and_approving_reviewer_records() {
  test_support::init_tracing();
  let api = scenario_api();
  let schema = Schema::standard().unwrap();
  let client = PullRequestsClient::new(ctx(&api, &schema));

  let records = client.fetch(&Params::new().project(PROJECT).repo("repo1")).unwrap();

  assert_eq!(records.len(), 5);
  let submitted: Vec<_> = records.iter().filter(|r| r.int(field::PRS_SUBMITTED) == 1).collect();
  assert_eq!(submitted.len(), 4);
  assert_eq!(records.iter().map(|r| r.int(field::PRS_MERGED)).sum::<i64>(), 1);

  let reviewed: Vec<_> = records.iter().filter(|r| r.int(field::PRS_REVIEWED) == 1).collect();
  assert_eq!(reviewed.len(), 1);
  assert_eq!(reviewed[0].text(field::CONTRIBUTOR), Some("Grace Hopper"));
  assert_eq!(reviewed[0].int(field::PRS_SUBMITTED), 0);

  let completed = submitted
    .iter()
    .find(|r| r.get(field::PULL_REQUEST_ID) == Some(&Value::Int(101)))
    .unwrap();
  assert_eq!(completed.get(field::PR_COMPLETION_DAYS), Some(&Value::Float(2.0)));
  assert!(matches!(completed.get(field::COMPLETION_DATE), Some(Value::Timestamp(_))));
  assert_eq!(completed.text(field::REPO), Some("repo1"));

  let abandoned = submitted
    .iter()
    .find(|r| r.get(field::PULL_REQUEST_ID) == Some(&Value::Int(103)))
    .unwrap();
  assert_eq!(abandoned.int(field::PRS_MERGED), 0);
  assert!(abandoned.get(field::PR_COMPLETION_DAYS).unwrap().is_null());
  assert!(abandoned.get(field::COMPLETION_DATE).unwrap().is_null());

  let calls = api.calls();
  assert_eq!(calls.len(), 1);
  assert_eq!(calls[0].path, "contoso/insights/_apis/git/repositories/repo1/pullrequests");
  assert_eq!(calls[0].query.get("searchCriteria.status"), Some("all"));
}

#[test]
fn reviewed_week_follows_pull_request_creation() {
  let api = FixtureApi::new().get(
    PULL_REQUESTS,
    json!({ "value": [{
      "pullRequestId": 7,
      "status": "active",
      "createdBy": { "displayName": "Ada Lovelace" },
      "creationDate": "2020-12-31T23:00:00Z",
      "reviewers": [
        { "displayName": "Grace Hopper", "vote": 5 },
        { "displayName": "Alan Turing", "vote": -10 }
      ]
    }]}),
  );
  let schema = Schema::standard().unwrap();
  let records = PullRequestsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1"))
    .unwrap();

  assert_eq!(records.len(), 2);
  assert_eq!(records[0].text(field::WEEK), Some("53"));
  assert_eq!(records[1].text(field::WEEK), records[0].text(field::WEEK));
  assert_eq!(records[1].text(field::CONTRIBUTOR), Some("Grace Hopper"));
}

#[test]
fn sparse_payloads_still_yield_complete_records() {
  let api = FixtureApi::new().get(
    PULL_REQUESTS,
    json!({ "value": [{
      "pullRequestId": 8,
      "status": "active",
      "createdBy": { "displayName": "Ada Lovelace" },
      "creationDate": "2020-10-26T10:00:00Z"
    }]}),
  );
  let schema = Schema::standard().unwrap();
  let records = PullRequestsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1"))
    .unwrap();

  assert_eq!(records.len(), 1);
  for name in schema.field_names() {
    assert!(records[0].get(name).is_some(), "missing field {}", name);
  }
}

#[test]
fn missing_repo_fails_before_any_call() {
  let api = FixtureApi::new();
  let schema = Schema::standard().unwrap();
  let err = PullRequestsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT))
    .unwrap_err();

  assert!(err.is_config());
  assert!(err.to_string().contains("repo"));
  assert_eq!(api.call_count(), 0);
}

#[test]
fn missing_creation_date_is_a_response_error() {
  let api = FixtureApi::new().get(
    PULL_REQUESTS,
    json!({ "value": [{ "pullRequestId": 9, "status": "active", "createdBy": { "displayName": "Ada" } }] }),
  );
  let schema = Schema::standard().unwrap();
  let err = PullRequestsClient::new(ctx(&api, &schema))
    .fetch(&Params::new().project(PROJECT).repo("repo1"))
    .unwrap_err();

  assert!(err.to_string().contains("creationDate"));
}
