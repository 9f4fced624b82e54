use git_insights::clients::entitlements::OrgEntitlementsClient;
use git_insights::identity::IdentityMap;

use crate::common::{scenario_api, FixtureApi, ORG, USERS};

#[test]
fn maps_directory_users_only() {
  let api = scenario_api();

  let identities = OrgEntitlementsClient::new(&api, ORG).fetch_identities().unwrap();

  assert_eq!(identities.len(), 3);
  assert_eq!(identities.lookup("grace@contoso.com"), Some("Grace Hopper"));
  assert_eq!(identities.lookup("ALAN@contoso.com"), Some("Alan Turing"));
  assert_eq!(identities.lookup("guest@outlook.com"), None);
  assert_eq!(api.count(USERS), 1);
}

#[test]
fn configured_alias_overrides_directory_name() {
  let api = FixtureApi::new().get(
    USERS,
    serde_json::json!({ "value": [{ "origin": "aad", "principalName": "user@x.com", "displayName": "User X" }] }),
  );

  let loaded = OrgEntitlementsClient::new(&api, ORG).fetch_identities().unwrap();
  let merged = IdentityMap::merge(&loaded, &IdentityMap::from_pairs([("user@x.com", "User Y")]));

  assert_eq!(loaded.lookup("user@x.com"), Some("User X"));
  assert_eq!(merged.lookup("user@x.com"), Some("User Y"));
}

#[test]
fn directory_user_without_display_name_is_a_response_error() {
  let api = FixtureApi::new().get(
    USERS,
    serde_json::json!({ "value": [{ "origin": "aad", "principalName": "user@x.com" }] }),
  );

  let err = OrgEntitlementsClient::new(&api, ORG).fetch_identities().unwrap_err();
  assert!(err.to_string().contains("displayName"));
}
