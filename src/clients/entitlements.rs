// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load the organization directory and map principal names to display names
// role: clients/org-entitlements
// inputs: Graph API seam and organization name
// outputs: IdentityMap {principalName.lower(): displayName}
// side_effects: One GET against the graph endpoint
// invariants: Only profiles whose origin is the org directory ("aad") are mapped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use tracing::debug;

use super::api::{AdoApi, Query};
use crate::error::Result;
use crate::ext::serde_json::JsonFetch;
use crate::identity::IdentityMap;

const CONTEXT: &str = "graph users";
pub const DIRECTORY_ORIGIN: &str = "aad";

pub struct OrgEntitlementsClient<'a> {
  api: &'a dyn AdoApi,
  organization: &'a str,
}

impl<'a> OrgEntitlementsClient<'a> {
  pub fn new(api: &'a dyn AdoApi, organization: &'a str) -> Self {
    Self { api, organization }
  }

  pub fn fetch_identities(&self) -> Result<IdentityMap> {
    let path = format!("{}/_apis/graph/users", self.organization);
    let body = self.api.get_json(&path, &Query::new())?;
    let profiles = body.require_array(&["value"], CONTEXT)?;

    let mut pairs = Vec::with_capacity(profiles.len());

    for profile in profiles {
      if profile.fetch(&["origin"]).to::<String>().as_deref() != Some(DIRECTORY_ORIGIN) {
        continue;
      }

      let principal = profile.fetch(&["principalName"]).require::<String>(CONTEXT)?;
      let display = profile.fetch(&["displayName"]).require::<String>(CONTEXT)?;
      pairs.push((principal, display));
    }

    let identities = IdentityMap::from_pairs(pairs);
    debug!(profiles = profiles.len(), mapped = identities.len(), "loaded org entitlements");

    Ok(identities)
  }
}
