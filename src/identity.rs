// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map commit author emails/usernames to canonical contributor names across identity systems
// role: identity/resolver
// inputs: Org entitlement lookup (principal name -> display name); configured profile aliases
// outputs: Immutable IdentityMap; AuthorResolution for a commit author
// invariants:
// - Keys are stored lower-cased; lookups are case-insensitive
// - Configured aliases win over entitlements on key collision
// - The map is built once per run and never mutated while records are built
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

/// Lower-cased email-or-username → canonical display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
  names: BTreeMap<String, String>,
}

/// Outcome of resolving a commit author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorResolution {
  /// Canonical contributor name.
  Resolved(String),
  /// Alias that could not be found; carried as-is.
  Unresolved(String),
}

impl IdentityMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    let names = pairs
      .into_iter()
      .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
      .collect();

    IdentityMap { names }
  }

  /// Entitlements overridden by configured aliases.
  pub fn merge(loaded: &IdentityMap, aliases: &IdentityMap) -> IdentityMap {
    let mut names = loaded.names.clone();

    for (k, v) in &aliases.names {
      names.insert(k.clone(), v.clone());
    }

    IdentityMap { names }
  }

  pub fn lookup(&self, key: &str) -> Option<&str> {
    self.names.get(&key.to_lowercase()).map(String::as_str)
  }

  /// Recover the key registered for a display name. Exact match; first key in order wins.
  pub fn key_for_display_name(&self, display_name: &str) -> Option<&str> {
    self
      .names
      .iter()
      .find(|(_, v)| v.as_str() == display_name)
      .map(|(k, _)| k.as_str())
  }

  /// Resolve a commit author.
  ///
  /// With an email, the lower-cased email is the alias. Without one (local git
  /// profile has no email configured), the author name is reverse-looked-up to
  /// recover the alias first. An alias absent from the map comes back
  /// `Unresolved`; when nothing can be recovered the lower-cased name is used.
  pub fn resolve_author(&self, email: Option<&str>, name: Option<&str>) -> AuthorResolution {
    let alias = match (email, name) {
      (Some(email), _) if !email.trim().is_empty() => email.to_lowercase(),
      (_, Some(name)) => match self.key_for_display_name(name) {
        Some(key) => key.to_string(),
        None => name.to_lowercase(),
      },
      _ => String::new(),
    };

    match self.lookup(&alias) {
      Some(canonical) => AuthorResolution::Resolved(canonical.to_string()),
      None => AuthorResolution::Unresolved(alias),
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}
