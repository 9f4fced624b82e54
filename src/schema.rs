// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Canonical flat record schema: field names, default table, aggregation table, record building
// role: model/schema
// inputs: Sparse (field, value) pairs from resource clients
// outputs: Complete Records carrying every schema field; Schema consulted by the aggregator
// invariants:
// - Default table and aggregation table have exactly the same key set (checked in Schema::new)
// - Every built Record holds every schema field; unset fields resolve to their default
// - Records are immutable once built; callers append, never mutate
// errors: Schema mismatch and unknown field names are InsightsError::Config
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::error::{InsightsError, Result};

pub mod field {
  pub const CONTRIBUTOR: &str = "contributor";
  pub const PRS_SUBMITTED: &str = "prs_submitted";
  pub const PRS_MERGED: &str = "prs_merged";
  pub const WEEK: &str = "week";
  pub const PRS_REVIEWED: &str = "prs_reviewed";
  pub const PR_COMMENTS: &str = "pr_comments";
  pub const CREATION_DATETIME: &str = "creation_datetime";
  pub const PR_COMMITS_PUSHED: &str = "pr_commits_pushed";
  pub const COMMIT_CHANGE_COUNT_EDITS: &str = "commit_change_count_edits";
  pub const COMMIT_CHANGE_COUNT_DELETES: &str = "commit_change_count_deletes";
  pub const COMMIT_CHANGE_COUNT_ADDITIONS: &str = "commit_change_count_additions";
  pub const COMPLETION_DATE: &str = "completion_date";
  pub const PR_COMPLETION_DAYS: &str = "pr_completion_days";
  pub const REPO: &str = "repo";
  pub const USER_STORIES_ASSIGNED: &str = "user_stories_assigned";
  pub const USER_STORIES_COMPLETED: &str = "user_stories_completed";
  pub const USER_STORY_POINTS_ASSIGNED: &str = "user_story_points_assigned";
  pub const USER_STORY_POINTS_COMPLETED: &str = "user_story_points_completed";
  pub const USER_STORY_COMPLETION_DAYS: &str = "user_story_completion_days";
  pub const USER_STORIES_CREATED: &str = "user_stories_created";
  pub const USER_STORY_INITIAL_PR_SUBMISSION_DAYS: &str = "user_story_initial_pr_submission_days";
  pub const PULL_REQUEST_ID: &str = "pull_request_id";
}

/// A scalar cell of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Int(i64),
  Float(f64),
  Text(String),
  Timestamp(DateTime<FixedOffset>),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  /// Numeric view used by aggregation; non-numeric cells are None.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) if !f.is_nan() => Some(*f),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn text(s: impl Into<String>) -> Self {
    Value::Text(s.into())
  }

  /// `Some(x)` → `Float(x)`, `None` → `Null`.
  pub fn float_or_null(v: Option<f64>) -> Self {
    v.map(Value::Float).unwrap_or(Value::Null)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Int(i) => write!(f, "{}", i),
      Value::Float(x) if x.is_nan() => Ok(()),
      Value::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{:.1}", x),
      Value::Float(x) => write!(f, "{}", x),
      Value::Text(s) => f.write_str(s),
      Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self {
    Value::Int(v)
  }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self {
    Value::Float(v)
  }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self {
    Value::Text(v.to_string())
  }
}

impl From<String> for Value {
  fn from(v: String) -> Self {
    Value::Text(v)
  }
}

impl From<DateTime<FixedOffset>> for Value {
  fn from(v: DateTime<FixedOffset>) -> Self {
    Value::Timestamp(v)
  }
}

/// How a field is reduced when rows are grouped. `None` marks grouping/descriptive keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
  Sum,
  Mean,
  None,
}

const STANDARD_DEFAULTS: &[(&str, Value)] = &[
  (field::CONTRIBUTOR, Value::Null),
  (field::PRS_SUBMITTED, Value::Int(0)),
  (field::PRS_MERGED, Value::Int(0)),
  (field::WEEK, Value::Null),
  (field::PRS_REVIEWED, Value::Int(0)),
  (field::PR_COMMENTS, Value::Int(0)),
  (field::CREATION_DATETIME, Value::Null),
  (field::PR_COMMITS_PUSHED, Value::Int(0)),
  (field::COMMIT_CHANGE_COUNT_EDITS, Value::Int(0)),
  (field::COMMIT_CHANGE_COUNT_DELETES, Value::Int(0)),
  (field::COMMIT_CHANGE_COUNT_ADDITIONS, Value::Int(0)),
  (field::COMPLETION_DATE, Value::Null),
  (field::PR_COMPLETION_DAYS, Value::Null),
  (field::REPO, Value::Null),
  (field::USER_STORIES_ASSIGNED, Value::Int(0)),
  (field::USER_STORIES_COMPLETED, Value::Int(0)),
  (field::USER_STORY_POINTS_ASSIGNED, Value::Float(0.0)),
  (field::USER_STORY_POINTS_COMPLETED, Value::Float(0.0)),
  (field::USER_STORY_COMPLETION_DAYS, Value::Null),
  (field::USER_STORIES_CREATED, Value::Int(0)),
  (field::USER_STORY_INITIAL_PR_SUBMISSION_DAYS, Value::Null),
  (field::PULL_REQUEST_ID, Value::Null),
];

const STANDARD_AGGREGATIONS: &[(&str, Aggregation)] = &[
  (field::CONTRIBUTOR, Aggregation::None),
  (field::PRS_SUBMITTED, Aggregation::Sum),
  (field::PRS_MERGED, Aggregation::Sum),
  (field::WEEK, Aggregation::None),
  (field::PRS_REVIEWED, Aggregation::Sum),
  (field::PR_COMMENTS, Aggregation::Sum),
  (field::CREATION_DATETIME, Aggregation::None),
  (field::PR_COMMITS_PUSHED, Aggregation::Sum),
  (field::COMMIT_CHANGE_COUNT_EDITS, Aggregation::Sum),
  (field::COMMIT_CHANGE_COUNT_DELETES, Aggregation::Sum),
  (field::COMMIT_CHANGE_COUNT_ADDITIONS, Aggregation::Sum),
  (field::COMPLETION_DATE, Aggregation::None),
  (field::PR_COMPLETION_DAYS, Aggregation::Mean),
  (field::REPO, Aggregation::None),
  (field::USER_STORIES_ASSIGNED, Aggregation::Sum),
  (field::USER_STORIES_COMPLETED, Aggregation::Sum),
  (field::USER_STORY_POINTS_ASSIGNED, Aggregation::Sum),
  (field::USER_STORY_POINTS_COMPLETED, Aggregation::Sum),
  (field::USER_STORY_COMPLETION_DAYS, Aggregation::Mean),
  (field::USER_STORIES_CREATED, Aggregation::Sum),
  (field::USER_STORY_INITIAL_PR_SUBMISSION_DAYS, Aggregation::Mean),
  (field::PULL_REQUEST_ID, Aggregation::None),
];

#[derive(Debug, Clone)]
struct FieldSpec {
  name: &'static str,
  default: Value,
  aggregation: Aggregation,
}

/// Immutable schema built once per run and shared by reference.
#[derive(Debug, Clone)]
pub struct Schema {
  fields: Vec<FieldSpec>,
}

impl Schema {
  /// Build a schema from a default table and an aggregation table.
  ///
  /// Field order follows `defaults`. Both tables must name exactly the same fields.
  pub fn new(defaults: &[(&'static str, Value)], aggregations: &[(&'static str, Aggregation)]) -> Result<Self> {
    let default_keys: BTreeSet<&str> = defaults.iter().map(|(k, _)| *k).collect();
    let agg_keys: BTreeSet<&str> = aggregations.iter().map(|(k, _)| *k).collect();

    if default_keys.len() != defaults.len() || agg_keys.len() != aggregations.len() {
      return Err(InsightsError::config("schema tables contain duplicate field names"));
    }

    if default_keys != agg_keys {
      let missing_agg: Vec<&str> = default_keys.difference(&agg_keys).copied().collect();
      let missing_default: Vec<&str> = agg_keys.difference(&default_keys).copied().collect();
      return Err(InsightsError::config(format!(
        "schema tables disagree: no aggregation for {:?}, no default for {:?}",
        missing_agg, missing_default
      )));
    }

    let aggs: BTreeMap<&str, Aggregation> = aggregations.iter().map(|(k, a)| (*k, *a)).collect();
    let fields = defaults
      .iter()
      .map(|(name, default)| FieldSpec {
        name: *name,
        default: default.clone(),
        aggregation: aggs[*name],
      })
      .collect();

    Ok(Schema { fields })
  }

  /// The pull request / comment / commit / work item schema.
  pub fn standard() -> Result<Self> {
    Schema::new(STANDARD_DEFAULTS, STANDARD_AGGREGATIONS)
  }

  pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.fields.iter().map(|f| f.name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.fields.iter().any(|f| f.name == name)
  }

  pub fn aggregation(&self, name: &str) -> Option<Aggregation> {
    self.fields.iter().find(|f| f.name == name).map(|f| f.aggregation)
  }

  pub fn default_value(&self, name: &str) -> Option<&Value> {
    self.fields.iter().find(|f| f.name == name).map(|f| &f.default)
  }

  /// Fields that take part in numeric aggregation, in schema order.
  pub fn measures(&self) -> impl Iterator<Item = (&'static str, Aggregation)> + '_ {
    self
      .fields
      .iter()
      .filter(|f| f.aggregation != Aggregation::None)
      .map(|f| (f.name, f.aggregation))
  }

  /// Merge `values` over the default table.
  pub fn build<I, V>(&self, values: I) -> Result<Record>
  where
    I: IntoIterator<Item = (&'static str, V)>,
    V: Into<Value>,
  {
    let mut cells: BTreeMap<&'static str, Value> =
      self.fields.iter().map(|f| (f.name, f.default.clone())).collect();

    for (name, value) in values {
      match cells.get_mut(name) {
        Some(slot) => *slot = value.into(),
        None => return Err(InsightsError::config(format!("`{}` is not a schema field", name))),
      }
    }

    Ok(Record { cells })
  }
}

/// One contributor's one unit of activity; carries every schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
  cells: BTreeMap<&'static str, Value>,
}

impl Record {
  pub fn get(&self, name: &str) -> Option<&Value> {
    self.cells.get(name)
  }

  pub fn int(&self, name: &str) -> i64 {
    self.get(name).and_then(Value::as_i64).unwrap_or(0)
  }

  pub fn text(&self, name: &str) -> Option<&str> {
    self.get(name).and_then(Value::as_str)
  }

  pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.cells.keys().copied()
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }
}
