// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Group records by caller-chosen key columns and reduce every measure with its schema aggregation
// role: aggregation/table
// inputs: Records (complete per schema), group-by column names, Schema
// outputs: Table { group columns, measure columns, rows sorted by key tuple }
// invariants:
// - Group-by columns must be schema fields; unknown or empty selections are Config errors
// - Fields with Aggregation::None never appear as measure columns
// - Rows with a null key in any group column are dropped
// - Sum yields Int when every contributing cell is Int, else Float; Mean ignores nulls and is Null when nothing contributed
// errors: InsightsError::Config for invalid group-by selections
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{InsightsError, Result};
use crate::schema::{Aggregation, Record, Schema, Value};

/// One aggregated group.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
  pub keys: Vec<String>,
  pub values: Vec<Value>,
}

/// Aggregated output: one row per distinct group key tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  group_columns: Vec<&'static str>,
  measure_columns: Vec<&'static str>,
  rows: Vec<Row>,
}

impl Table {
  pub fn group_columns(&self) -> &[&'static str] {
    &self.group_columns
  }

  pub fn measure_columns(&self) -> &[&'static str] {
    &self.measure_columns
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn row(&self, keys: &[&str]) -> Option<&Row> {
    self
      .rows
      .iter()
      .find(|r| r.keys.len() == keys.len() && r.keys.iter().zip(keys).all(|(a, b)| a == b))
  }

  /// Aggregated value of `column` for the group `keys`.
  pub fn value(&self, keys: &[&str], column: &str) -> Option<&Value> {
    let idx = self.measure_columns.iter().position(|c| *c == column)?;
    self.row(keys).and_then(|r| r.values.get(idx))
  }
}

/// Resolve group-by names to schema field names.
pub fn validate_group_by(schema: &Schema, group_by: &[&str]) -> Result<Vec<&'static str>> {
  if group_by.is_empty() {
    return Err(InsightsError::config("at least one group-by column is required"));
  }

  let mut resolved = Vec::with_capacity(group_by.len());

  for column in group_by {
    let Some(name) = schema.field_names().find(|f| *f == *column) else {
      return Err(InsightsError::config(format!("unknown group-by column `{}`", column)));
    };

    if resolved.contains(&name) {
      return Err(InsightsError::config(format!("group-by column `{}` listed twice", column)));
    }

    resolved.push(name);
  }

  Ok(resolved)
}

#[derive(Debug, Default)]
struct Accumulator {
  int_sum: i64,
  float_sum: f64,
  count: usize,
  all_int: bool,
}

impl Accumulator {
  fn new() -> Self {
    Self {
      all_int: true,
      ..Self::default()
    }
  }

  fn push(&mut self, value: &Value) {
    match value {
      Value::Int(i) => {
        self.int_sum += i;
        self.float_sum += *i as f64;
        self.count += 1;
      }
      other => {
        if let Some(f) = other.as_f64() {
          self.float_sum += f;
          self.all_int = false;
          self.count += 1;
        }
      }
    }
  }

  fn finish(&self, aggregation: Aggregation) -> Value {
    match aggregation {
      Aggregation::Sum if self.all_int => Value::Int(self.int_sum),
      Aggregation::Sum => Value::Float(self.float_sum),
      Aggregation::Mean if self.count == 0 => Value::Null,
      Aggregation::Mean => Value::Float(self.float_sum / self.count as f64),
      Aggregation::None => Value::Null,
    }
  }
}

/// Group `records` by `group_by` and apply the schema's aggregation table.
pub fn aggregate(records: &[Record], group_by: &[&str], schema: &Schema) -> Result<Table> {
  let group_columns = validate_group_by(schema, group_by)?;
  let measures: Vec<(&'static str, Aggregation)> = schema
    .measures()
    .filter(|(name, _)| !group_columns.contains(name))
    .collect();

  let mut groups: BTreeMap<Vec<String>, Vec<Accumulator>> = BTreeMap::new();
  let mut dropped = 0usize;

  'records: for record in records {
    let mut key = Vec::with_capacity(group_columns.len());

    for column in &group_columns {
      match record.get(column) {
        Some(v) if !v.is_null() => key.push(v.to_string()),
        _ => {
          dropped += 1;
          continue 'records;
        }
      }
    }

    let accs = groups
      .entry(key)
      .or_insert_with(|| measures.iter().map(|_| Accumulator::new()).collect());

    for ((name, _), acc) in measures.iter().zip(accs.iter_mut()) {
      if let Some(v) = record.get(name) {
        acc.push(v);
      }
    }
  }

  debug!(records = records.len(), groups = groups.len(), dropped, "aggregated records");

  let rows = groups
    .into_iter()
    .map(|(keys, accs)| Row {
      keys,
      values: measures.iter().zip(&accs).map(|((_, agg), acc)| acc.finish(*agg)).collect(),
    })
    .collect();

  Ok(Table {
    group_columns,
    measure_columns: measures.iter().map(|(name, _)| *name).collect(),
    rows,
  })
}
