// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serialize an aggregated Table to delimited text and write it to a file or stdout
// role: output/sink
// inputs: Table; output location ("-" for stdout)
// outputs: Header row (group columns, then measure columns) followed by one line per group
// side_effects: Writes a file (creating parent dirs) or stdout
// invariants:
// - The group-key index is always emitted as the leading columns
// - Null and NaN cells render empty; fields containing the delimiter, quotes or newlines are quoted
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use crate::aggregate::Table;
use crate::error::Result;

pub const STDOUT: &str = "-";

fn escape(field: &str, delimiter: char) -> String {
  let needs_quotes = field.contains(delimiter) || field.contains('"') || field.contains('\n') || field.contains('\r');

  if needs_quotes {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_string()
  }
}

fn push_line<I, S>(out: &mut String, cells: I, delimiter: char)
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let line = cells
    .into_iter()
    .map(|c| escape(c.as_ref(), delimiter))
    .collect::<Vec<_>>()
    .join(&delimiter.to_string());
  out.push_str(&line);
  out.push('\n');
}

pub fn to_delimited(table: &Table, delimiter: char) -> String {
  let mut out = String::new();

  let header = table.group_columns().iter().chain(table.measure_columns()).copied();
  push_line(&mut out, header, delimiter);

  for row in table.rows() {
    let cells = row
      .keys
      .iter()
      .cloned()
      .chain(row.values.iter().map(|v| v.to_string()));
    push_line(&mut out, cells, delimiter);
  }

  out
}

pub fn to_csv(table: &Table) -> String {
  to_delimited(table, ',')
}

/// Write `text` to `out`; "-" means stdout.
pub fn write_output(out: &str, text: &str) -> Result<()> {
  if out == STDOUT {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(text.as_bytes())?;
    lock.flush()?;
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, text)?;

  Ok(())
}
