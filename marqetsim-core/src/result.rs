//! Run result tables and their csv persistence.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::value::Value;
use crate::{Record, Result};

/// Ordered observation rows produced by one engine run.
///
/// All rows share one column set. Missing cells (empty csv fields) are kept
/// as explicit gaps rather than coerced to a default.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Column names in table order.
    pub columns: Vec<String>,
    /// One entry per observation, cells aligned with `columns`.
    pub rows: Vec<Vec<Option<Value>>>,
    /// Where the table came from, used in error messages.
    pub source: String,
}

impl RunResult {
    /// Builds a result table from engine records, enforcing that every row
    /// carries the same column set.
    pub fn from_records(source: &str, records: Vec<Record>) -> Result<RunResult> {
        let first = match records.first() {
            Some(f) => f,
            None => {
                return Err(Error::EngineFailure(format!(
                    "{}: engine returned no rows",
                    source
                )))
            }
        };
        let columns: Vec<String> = first.keys().cloned().collect();

        let mut rows = Vec::new();
        for (n, record) in records.iter().enumerate() {
            if record.len() != columns.len()
                || !columns.iter().all(|c| record.contains_key(c))
            {
                return Err(Error::InconsistentRows(format!(
                    "{}: row {} has columns {:?}, expected {:?}",
                    source,
                    n + 1,
                    record.keys().collect::<Vec<&String>>(),
                    columns
                )));
            }
            rows.push(columns.iter().map(|c| record.get(c).cloned()).collect());
        }

        Ok(RunResult {
            columns,
            rows,
            source: source.to_string(),
        })
    }

    /// Reads a result table from a csv file, first row as header.
    pub fn from_path(path: &Path) -> Result<RunResult> {
        let source = path.to_string_lossy().to_string();
        let text = fs::read_to_string(path)?;
        RunResult::from_csv_str(&source, &text)
    }

    /// Parses csv text into a result table, first row as header. `source`
    /// names where the text came from, for error messages.
    pub fn from_csv_str(source: &str, text: &str) -> Result<RunResult> {
        let source = source.to_string();
        let mut records = parse_csv(&source, text)?;
        // drop blank lines, they carry no cells
        records.retain(|r| !(r.len() == 1 && r[0].is_empty()));

        if records.is_empty() {
            return Err(Error::EmptyResultFile(source));
        }
        let columns = records.remove(0);

        let mut rows = Vec::new();
        for (n, record) in records.iter().enumerate() {
            if record.len() != columns.len() {
                return Err(Error::MalformedResultFile(
                    source,
                    n + 1,
                    record.len(),
                    columns.len(),
                ));
            }
            rows.push(record.iter().map(|cell| Value::from_csv_cell(cell)).collect());
        }

        Ok(RunResult {
            columns,
            rows,
            source,
        })
    }

    /// Writes the table as csv at the given path, overwriting any existing
    /// file. Parent directories are created as needed.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        write_record(&mut out, self.columns.iter().map(|c| c.as_str()));
        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    Some(v) => v.to_string(),
                    None => String::new(),
                })
                .collect();
            write_record(&mut out, cells.iter().map(|c| c.as_str()));
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Turns the table back into engine-shaped records. Gaps become empty
    /// strings, which map back to gaps when written out as csv.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| {
                        let value = match cell {
                            Some(v) => v.clone(),
                            None => Value::String(String::new()),
                        };
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names as a sorted set, for schema comparison across tables.
    pub fn column_set(&self) -> Vec<String> {
        let mut set = self.columns.clone();
        set.sort();
        set
    }
}

fn write_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        first = false;
        if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

/// Minimal csv parser handling quoted fields, escaped quotes and embedded
/// newlines.
fn parse_csv(source: &str, text: &str) -> Result<Vec<Vec<String>>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => record.push(std::mem::replace(&mut field, String::new())),
                '\r' => (),
                '\n' => {
                    record.push(std::mem::replace(&mut field, String::new()));
                    records.push(std::mem::replace(&mut record, Vec::new()));
                }
                _ => field.push(c),
            }
        }
    }
    if in_quotes {
        return Err(Error::UnterminatedQuote(source.to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
fn result_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("marqetsim_tests").join("results");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[cfg(test)]
fn record(cells: &[(&str, Value)]) -> Record {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn result_roundtrip() {
    let records = vec![
        record(&[
            ("agent", Value::String("ana".into())),
            ("response", Value::Int(1)),
            ("confidence", Value::Float(0.8)),
        ]),
        record(&[
            ("agent", Value::String("bo, \"the\" bot".into())),
            ("response", Value::Int(2)),
            ("confidence", Value::Float(0.4)),
        ]),
    ];
    let result = RunResult::from_records("test", records).unwrap();
    let path = result_path("roundtrip.csv");
    result.write(&path).unwrap();

    let read_back = RunResult::from_path(&path).unwrap();
    assert_eq!(read_back.columns, result.columns);
    assert_eq!(read_back.rows, result.rows);
}

#[test]
fn inconsistent_engine_rows_rejected() {
    let records = vec![
        record(&[("a", Value::Int(1)), ("b", Value::Int(2))]),
        record(&[("a", Value::Int(1)), ("c", Value::Int(3))]),
    ];
    assert!(matches!(
        RunResult::from_records("test", records),
        Err(Error::InconsistentRows(_))
    ));
}

#[test]
fn ragged_file_detected() {
    let path = result_path("ragged.csv");
    std::fs::write(&path, "a,b,c\n1,2,3\n4,5\n").unwrap();
    match RunResult::from_path(&path) {
        Err(Error::MalformedResultFile(_, row, got, expected)) => {
            assert_eq!((row, got, expected), (2, 2, 3));
        }
        other => panic!("expected malformed result error, got: {:?}", other),
    }
}

#[test]
fn empty_file_detected() {
    let path = result_path("empty.csv");
    std::fs::write(&path, "").unwrap();
    assert!(matches!(
        RunResult::from_path(&path),
        Err(Error::EmptyResultFile(_))
    ));
}

#[test]
fn quoted_fields_parsed() {
    let path = result_path("quoted.csv");
    std::fs::write(&path, "a,b\n\"x,y\",\"he said \"\"hi\"\"\"\n\"multi\nline\",2\n").unwrap();
    let result = RunResult::from_path(&path).unwrap();
    assert_eq!(result.rows[0][0], Some(Value::String("x,y".into())));
    assert_eq!(
        result.rows[0][1],
        Some(Value::String("he said \"hi\"".into()))
    );
    assert_eq!(result.rows[1][0], Some(Value::String("multi\nline".into())));
}

#[test]
fn missing_cells_are_gaps() {
    let path = result_path("gaps.csv");
    std::fs::write(&path, "a,b\n1,\n,2\n").unwrap();
    let result = RunResult::from_path(&path).unwrap();
    assert_eq!(result.rows[0], vec![Some(Value::Int(1)), None]);
    assert_eq!(result.rows[1], vec![None, Some(Value::Int(2))]);
}
