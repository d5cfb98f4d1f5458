//! Aggregation of persisted run results into a summary report.

use std::fs;
use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;

use crate::error::Error;
use crate::result::RunResult;
use crate::value::Value;
use crate::{Float, Result};

/// Per-column aggregate over one or more result tables.
///
/// A column is numeric when every present cell carries a numeric value, and
/// gets an arithmetic mean; otherwise it is categorical and gets a frequency
/// table. Missing cells are excluded from the mean and surfaced in the
/// `missing` count, never silently treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Mean {
        mean: Float,
        present: usize,
        missing: usize,
    },
    Freq {
        counts: LinkedHashMap<String, usize>,
        missing: usize,
    },
}

/// Aggregate statistics over one or more result files.
///
/// Never an input to further runs; created on demand from persisted results
/// and written out as yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Result tables that went into the report.
    pub inputs: Vec<String>,
    /// Total observation count across all inputs.
    pub rows: usize,
    /// Aggregates keyed by column name, in first-input column order.
    pub columns: LinkedHashMap<String, Aggregate>,
}

impl SummaryReport {
    /// Reads the given result files and aggregates them. All inputs must
    /// agree on the column set; a mismatch fails the whole call.
    pub fn from_paths(paths: &[PathBuf]) -> Result<SummaryReport> {
        let mut results = Vec::new();
        for path in paths {
            results.push(RunResult::from_path(path)?);
        }
        SummaryReport::from_results(&results)
    }

    pub fn from_results(results: &[RunResult]) -> Result<SummaryReport> {
        let first = match results.first() {
            Some(f) => f,
            None => return Err(Error::NoInputFiles),
        };

        // schema consistency is checked up front, aggregation never
        // reconciles differing column sets
        let schema = first.column_set();
        for result in &results[1..] {
            if result.column_set() != schema {
                return Err(Error::SchemaMismatch(
                    first.source.clone(),
                    schema,
                    result.source.clone(),
                    result.column_set(),
                ));
            }
        }

        let rows = results.iter().map(|r| r.row_count()).sum();

        let mut columns = LinkedHashMap::new();
        for column in &first.columns {
            columns.insert(column.clone(), aggregate_column(column, results)?);
        }

        Ok(SummaryReport {
            inputs: results.iter().map(|r| r.source.clone()).collect(),
            rows,
            columns,
        })
    }

    /// Writes the report as yaml at the given path, overwriting any
    /// existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn aggregate_column(column: &str, results: &[RunResult]) -> Result<Aggregate> {
    let mut present: Vec<&Value> = Vec::new();
    let mut missing = 0;

    for result in results {
        let idx = result
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::Other(format!("column lookup failed: {}", column)))?;
        for row in &result.rows {
            match &row[idx] {
                Some(v) => present.push(v),
                None => missing += 1,
            }
        }
    }

    if !present.is_empty() && present.iter().all(|v| v.is_numeric()) {
        let sum: Float = present.iter().filter_map(|v| v.as_float()).sum();
        return Ok(Aggregate::Mean {
            mean: sum / present.len() as Float,
            present: present.len(),
            missing,
        });
    }

    let mut counts: LinkedHashMap<String, usize> = LinkedHashMap::new();
    for value in &present {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    // most frequent first, ties keep first-seen order
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(Aggregate::Freq {
        counts: entries.into_iter().collect(),
        missing,
    })
}

#[cfg(test)]
fn result_from_csv(name: &str, text: &str) -> RunResult {
    let dir = std::env::temp_dir().join("marqetsim_tests").join("summary");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    RunResult::from_path(&path).unwrap()
}

#[test]
fn summary_counts_all_rows() {
    let a = result_from_csv("count_a.csv", "response,score\nyes,1\nno,2\n");
    let b = result_from_csv("count_b.csv", "response,score\nyes,3\n");
    let report = SummaryReport::from_results(&[a, b]).unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(
        report.columns.get("score"),
        Some(&Aggregate::Mean {
            mean: 2.0,
            present: 3,
            missing: 0
        })
    );
}

#[test]
fn schema_mismatch_is_fatal() {
    let a = result_from_csv("schema_a.csv", "response,score\nyes,1\n");
    let b = result_from_csv("schema_b.csv", "response,rating\nyes,1\n");
    assert!(matches!(
        SummaryReport::from_results(&[a, b]),
        Err(Error::SchemaMismatch(..))
    ));
}

#[test]
fn column_order_does_not_matter() {
    let a = result_from_csv("order_a.csv", "response,score\nyes,1\n");
    let b = result_from_csv("order_b.csv", "score,response\n2,no\n");
    let report = SummaryReport::from_results(&[a, b]).unwrap();
    assert_eq!(report.rows, 2);
    assert_eq!(
        report.columns.get("score"),
        Some(&Aggregate::Mean {
            mean: 1.5,
            present: 2,
            missing: 0
        })
    );
}

#[test]
fn missing_cells_excluded_from_mean() {
    let a = result_from_csv("gaps.csv", "score\n1\n\n2\n");
    let report = SummaryReport::from_results(&[a]).unwrap();
    assert_eq!(
        report.columns.get("score"),
        Some(&Aggregate::Mean {
            mean: 1.5,
            present: 2,
            missing: 1
        })
    );
}

#[test]
fn categorical_column_gets_frequency_table() {
    let a = result_from_csv(
        "freq.csv",
        "response\noption-2\noption-1\noption-2\noption-3\noption-2\noption-1\n",
    );
    let report = SummaryReport::from_results(&[a]).unwrap();
    match report.columns.get("response").unwrap() {
        Aggregate::Freq { counts, missing } => {
            let entries: Vec<(&String, &usize)> = counts.iter().collect();
            assert_eq!(entries[0], (&"option-2".to_string(), &3));
            assert_eq!(entries[1], (&"option-1".to_string(), &2));
            assert_eq!(entries[2], (&"option-3".to_string(), &1));
            assert_eq!(*missing, 0);
        }
        other => panic!("expected frequency aggregate, got: {:?}", other),
    }
}

#[test]
fn mixed_values_fall_back_to_categorical() {
    let a = result_from_csv("mixed.csv", "score\n1\nn/a\n2\n");
    let report = SummaryReport::from_results(&[a]).unwrap();
    assert!(matches!(
        report.columns.get("score"),
        Some(Aggregate::Freq { .. })
    ));
}

#[test]
fn report_written_as_yaml() {
    let a = result_from_csv("write.csv", "response\nyes\n");
    let report = SummaryReport::from_results(&[a]).unwrap();
    let path = std::env::temp_dir()
        .join("marqetsim_tests")
        .join("summary")
        .join("report.yaml");
    report.write(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("rows: 1"));
    assert!(text.contains("response"));
}
