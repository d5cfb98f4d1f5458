//! Batch orchestration: one engine run per configured variant.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::engine::{Engine, RunParams};
use crate::experiment::{AgentSpec, ExperimentConfig};
use crate::result::RunResult;
use crate::settings::Settings;
use crate::{Result, RESULT_FILE_EXTENSION};

/// Runs the full batch for the given experiment, one synchronous engine
/// invocation per variant.
///
/// A failing variant is recorded and the batch moves on; only failures
/// outside any single variant (e.g. the output directory cannot be created)
/// abort the batch. No retries are performed, engine failures are assumed
/// non-transient in this workflow.
pub fn run_batch(
    config: &ExperimentConfig,
    engine: &mut dyn Engine,
    settings: &Settings,
) -> Result<BatchReport> {
    fs::create_dir_all(&config.output_dir)?;

    let mut report = BatchReport {
        experiment: config.name.clone(),
        started: Utc::now(),
        outcomes: Vec::new(),
    };

    for agents in &config.agents {
        let variant = agents.label();
        info!("running variant \"{}\" of \"{}\"", variant, config.name);
        let status = match run_variant(config, engine, agents, settings) {
            Ok((path, rows)) => {
                info!(
                    "variant \"{}\" completed, {} rows -> {}",
                    variant,
                    rows,
                    path.to_string_lossy()
                );
                VariantStatus::Completed { path, rows }
            }
            Err(e) => {
                warn!("variant \"{}\" failed: {}", variant, e);
                VariantStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        report.outcomes.push(VariantOutcome { variant, status });
    }

    Ok(report)
}

fn run_variant(
    config: &ExperimentConfig,
    engine: &mut dyn Engine,
    agents: &AgentSpec,
    settings: &Settings,
) -> Result<(PathBuf, usize)> {
    let params = RunParams::for_variant(config, agents, settings);
    let records = engine.execute(&params)?;
    let result = RunResult::from_records(&params.variant, records)?;
    let path = config
        .output_dir
        .join(result_file_name(&config.name, &params.variant));
    result.write(&path)?;
    Ok((path, result.row_count()))
}

/// Deterministic result file name for an experiment variant. Repeated runs
/// land on the same path and overwrite.
pub fn result_file_name(experiment: &str, variant: &str) -> String {
    format!("{}-{}.{}", experiment, variant, RESULT_FILE_EXTENSION)
}

/// Outcome listing for one batch invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub experiment: String,
    pub started: DateTime<Utc>,
    pub outcomes: Vec<VariantOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub variant: String,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VariantStatus {
    Completed { path: PathBuf, rows: usize },
    Failed { reason: String },
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, VariantStatus::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Paths of all result files written during the batch.
    pub fn result_paths(&self) -> Vec<PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                VariantStatus::Completed { path, .. } => Some(path.clone()),
                VariantStatus::Failed { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "experiment \"{}\": {} variants, {} completed, {} failed",
            self.experiment,
            self.outcomes.len(),
            self.completed(),
            self.failed()
        )?;
        for outcome in &self.outcomes {
            match &outcome.status {
                VariantStatus::Completed { path, rows } => writeln!(
                    f,
                    "   {}: ok, {} rows -> {}",
                    outcome.variant,
                    rows,
                    path.to_string_lossy()
                )?,
                VariantStatus::Failed { reason } => {
                    writeln!(f, "   {}: failed: {}", outcome.variant, reason)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::{Record, Value};

#[cfg(test)]
struct DummyEngine {
    fail: Vec<String>,
}

#[cfg(test)]
impl Engine for DummyEngine {
    fn execute(&mut self, params: &RunParams) -> Result<Vec<Record>> {
        if self.fail.contains(&params.variant) {
            return Err(crate::error::Error::EngineFailure("boom".to_string()));
        }
        let mut record = Record::new();
        record.insert("agent".to_string(), Value::String(params.variant.clone()));
        record.insert("response".to_string(), Value::Int(1));
        Ok(vec![record.clone(), record])
    }
}

#[cfg(test)]
fn test_config(name: &str, agents: Vec<AgentSpec>) -> ExperimentConfig {
    let output_dir = std::env::temp_dir()
        .join("marqetsim_tests")
        .join("runs")
        .join(name);
    // start from a clean slate, earlier test runs may have left files
    let _ = std::fs::remove_dir_all(&output_dir);
    ExperimentConfig {
        name: name.to_string(),
        situation: "s".to_string(),
        questions: "q".to_string(),
        options: vec!["a".to_string()],
        agents,
        output_dir,
        path: PathBuf::from("test.yaml"),
    }
}

#[test]
fn batch_continues_past_failed_variant() {
    let _ = simplelog::SimpleLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
    );
    let config = test_config(
        "insights",
        vec![
            AgentSpec::Count(5),
            AgentSpec::Count(10),
            AgentSpec::Count(3),
        ],
    );
    let mut engine = DummyEngine {
        fail: vec!["10".to_string()],
    };
    let report = run_batch(&config, &mut engine, &Settings::default()).unwrap();

    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(config.output_dir.join("insights-5.csv").is_file());
    assert!(!config.output_dir.join("insights-10.csv").exists());
    assert!(config.output_dir.join("insights-3.csv").is_file());
}

#[test]
fn rerun_overwrites_result_files() {
    let config = test_config("rerun", vec![AgentSpec::Count(2)]);
    let mut engine = DummyEngine { fail: vec![] };
    run_batch(&config, &mut engine, &Settings::default()).unwrap();
    run_batch(&config, &mut engine, &Settings::default()).unwrap();

    let entries: Vec<_> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn result_file_naming() {
    assert_eq!(result_file_name("insights", "5"), "insights-5.csv");
    assert_eq!(
        result_file_name("insights", crate::DEFAULT_PERSONA),
        "insights-default.csv"
    );
}
