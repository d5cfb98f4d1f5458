//! This library implements the experiment batch pipeline behind `marqetsim`.
//!
//! Programming interface is centered around three structures. An
//! [`ExperimentConfig`] is loaded and validated from a manifest file. It is
//! handed to the run orchestrator, which invokes an external simulation
//! engine once per configured agent variant and persists each run as a csv
//! result file, collecting per-variant outcomes into a [`BatchReport`].
//! Result files are later read back and aggregated into a [`SummaryReport`].
//!
//! # Engine boundary
//!
//! By itself, this library does not run any simulation. The engine is
//! reached exclusively through the one-method [`Engine`] trait, which takes
//! per-variant [`RunParams`] and returns observation rows. The `marqetsim`
//! command line tool provides an implementation that shells out to an
//! external simulator; tests substitute an in-memory double.
//!
//! ## Example
//!
//! ```ignore
//! use marqetsim_core::{run, ExperimentConfig, Settings};
//!
//! let config = ExperimentConfig::from_path("insights.yaml")?;
//! let settings = Settings::discover(config.dir())?;
//! let report = run::run_batch(&config, &mut engine, &settings)?;
//! println!("{}", report);
//! ```
//!
//! [`ExperimentConfig`]: experiment/struct.ExperimentConfig.html
//! [`BatchReport`]: run/struct.BatchReport.html
//! [`SummaryReport`]: summary/struct.SummaryReport.html
//! [`Engine`]: engine/trait.Engine.html
//! [`RunParams`]: engine/struct.RunParams.html

#![allow(unused)]

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use engine::{Engine, RunParams};
pub use error::{Error, Result};
pub use experiment::{AgentSpec, ExperimentConfig};
pub use result::RunResult;
pub use run::{run_batch, BatchReport};
pub use settings::Settings;
pub use summary::SummaryReport;
pub use value::Value;

pub mod engine;
pub mod error;
pub mod experiment;
pub mod result;
pub mod run;
pub mod settings;
pub mod summary;
pub mod value;

mod util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

/// File extension used for persisted run results.
pub const RESULT_FILE_EXTENSION: &str = "csv";
/// Name of the optional process-level settings file.
pub const SETTINGS_FILE: &str = "marqetsim.toml";
/// Output directory used when the manifest doesn't name one.
pub const DEFAULT_OUTPUT_DIR: &str = "results";
/// Label of the fallback persona used when no agents are configured.
pub const DEFAULT_PERSONA: &str = "default";

/// Floating point number type used throughout the library.
pub type Float = f64;
/// Integer number type used throughout the library.
pub type Int = i64;

/// Single observation row as returned by the engine, ordered by column.
pub type Record = linked_hash_map::LinkedHashMap<String, Value>;
