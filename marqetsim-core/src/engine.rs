//! External simulation engine boundary.
//!
//! The engine is the only outward call this library makes: execute a
//! simulation given per-variant parameters, get observation rows back. What
//! happens behind that call (agent modeling, persona generation, the actual
//! market simulation) is entirely the engine's business.

use crate::experiment::{AgentSpec, ExperimentConfig};
use crate::settings::Settings;
use crate::{Record, Result};

/// Capability to execute one simulation run.
pub trait Engine {
    /// Executes a single run, blocking until the engine returns. Every row
    /// of the returned batch is expected to share one column set.
    fn execute(&mut self, params: &RunParams) -> Result<Vec<Record>>;
}

/// Flattened per-variant parameters handed to the engine.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Experiment name.
    pub experiment: String,
    /// Variant label within the batch.
    pub variant: String,
    /// Situation text establishing agent context.
    pub situation: String,
    /// Request message: questions plus numbered options.
    pub request: String,
    /// Agent variant to instantiate.
    pub agents: AgentSpec,
    /// Process-level settings forwarded to the engine.
    pub settings: Settings,
}

impl RunParams {
    /// Builds engine parameters for one variant of the given experiment.
    pub fn for_variant(
        config: &ExperimentConfig,
        agents: &AgentSpec,
        settings: &Settings,
    ) -> RunParams {
        RunParams {
            experiment: config.name.clone(),
            variant: agents.label(),
            situation: config.situation.clone(),
            request: config.request_msg(),
            agents: agents.clone(),
            settings: settings.clone(),
        }
    }
}
