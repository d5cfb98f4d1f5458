//! Engine implementation shelling out to an external simulator command.
//!
//! The command is named in the `[engine]` section of `marqetsim.toml`. It is
//! invoked once per variant with the variant parameters as arguments and
//! environment variables, and is expected to print its observation rows as
//! csv (header first) on stdout.

use std::process::Command;

use marqetsim::engine::{Engine, RunParams};
use marqetsim::error::Error;
use marqetsim::experiment::AgentSpec;
use marqetsim::result::RunResult;
use marqetsim::{Record, Result, Settings};

pub struct CommandEngine {
    command: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<CommandEngine> {
        let command = settings.engine.command.clone().ok_or_else(|| {
            anyhow::Error::msg(
                "no engine command configured, set [engine] command in marqetsim.toml",
            )
        })?;
        Ok(CommandEngine {
            command,
            args: settings.engine.args.clone(),
        })
    }

    #[cfg(test)]
    fn new(command: &str, args: Vec<String>) -> CommandEngine {
        CommandEngine {
            command: command.to_string(),
            args,
        }
    }
}

impl Engine for CommandEngine {
    fn execute(&mut self, params: &RunParams) -> Result<Vec<Record>> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--experiment")
            .arg(&params.experiment)
            .arg("--variant")
            .arg(&params.variant)
            .env("MARQETSIM_SITUATION", &params.situation)
            .env("MARQETSIM_REQUEST", &params.request);
        match &params.agents {
            AgentSpec::Count(n) => {
                cmd.arg("--agents").arg(n.to_string());
            }
            AgentSpec::ProfileFile(path) => {
                cmd.arg("--agent-file").arg(path);
            }
            AgentSpec::Profile(map) => {
                for (key, value) in map {
                    cmd.arg("--define").arg(format!("{}={}", key, value));
                }
            }
            AgentSpec::Default => (),
        }

        debug!(
            "invoking engine \"{}\" for variant \"{}\"",
            self.command, params.variant
        );
        let output = cmd.output().map_err(|e| {
            Error::EngineFailure(format!("failed to spawn \"{}\": {}", self.command, e))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::EngineFailure(format!(
                "\"{}\" exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = RunResult::from_csv_str(&format!("{} stdout", self.command), &stdout)?;
        Ok(result.to_records())
    }
}

#[cfg(test)]
fn test_params(agents: AgentSpec) -> RunParams {
    RunParams {
        experiment: "test".to_string(),
        variant: agents.label(),
        situation: "s".to_string(),
        request: "q".to_string(),
        agents,
        settings: Settings::default(),
    }
}

#[cfg(unix)]
#[test]
fn command_engine_parses_stdout() {
    let mut engine = CommandEngine::new(
        "sh",
        vec!["-c".to_string(), "printf 'agent,response\\nana,1\\n'".to_string()],
    );
    let records = engine.execute(&test_params(AgentSpec::Count(1))).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("response"), Some(&marqetsim::Value::Int(1)));
}

#[cfg(unix)]
#[test]
fn failing_command_is_an_engine_failure() {
    let mut engine = CommandEngine::new("false", vec![]);
    assert!(matches!(
        engine.execute(&test_params(AgentSpec::Default)),
        Err(Error::EngineFailure(_))
    ));
}

#[test]
fn missing_command_is_an_engine_failure() {
    let mut engine = CommandEngine::new("marqetsim-no-such-engine", vec![]);
    assert!(matches!(
        engine.execute(&test_params(AgentSpec::Default)),
        Err(Error::EngineFailure(_))
    ));
}
