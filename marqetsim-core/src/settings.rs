//! Process-level settings, layered from optional `marqetsim.toml` files.

use std::path::{Path, PathBuf};

use crate::util;
use crate::{Result, SETTINGS_FILE};

/// Settings shared by all runs of one invocation.
///
/// Looked up next to the experiment manifest first, then in the working
/// directory. Defaults apply when no settings file is found; a found file
/// only needs to name the values it overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineSettings,
}

/// How to reach the external simulation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Command to execute for each run.
    #[serde(default)]
    pub command: Option<String>,
    /// Fixed arguments prepended to every invocation.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Settings {
    /// Loads settings, checking the given directory first and falling back
    /// to the working directory, then to defaults.
    pub fn discover(manifest_dir: &Path) -> Result<Settings> {
        let mut candidates = vec![manifest_dir.join(SETTINGS_FILE)];
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(SETTINGS_FILE));
        }
        for candidate in candidates {
            if candidate.is_file() {
                debug!("using settings file: {}", candidate.to_string_lossy());
                return Settings::from_path(candidate);
            }
        }
        debug!("no settings file found, using defaults");
        Ok(Settings::default())
    }

    pub fn from_path(path: PathBuf) -> Result<Settings> {
        util::deser_struct_from_path(path)
    }
}

#[test]
fn settings_default_when_absent() {
    let dir = std::env::temp_dir().join("marqetsim_tests").join("no_settings");
    std::fs::create_dir_all(&dir).unwrap();
    let settings = Settings::discover(&dir).unwrap();
    assert!(settings.engine.command.is_none());
}

#[test]
fn settings_from_file() {
    let dir = std::env::temp_dir().join("marqetsim_tests").join("settings");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(SETTINGS_FILE);
    std::fs::write(&path, "[engine]\ncommand = \"troupe-sim\"\nargs = [\"--batch\"]\n").unwrap();
    let settings = Settings::from_path(path).unwrap();
    assert_eq!(settings.engine.command.as_deref(), Some("troupe-sim"));
    assert_eq!(settings.engine.args, vec!["--batch".to_string()]);
}
