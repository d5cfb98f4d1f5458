//! Experiment manifest definitions, logic for turning deserialized data
//! into a validated configuration.

mod deser;

use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;

use crate::error::Error;
use crate::util;
use crate::value::Value;
use crate::{Result, DEFAULT_OUTPUT_DIR, DEFAULT_PERSONA};

/// Top-level fields a manifest is allowed to carry.
const KNOWN_FIELDS: &[&str] = &[
    "experiment",
    "situation",
    "questions",
    "options",
    "agents",
    "output_dir",
];

/// Validated experiment configuration.
///
/// Created from a manifest file, read-only afterwards. Validation is
/// all-or-nothing: any missing or malformed field fails the load and no run
/// is ever attempted with a partially valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Name of, and unique reference to, the experiment. Used to derive
    /// result file names.
    pub name: String,
    /// Situation text establishing the context agents act in.
    pub situation: String,
    /// Question text put to every agent.
    pub questions: String,
    /// Advertisement option contents, in manifest order.
    pub options: Vec<String>,
    /// Agent variants, one engine run each.
    pub agents: Vec<AgentSpec>,
    /// Directory result files are written to.
    pub output_dir: PathBuf,
    /// Full path to the manifest this config was loaded from.
    pub path: PathBuf,
}

impl ExperimentConfig {
    /// Creates a new experiment configuration from a manifest at the given
    /// path. Accepts yaml and toml manifests.
    pub fn from_path(path: PathBuf) -> Result<ExperimentConfig> {
        let path = dunce::canonicalize(&path).unwrap_or(path);
        let text = util::read_file(&path)?;

        // reject unknown top-level keys before deserializing into the
        // manifest struct, so typos come back with a suggestion
        for key in manifest_keys(&path, &text)? {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                let suggestion = match util::get_similar(&key, KNOWN_FIELDS) {
                    Some(s) => format!(", did you mean \"{}\"?", s),
                    None => String::new(),
                };
                return Err(Error::UnknownField(key, suggestion));
            }
        }

        let manifest: deser::ExperimentManifest = deser_from_str(&path, &text)?;
        ExperimentConfig::from_manifest(manifest, path)
    }

    fn from_manifest(
        manifest: deser::ExperimentManifest,
        path: PathBuf,
    ) -> Result<ExperimentConfig> {
        let name = match manifest.experiment {
            Some(n) => n.trim().to_string(),
            None => return Err(Error::MissingField("experiment")),
        };
        if name.is_empty() {
            return Err(Error::InvalidField("experiment", "must not be empty".into()));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidField(
                "experiment",
                format!("\"{}\" must not contain path separators", name),
            ));
        }

        let situation = match manifest.situation {
            Some(s) if !s.trim().is_empty() => s,
            Some(_) => return Err(Error::InvalidField("situation", "must not be empty".into())),
            None => return Err(Error::MissingField("situation")),
        };
        let questions = match manifest.questions {
            Some(q) if !q.trim().is_empty() => q,
            Some(_) => return Err(Error::InvalidField("questions", "must not be empty".into())),
            None => return Err(Error::MissingField("questions")),
        };

        let option_entries = match manifest.options {
            Some(o) => o,
            None => return Err(Error::MissingField("options")),
        };
        if option_entries.is_empty() {
            return Err(Error::InvalidField("options", "must not be empty".into()));
        }
        let mut options = Vec::new();
        for (n, entry) in option_entries.iter().enumerate() {
            let content = entry.content();
            if content.trim().is_empty() {
                return Err(Error::InvalidField(
                    "options",
                    format!("option {} has empty content", n + 1),
                ));
            }
            options.push(content.to_string());
        }

        let manifest_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut agents = Vec::new();
        for entry in manifest.agents {
            agents.push(AgentSpec::from_entry(entry, &manifest_dir)?);
        }
        if agents.is_empty() {
            debug!("no agents configured, falling back to the default persona");
            agents.push(AgentSpec::Default);
        }

        let output_dir = match manifest.output_dir {
            Some(dir) => {
                let dir = PathBuf::from(dir);
                if dir.is_relative() {
                    manifest_dir.join(dir)
                } else {
                    dir
                }
            }
            None => manifest_dir.join(DEFAULT_OUTPUT_DIR),
        };

        Ok(ExperimentConfig {
            name,
            situation,
            questions,
            options,
            agents,
            output_dir,
            path,
        })
    }

    /// Directory the manifest lives in.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Assembles the request message put to every agent: the question text
    /// followed by the numbered option contents.
    pub fn request_msg(&self) -> String {
        let merged = self
            .options
            .iter()
            .enumerate()
            .map(|(n, content)| format!("#option-{} {}", n + 1, content))
            .collect::<Vec<String>>()
            .join("\n\n");
        format!("{}\n{}", self.questions, merged)
    }
}

/// One configured agent variant within an experiment batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentSpec {
    /// Engine generates the given number of personas.
    Count(u64),
    /// Engine loads personas from a csv profile file.
    ProfileFile(PathBuf),
    /// Single persona defined inline in the manifest.
    Profile(LinkedHashMap<String, Value>),
    /// Built-in fallback persona.
    Default,
}

impl AgentSpec {
    fn from_entry(entry: deser::AgentEntry, manifest_dir: &Path) -> Result<AgentSpec> {
        let spec = match entry {
            deser::AgentEntry::Count(n) => {
                if n == 0 {
                    return Err(Error::InvalidField(
                        "agents",
                        "agent count must be positive".into(),
                    ));
                }
                AgentSpec::Count(n)
            }
            deser::AgentEntry::ProfileFile(file) => {
                let mut file_path = PathBuf::from(&file);
                if file_path.is_relative() {
                    file_path = manifest_dir.join(file_path);
                }
                if !file_path.is_file() {
                    return Err(Error::AgentFileNotFound(
                        file_path.to_string_lossy().to_string(),
                    ));
                }
                AgentSpec::ProfileFile(file_path)
            }
            deser::AgentEntry::Profile(map) => {
                if map.is_empty() {
                    return Err(Error::InvalidField(
                        "agents",
                        "inline profile must not be empty".into(),
                    ));
                }
                AgentSpec::Profile(map)
            }
        };
        Ok(spec)
    }

    /// Short label identifying the variant, used in result file names.
    pub fn label(&self) -> String {
        match self {
            AgentSpec::Count(n) => n.to_string(),
            AgentSpec::ProfileFile(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "profiles".to_string()),
            AgentSpec::Profile(map) => match map.get("name") {
                Some(name) => name.to_string(),
                None => "profile".to_string(),
            },
            AgentSpec::Default => DEFAULT_PERSONA.to_string(),
        }
    }
}

/// Lists top-level keys of the manifest without interpreting the values.
fn manifest_keys(path: &Path, text: &str) -> Result<Vec<String>> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let keys = match ext {
        "toml" => toml::from_str::<LinkedHashMap<String, toml::Value>>(text)?
            .keys()
            .cloned()
            .collect(),
        "yaml" | "yml" => serde_yaml::from_str::<LinkedHashMap<String, serde_yaml::Value>>(text)?
            .keys()
            .cloned()
            .collect(),
        _ => {
            return Err(Error::UnsupportedManifestFormat(
                path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(keys)
}

fn deser_from_str<T>(path: &Path, text: &str) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let d: T = match ext {
        "toml" => toml::from_str(text)?,
        "yaml" | "yml" => serde_yaml::from_str(text)?,
        _ => {
            return Err(Error::UnsupportedManifestFormat(
                path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(d)
}

#[cfg(test)]
fn write_manifest(name: &str, text: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("marqetsim_tests").join("manifests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn config_from_yaml_manifest() {
    let path = write_manifest(
        "full.yaml",
        r#"
experiment: insights
situation: "You are browsing a travel site."
questions: "Which ad would you click?"
options:
  - content: "Cheap flights to Bali"
  - "All-inclusive Lisbon weekend"
agents: [5, 10]
output_dir: out
"#,
    );
    let config = ExperimentConfig::from_path(path).unwrap();
    assert_eq!(config.name, "insights");
    assert_eq!(config.situation, "You are browsing a travel site.");
    assert_eq!(config.options.len(), 2);
    assert_eq!(config.options[1], "All-inclusive Lisbon weekend");
    assert_eq!(
        config.agents,
        vec![AgentSpec::Count(5), AgentSpec::Count(10)]
    );
    assert!(config.output_dir.ends_with("out"));
}

#[test]
fn config_from_toml_manifest() {
    let path = write_manifest(
        "full.toml",
        r#"
experiment = "insights"
situation = "You are browsing a travel site."
questions = "Which ad would you click?"
options = ["Cheap flights to Bali"]
agents = [3]
"#,
    );
    let config = ExperimentConfig::from_path(path).unwrap();
    assert_eq!(config.agents, vec![AgentSpec::Count(3)]);
    assert!(config.output_dir.ends_with(DEFAULT_OUTPUT_DIR));
}

#[test]
fn missing_required_field() {
    let path = write_manifest(
        "missing_situation.yaml",
        "experiment: x\nquestions: q\noptions: [a]\n",
    );
    match ExperimentConfig::from_path(path) {
        Err(Error::MissingField(field)) => assert_eq!(field, "situation"),
        other => panic!("expected missing field error, got: {:?}", other),
    }
}

#[test]
fn unknown_field_gets_suggestion() {
    let path = write_manifest(
        "typo.yaml",
        "experiment: x\nsituation: s\nquestins: q\noptions: [a]\n",
    );
    match ExperimentConfig::from_path(path) {
        Err(Error::UnknownField(field, suggestion)) => {
            assert_eq!(field, "questins");
            assert!(suggestion.contains("questions"));
        }
        other => panic!("expected unknown field error, got: {:?}", other),
    }
}

#[test]
fn zero_agent_count_rejected() {
    let path = write_manifest(
        "zero_agents.yaml",
        "experiment: x\nsituation: s\nquestions: q\noptions: [a]\nagents: [0]\n",
    );
    assert!(matches!(
        ExperimentConfig::from_path(path),
        Err(Error::InvalidField("agents", _))
    ));
}

#[test]
fn default_persona_when_no_agents() {
    let path = write_manifest(
        "no_agents.yaml",
        "experiment: x\nsituation: s\nquestions: q\noptions: [a]\n",
    );
    let config = ExperimentConfig::from_path(path).unwrap();
    assert_eq!(config.agents, vec![AgentSpec::Default]);
    assert_eq!(config.agents[0].label(), DEFAULT_PERSONA);
}

#[test]
fn missing_profile_file_rejected() {
    let path = write_manifest(
        "missing_profiles.yaml",
        "experiment: x\nsituation: s\nquestions: q\noptions: [a]\nagents: [no_such_profiles.csv]\n",
    );
    assert!(matches!(
        ExperimentConfig::from_path(path),
        Err(Error::AgentFileNotFound(_))
    ));
}

#[test]
fn request_msg_numbers_options() {
    let path = write_manifest(
        "request.yaml",
        "experiment: x\nsituation: s\nquestions: \"Pick one.\"\noptions: [first, second]\n",
    );
    let config = ExperimentConfig::from_path(path).unwrap();
    assert_eq!(
        config.request_msg(),
        "Pick one.\n#option-1 first\n\n#option-2 second"
    );
}
