//! Contains structs used for procedural deserialization.
//!
//! Note: several manifest fields accept more than one shape. An option can
//! be a bare string or a mapping with a `content` key, and an agent entry
//! can be a count, a profile-file path or an inline profile mapping. Serde
//! untagged enums carry that flexibility; the structs here stay permissive
//! and proper validation happens when turning them into an
//! `ExperimentConfig`.

use linked_hash_map::LinkedHashMap;

use crate::value::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentManifest {
    // required (checked during validation, not deserialization, so that
    // every missing field gets reported with its name)
    pub experiment: Option<String>,
    pub situation: Option<String>,
    pub questions: Option<String>,
    pub options: Option<Vec<OptionEntry>>,

    // optional
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    pub output_dir: Option<String>,
}

/// Advertisement option as found in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionEntry {
    Plain(String),
    Mapping { content: String },
}

impl OptionEntry {
    pub fn content(&self) -> &str {
        match self {
            OptionEntry::Plain(s) => s,
            OptionEntry::Mapping { content } => content,
        }
    }
}

/// Agent definition as found in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentEntry {
    Count(u64),
    ProfileFile(String),
    Profile(LinkedHashMap<String, Value>),
}
