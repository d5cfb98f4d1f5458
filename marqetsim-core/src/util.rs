//! Contains a collection of useful utility functions.

use std::fs::{read, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// Reads a file at the given path to a String.
pub fn read_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    Ok(s)
}

/// Create a static deser object from given path using serde. Format is
/// chosen based on the file extension.
pub fn deser_struct_from_path<T>(file_path: PathBuf) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let bytes = read(file_path.clone())?;
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let d: T = match ext {
        "toml" => toml::from_slice(&bytes)?,
        "yaml" | "yml" => serde_yaml::from_slice(&bytes)?,
        _ => {
            return Err(Error::UnsupportedManifestFormat(
                file_path.to_string_lossy().to_string(),
            ))
        }
    };
    Ok(d)
}

/// Get a similar name based on string similarity.
pub fn get_similar(original: &str, candidates: &[&str]) -> Option<String> {
    use strsim::normalized_damerau_levenshtein;
    let mut highest_sim = 0f64;
    let mut best = candidates[0];
    for candidate in candidates {
        let j = normalized_damerau_levenshtein(candidate, original);
        if j > highest_sim {
            highest_sim = j;
            best = candidate;
        }
    }
    if highest_sim > 0.4f64 {
        Some(best.to_owned())
    } else {
        None
    }
}

#[test]
fn similar_name() {
    let known = ["situation", "options", "questions", "agents"];
    assert_eq!(get_similar("questins", &known), Some("questions".to_string()));
    assert_eq!(get_similar("xyzzy", &known), None);
}
