use std::fs;
use std::path::PathBuf;

use anyhow::{Error, Result};

use marqetsim::RESULT_FILE_EXTENSION;

/// Expands the given paths into a flat list of result files. Directories
/// contribute every csv file they contain, sorted by name.
pub(crate) fn collect_result_paths(inputs: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut dir_paths = Vec::new();
            for entry in fs::read_dir(&input)? {
                let entry_path = entry?.path();
                if entry_path.is_file() {
                    if let Some(ext) = entry_path.extension() {
                        if ext == RESULT_FILE_EXTENSION {
                            dir_paths.push(entry_path);
                        }
                    }
                }
            }
            if dir_paths.is_empty() {
                return Err(Error::msg(format!(
                    "no result files found in directory: {}",
                    input.to_string_lossy()
                )));
            }
            dir_paths.sort();
            paths.extend(dir_paths);
        } else {
            paths.push(input);
        }
    }
    Ok(paths)
}

#[test]
fn directory_inputs_expand_to_csv_files() {
    let dir = std::env::temp_dir()
        .join("marqetsim_tests")
        .join("cli_collect");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("b.csv"), "a\n1\n").unwrap();
    std::fs::write(dir.join("a.csv"), "a\n1\n").unwrap();
    std::fs::write(dir.join("notes.txt"), "ignore me").unwrap();

    let paths = collect_result_paths(vec![dir.clone()]).unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("a.csv"));
    assert!(paths[1].ends_with("b.csv"));
}

#[test]
fn empty_directory_is_an_error() {
    let dir = std::env::temp_dir()
        .join("marqetsim_tests")
        .join("cli_collect_empty");
    std::fs::create_dir_all(&dir).unwrap();
    assert!(collect_result_paths(vec![dir]).is_err());
}
