//! This module provides the `ProgramLoader` struct, responsible for loading machines from
//! files and strings. `.json` files hold a serialized `MachineDefinition`; everything else is
//! read as the `.tur` text format.

use crate::analyzer::analyze;
use crate::machine::Machine;
use crate::parser::parse_machine;
use crate::types::{MachineDefinition, TumasError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `ProgramLoader` is a utility struct for loading machines.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single machine from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read and turned into a `Machine`.
    /// * `Err(TumasError::FileError)` if the file cannot be read.
    /// * Any parse, JSON, validation or configuration error of the content.
    pub fn load_program(path: &Path) -> Result<Machine, TumasError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TumasError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), bytes = content.len(), "loading machine");

        if is_json(path) {
            Self::load_program_from_json(&content)
        } else {
            parse_machine(&content)
        }
    }

    /// Loads a single machine from `.tur` content.
    pub fn load_program_from_string(content: &str) -> Result<Machine, TumasError> {
        parse_machine(content)
    }

    /// Loads a single machine from a JSON-serialized `MachineDefinition`.
    pub fn load_program_from_json(content: &str) -> Result<Machine, TumasError> {
        let definition: MachineDefinition = serde_json::from_str(content)?;
        analyze(&definition)?;
        Machine::new(definition)
    }

    /// Loads all machine files (`.tur` and `.json`) from a given directory.
    ///
    /// Directories and other files are skipped. Every candidate file yields one entry, so a
    /// broken file doesn't hide the others.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Machine), TumasError>> {
        if !directory.exists() {
            return vec![Err(TumasError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TumasError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(TumasError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let supported = path
                    .extension()
                    .is_some_and(|ext| ext == "tur" || ext == "json");
                if path.is_dir() || !supported {
                    return None;
                }

                Some(Self::load_program(&path).map(|machine| (path.clone(), machine)).map_err(
                    |e| {
                        warn!(path = %path.display(), error = %e, "skipping machine");
                        TumasError::FileError(format!(
                            "Failed to load program from {}: {}",
                            path.display(),
                            e
                        ))
                    },
                ))
            })
            .collect()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "name: Test Program\ntape: a\nrules:\n  start:\n    a -> b, R, stop\n  stop:";
    const VALID_JSON: &str = r#"{
        "name": "Json Walker",
        "initial_state": "A",
        "tape": "1",
        "head": -1,
        "transitions": [
            {
                "condition": { "state": "A", "symbol": "_" },
                "effect": { "new_state": "A", "new_symbol": "1", "action": "Left" }
            }
        ]
    }"#;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "test.tur", VALID);

        let machine = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(machine.name(), "Test Program");
        assert_eq!(machine.initial_tape(), &['a']);
        assert_eq!(machine.initial_state(), "start");
        assert_eq!(machine.transition_table().len(), 1);
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "invalid.tur", "This is not a valid program");

        assert!(ProgramLoader::load_program(&file_path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let error = ProgramLoader::load_program(&dir.path().join("missing.tur")).unwrap_err();
        assert!(matches!(error, TumasError::FileError(_)));
    }

    #[test]
    fn test_load_json_program() {
        let dir = tempdir().unwrap();
        let file_path = write_file(dir.path(), "walker.json", VALID_JSON);

        let machine = ProgramLoader::load_program(&file_path).unwrap();
        assert_eq!(machine.name(), "Json Walker");
        assert_eq!(machine.initial_head(), -1);
        assert!(machine.transition_table().get("A", '_').is_some());
    }

    #[test]
    fn test_load_malformed_json() {
        let error = ProgramLoader::load_program_from_json("{ \"name\": ").unwrap_err();
        assert!(matches!(error, TumasError::JsonError(_)));
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();

        write_file(dir.path(), "valid.tur", VALID);
        write_file(dir.path(), "invalid.tur", "This is not a valid program");
        write_file(dir.path(), "walker.json", VALID_JSON);
        write_file(dir.path(), "ignored.txt", "This file should be ignored");

        let results = ProgramLoader::load_programs(dir.path());

        // .tur and .json files are scanned; everything else is skipped.
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);

        let mut names: Vec<&str> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|(_, machine)| machine.name())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Json Walker", "Test Program"]);
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("nope"));
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TumasError::FileError(_))));
    }
}
