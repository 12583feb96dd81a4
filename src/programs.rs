//! Built-in machines, embedded at compile time.

use crate::machine::Machine;
use crate::parser::parse_machine;
use crate::types::TumasError;
use tracing::error;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 5] = [
    include_str!("../programs/binary-increment.tur"),
    include_str!("../programs/unary-increment.tur"),
    include_str!("../programs/busy-beaver-3.tur"),
    include_str!("../programs/palindrome.tur"),
    include_str!("../programs/right-walker.tur"),
];

lazy_static::lazy_static! {
    /// Every embedded program that parses, in `PROGRAM_TEXTS` order.
    pub static ref PROGRAMS: Vec<(Machine, &'static str)> = PROGRAM_TEXTS
        .iter()
        .filter_map(|text| match parse_machine(text) {
            Ok(machine) => Some((machine, *text)),
            Err(e) => {
                error!(error = %e, "failed to parse built-in program");
                None
            }
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Machine, TumasError> {
        PROGRAMS
            .get(index)
            .map(|(machine, _)| machine.clone())
            .ok_or_else(|| {
                TumasError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Machine, TumasError> {
        PROGRAMS
            .iter()
            .find(|(machine, _)| machine.name().eq_ignore_ascii_case(name))
            .map(|(machine, _)| machine.clone())
            .ok_or_else(|| TumasError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS
            .iter()
            .map(|(machine, _)| machine.name().to_string())
            .collect()
    }

    /// Get the original text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TumasError> {
        PROGRAMS.get(index).map(|(_, text)| *text).ok_or_else(|| {
            TumasError::ValidationError(format!("Program text index {} out of range", index))
        })
    }
}
