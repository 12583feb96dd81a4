//! This module defines the core data structures shared by the simulator: symbols, directions,
//! the condition/effect pair that makes up a transition, the definition format that machines
//! are built from, and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The blank symbol used when a definition doesn't declare one.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// A special input symbol used in definitions to always denote the machine's blank symbol.
pub const INPUT_BLANK_SYMBOL: char = '_';
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB

/// A single tape symbol.
pub type Symbol = char;

/// Represents the possible directions the head can move after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Returns the signed head offset for this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

/// The lookup key into a transition table: the machine state and the symbol under the head.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub state: String,
    pub symbol: Symbol,
}

impl Condition {
    pub fn new(state: impl Into<String>, symbol: Symbol) -> Self {
        Self {
            state: state.into(),
            symbol,
        }
    }
}

/// What happens when a condition matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// The state the machine switches to.
    pub new_state: String,
    /// The symbol written under the head.
    pub new_symbol: Symbol,
    /// The head movement applied after writing.
    pub action: Direction,
}

impl Effect {
    pub fn new(new_state: impl Into<String>, new_symbol: Symbol, action: Direction) -> Self {
        Self {
            new_state: new_state.into(),
            new_symbol,
            action,
        }
    }
}

/// A single rule of a machine: a condition together with its effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub condition: Condition,
    pub effect: Effect,
}

impl Transition {
    pub fn new(condition: Condition, effect: Effect) -> Self {
        Self { condition, effect }
    }
}

/// An unvalidated machine definition, as produced by the parser or deserialized from JSON.
///
/// A definition becomes a runnable [`crate::Machine`] once its transitions are checked for
/// conflicting conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDefinition {
    /// The name of the machine.
    pub name: String,
    /// The state the machine starts in.
    pub initial_state: String,
    /// The blank symbol; absent tape cells read as this symbol.
    #[serde(default = "default_blank")]
    pub blank: Symbol,
    /// The initial tape contents, written from position 0 onward.
    #[serde(default)]
    pub tape: String,
    /// The initial head position.
    #[serde(default)]
    pub head: i64,
    /// All transitions, in definition order.
    pub transitions: Vec<Transition>,
}

fn default_blank() -> Symbol {
    DEFAULT_BLANK_SYMBOL
}

impl MachineDefinition {
    /// Returns the source states in order of first appearance.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = Vec::new();
        for transition in &self.transitions {
            let state = transition.condition.state.as_str();
            if !states.contains(&state) {
                states.push(state);
            }
        }
        states
    }
}

/// Represents the errors that can occur while loading and building machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TumasError {
    /// Indicates an error during the parsing of a machine definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an ambiguous transition table, e.g. two rules for the same condition.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    /// Indicates a structural or logical problem found while validating a definition.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// Indicates a malformed JSON machine definition.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl From<serde_json::Error> for TumasError {
    fn from(error: serde_json::Error) -> Self {
        TumasError::JsonError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left = Direction::Left;
        let right = Direction::Right;

        let left_json = serde_json::to_string(&left).unwrap();
        let right_json = serde_json::to_string(&right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left_deserialized: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, left_deserialized);
    }

    #[test]
    fn test_direction_offset_and_display() {
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Right.offset(), 1);
        assert_eq!(Direction::Left.to_string(), "L");
        assert_eq!(Direction::Right.to_string(), "R");
    }

    #[test]
    fn test_definition_defaults_from_json() {
        let json = r#"{
            "name": "Walker",
            "initial_state": "A",
            "transitions": [
                {
                    "condition": { "state": "A", "symbol": "_" },
                    "effect": { "new_state": "A", "new_symbol": "1", "action": "Right" }
                }
            ]
        }"#;

        let definition: MachineDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.blank, DEFAULT_BLANK_SYMBOL);
        assert_eq!(definition.tape, "");
        assert_eq!(definition.head, 0);
        assert_eq!(
            definition.transitions[0].effect,
            Effect::new("A", '1', Direction::Right)
        );
    }

    #[test]
    fn test_definition_states_keep_first_appearance_order() {
        let definition = MachineDefinition {
            name: "States".to_string(),
            initial_state: "b".to_string(),
            blank: '_',
            tape: String::new(),
            head: 0,
            transitions: vec![
                Transition::new(Condition::new("b", '0'), Effect::new("a", '0', Direction::Left)),
                Transition::new(Condition::new("a", '0'), Effect::new("b", '1', Direction::Right)),
                Transition::new(Condition::new("b", '1'), Effect::new("a", '0', Direction::Left)),
            ],
        };

        assert_eq!(definition.states(), vec!["b", "a"]);
    }

    #[test]
    fn test_error_display() {
        let error = TumasError::ConfigurationError("duplicate condition (A, _)".to_string());

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Configuration error"));
        assert!(error_msg.contains("(A, _)"));
    }
}
