//! This module provides functions for analyzing machine definitions to detect common errors
//! before execution: a start state the machine can't leave, and rule blocks that can never be
//! reached.

use crate::types::{MachineDefinition, TumasError};
use std::collections::HashSet;

/// Represents the problems that can be found during the analysis of a machine definition.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The initial state has no outgoing transitions.
    InvalidStartState(String),
    /// States with transitions that can't be reached from the initial state.
    UnreachableStates(Vec<String>),
    /// Indicates structural problems with the definition (empty names, etc.).
    StructuralError(String),
}

impl From<AnalysisError> for TumasError {
    /// Converts an `AnalysisError` into a `TumasError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                TumasError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::UnreachableStates(states) => TumasError::ValidationError(format!(
                "Unreachable states detected: {:?}",
                states
            )),
            AnalysisError::StructuralError(msg) => TumasError::ValidationError(msg),
        }
    }
}

/// Analyzes a `MachineDefinition` for structural and logical errors.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TumasError::ValidationError)` with the first problem found otherwise.
pub fn analyze(definition: &MachineDefinition) -> Result<(), TumasError> {
    [
        check_structure,
        check_valid_start_state,
        check_unreachable_states,
    ]
    .iter()
    .try_for_each(|check| check(definition))
    .map_err(TumasError::from)
}

/// Checks that names and states are present.
fn check_structure(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    if definition.name.trim().is_empty() {
        return Err(AnalysisError::StructuralError(
            "Machine name is empty".to_string(),
        ));
    }

    if definition.initial_state.is_empty() {
        return Err(AnalysisError::StructuralError(
            "Initial state is empty".to_string(),
        ));
    }

    if let Some(transition) = definition
        .transitions
        .iter()
        .find(|t| t.condition.state.is_empty() || t.effect.new_state.is_empty())
    {
        return Err(AnalysisError::StructuralError(format!(
            "Transition on symbol '{}' has an empty state",
            transition.condition.symbol
        )));
    }

    Ok(())
}

/// Checks whether the initial state has at least one outgoing transition.
fn check_valid_start_state(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    if !definition
        .transitions
        .iter()
        .any(|t| t.condition.state == definition.initial_state)
    {
        return Err(AnalysisError::InvalidStartState(
            definition.initial_state.clone(),
        ));
    }

    Ok(())
}

/// Checks for unreachable states by walking the transitions from the initial state.
///
/// Only states with outgoing transitions are considered; states that are merely referenced
/// are where the machine finishes.
fn check_unreachable_states(definition: &MachineDefinition) -> Result<(), AnalysisError> {
    let mut visited = HashSet::new();
    let mut queue = vec![definition.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        queue.extend(
            definition
                .transitions
                .iter()
                .filter(|t| t.condition.state == state)
                .map(|t| t.effect.new_state.as_str())
                .filter(|next| !visited.contains(next)),
        );
    }

    let mut unreachable: Vec<String> = definition
        .states()
        .into_iter()
        .filter(|state| !visited.contains(state))
        .map(String::from)
        .collect();

    if !unreachable.is_empty() {
        unreachable.sort(); // Sort for deterministic output
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Condition, Direction, Effect, Transition};

    fn create_test_definition(initial_state: &str, transitions: Vec<Transition>) -> MachineDefinition {
        MachineDefinition {
            name: "Test Machine".to_string(),
            initial_state: initial_state.to_string(),
            blank: '_',
            tape: "a".to_string(),
            head: 0,
            transitions,
        }
    }

    fn transition(state: &str, read: char, next: &str) -> Transition {
        Transition::new(
            Condition::new(state, read),
            Effect::new(next, read, Direction::Right),
        )
    }

    #[test]
    fn test_valid_definition() {
        let definition = create_test_definition(
            "start",
            vec![
                transition("start", 'a', "middle"),
                transition("middle", 'a', "halt"),
            ],
        );
        assert!(analyze(&definition).is_ok());
    }

    #[test]
    fn test_invalid_start_state() {
        let definition = create_test_definition("nowhere", vec![transition("start", 'a', "halt")]);

        assert_eq!(
            check_valid_start_state(&definition),
            Err(AnalysisError::InvalidStartState("nowhere".to_string()))
        );
        assert_eq!(
            analyze(&definition).unwrap_err().to_string(),
            "Program validation error: Invalid start state: nowhere"
        );
    }

    #[test]
    fn test_unreachable_states() {
        let definition = create_test_definition(
            "start",
            vec![
                transition("start", 'a', "start"),
                transition("island", 'a', "other"),
                transition("other", 'a', "island"),
            ],
        );

        assert_eq!(
            check_unreachable_states(&definition),
            Err(AnalysisError::UnreachableStates(vec![
                "island".to_string(),
                "other".to_string()
            ]))
        );
    }

    #[test]
    fn test_cycle_is_reachable() {
        let definition = create_test_definition(
            "a",
            vec![
                transition("a", '0', "b"),
                transition("b", '0', "c"),
                transition("c", '0', "a"),
            ],
        );
        assert!(check_unreachable_states(&definition).is_ok());
    }

    #[test]
    fn test_structural_errors() {
        let mut definition = create_test_definition("start", vec![transition("start", 'a', "")]);
        assert!(matches!(
            check_structure(&definition),
            Err(AnalysisError::StructuralError(_))
        ));

        definition.transitions.clear();
        definition.name = "  ".to_string();
        assert_eq!(
            check_structure(&definition),
            Err(AnalysisError::StructuralError(
                "Machine name is empty".to_string()
            ))
        );
    }
}
