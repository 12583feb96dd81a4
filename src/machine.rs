//! This module defines the `TransitionTable`, a deterministic lookup from a (state, symbol)
//! condition to its effect, and the `Machine`, which pairs a table with the initial
//! configuration of a single-tape Turing Machine.

use std::collections::HashMap;
use unicode_width::UnicodeWidthChar;

use crate::tape::Tape;
use crate::types::{
    Condition, Effect, MachineDefinition, Symbol, Transition, TumasError, INPUT_BLANK_SYMBOL,
};

/// An immutable mapping from `Condition` to `Effect`.
///
/// Rules are grouped by source state so a lookup never has to allocate a `Condition`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionTable {
    rules: HashMap<String, HashMap<Symbol, Effect>>,
    len: usize,
}

impl TransitionTable {
    /// Builds a table from a list of transitions.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` if every condition appears at most once.
    /// * `Err(TumasError::ConfigurationError)` if two transitions share a condition.
    pub fn new(
        transitions: impl IntoIterator<Item = Transition>,
    ) -> Result<Self, TumasError> {
        let mut rules: HashMap<String, HashMap<Symbol, Effect>> = HashMap::new();
        let mut len = 0;

        for Transition { condition, effect } in transitions {
            let effects = rules.entry(condition.state.clone()).or_default();
            if effects.contains_key(&condition.symbol) {
                return Err(TumasError::ConfigurationError(format!(
                    "Duplicate transition for condition ({}, '{}')",
                    condition.state, condition.symbol
                )));
            }
            effects.insert(condition.symbol, effect);
            len += 1;
        }

        Ok(Self { rules, len })
    }

    /// Returns the effect registered for `condition`, if any.
    pub fn lookup(&self, condition: &Condition) -> Option<&Effect> {
        self.get(&condition.state, condition.symbol)
    }

    /// Same as [`lookup`](Self::lookup), without building a `Condition`.
    pub fn get(&self, state: &str, symbol: Symbol) -> Option<&Effect> {
        self.rules.get(state)?.get(&symbol)
    }

    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns every state that has at least one outgoing transition.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Iterates over all transitions in no particular order.
    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.rules.iter().flat_map(|(state, effects)| {
            effects.iter().map(move |(symbol, effect)| {
                Transition::new(Condition::new(state.clone(), *symbol), effect.clone())
            })
        })
    }
}

/// A single-tape, deterministic Turing Machine.
///
/// The machine itself never changes while it runs; the running configuration (state, head,
/// tape) lives in the simulation model.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    name: String,
    initial_state: String,
    blank: Symbol,
    initial_tape: Vec<Symbol>,
    initial_head: i64,
    table: TransitionTable,
}

impl Machine {
    /// Creates a new `Machine` from a definition.
    ///
    /// `INPUT_BLANK_SYMBOL` in conditions and effects is rewritten to the definition's blank
    /// symbol before the table is built.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the transitions form a deterministic table.
    /// * `Err(TumasError::ConfigurationError)` if a condition is defined twice, or if a symbol
    ///   doesn't fill exactly one terminal column.
    pub fn new(definition: MachineDefinition) -> Result<Self, TumasError> {
        let blank = definition.blank;
        check_symbol(blank)?;
        definition
            .transitions
            .iter()
            .try_for_each(|t| {
                check_symbol(t.condition.symbol)?;
                check_symbol(t.effect.new_symbol)
            })?;
        definition.tape.chars().try_for_each(check_symbol)?;

        let rewrite = |symbol: Symbol| {
            if symbol == INPUT_BLANK_SYMBOL {
                blank
            } else {
                symbol
            }
        };

        let transitions = definition.transitions.into_iter().map(|mut t| {
            t.condition.symbol = rewrite(t.condition.symbol);
            t.effect.new_symbol = rewrite(t.effect.new_symbol);
            t
        });
        let table = TransitionTable::new(transitions)?;

        Ok(Self {
            name: definition.name,
            initial_state: definition.initial_state,
            blank,
            initial_tape: definition.tape.chars().map(rewrite).collect(),
            initial_head: definition.head,
            table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn blank(&self) -> Symbol {
        self.blank
    }

    pub fn initial_head(&self) -> i64 {
        self.initial_head
    }

    pub fn initial_tape(&self) -> &[Symbol] {
        &self.initial_tape
    }

    pub fn transition_table(&self) -> &TransitionTable {
        &self.table
    }

    /// Returns a fresh tape holding the initial contents.
    pub fn tape(&self) -> Tape {
        Tape::from_symbols(self.blank, self.initial_tape.iter().copied())
    }

    /// Replaces the initial tape contents, e.g. with input given on the command line.
    pub fn set_initial_tape(&mut self, content: &str) -> Result<(), TumasError> {
        content.chars().try_for_each(check_symbol)?;

        let blank = self.blank;
        self.initial_tape = content
            .chars()
            .map(|c| if c == INPUT_BLANK_SYMBOL { blank } else { c })
            .collect();
        Ok(())
    }

    pub fn set_initial_head(&mut self, head: i64) {
        self.initial_head = head;
    }
}

/// Tape cells are one column wide, so wide, zero-width and control characters can't be symbols.
fn check_symbol(symbol: Symbol) -> Result<(), TumasError> {
    match UnicodeWidthChar::width(symbol) {
        Some(1) => Ok(()),
        _ => Err(TumasError::ConfigurationError(format!(
            "Symbol {symbol:?} is not one column wide"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn transition(state: &str, read: char, next: &str, write: char, dir: Direction) -> Transition {
        Transition::new(Condition::new(state, read), Effect::new(next, write, dir))
    }

    fn definition(transitions: Vec<Transition>) -> MachineDefinition {
        MachineDefinition {
            name: "Test Machine".to_string(),
            initial_state: "A".to_string(),
            blank: '-',
            tape: "1_1".to_string(),
            head: 0,
            transitions,
        }
    }

    #[test]
    fn test_lookup() {
        let table = TransitionTable::new(vec![
            transition("A", '0', "B", '1', Direction::Right),
            transition("A", '1', "A", '0', Direction::Left),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(&Condition::new("A", '0')),
            Some(&Effect::new("B", '1', Direction::Right))
        );
        assert_eq!(table.get("A", '1').map(|e| e.action), Some(Direction::Left));
        assert_eq!(table.lookup(&Condition::new("B", '0')), None);
        assert_eq!(table.get("A", '2'), None);
    }

    #[test]
    fn test_duplicate_condition_is_rejected() {
        let result = TransitionTable::new(vec![
            transition("A", '0', "B", '1', Direction::Right),
            transition("A", '0', "A", '0', Direction::Left),
        ]);

        let error = result.unwrap_err();
        assert!(matches!(error, TumasError::ConfigurationError(_)));
        assert!(error.to_string().contains("(A, '0')"));
    }

    #[test]
    fn test_same_symbol_in_different_states_is_allowed() {
        let table = TransitionTable::new(vec![
            transition("A", '0', "B", '1', Direction::Right),
            transition("B", '0', "A", '0', Direction::Left),
        ])
        .unwrap();

        let mut states: Vec<&str> = table.states().collect();
        states.sort();
        assert_eq!(states, vec!["A", "B"]);
        assert_eq!(table.transitions().count(), 2);
    }

    #[test]
    fn test_machine_rewrites_input_blank() {
        let machine = Machine::new(definition(vec![transition(
            "A",
            '_',
            "A",
            '_',
            Direction::Right,
        )]))
        .unwrap();

        assert_eq!(machine.initial_tape(), &['1', '-', '1']);
        assert_eq!(
            machine.transition_table().get("A", '-'),
            Some(&Effect::new("A", '-', Direction::Right))
        );

        let tape = machine.tape();
        assert_eq!(tape.read(1), '-');
        assert_eq!(tape.read(7), '-');
    }

    #[test]
    fn test_blank_alias_collision_is_a_duplicate() {
        // '_' is rewritten to the blank '-', so both rules read the same symbol.
        let result = Machine::new(definition(vec![
            transition("A", '_', "A", '1', Direction::Right),
            transition("A", '-', "A", '0', Direction::Left),
        ]));

        assert!(matches!(result, Err(TumasError::ConfigurationError(_))));
    }

    #[test]
    fn test_set_initial_tape_and_head() {
        let mut machine = Machine::new(definition(Vec::new())).unwrap();
        machine.set_initial_tape("ab_").unwrap();
        machine.set_initial_head(-2);

        assert_eq!(machine.initial_tape(), &['a', 'b', '-']);
        assert_eq!(machine.initial_head(), -2);
        assert!(machine.transition_table().is_empty());
    }

    #[test]
    fn test_symbols_must_be_one_column_wide() {
        let mut wide_tape = definition(Vec::new());
        wide_tape.tape = "1日".to_string();
        let error = Machine::new(wide_tape).unwrap_err();
        assert!(matches!(error, TumasError::ConfigurationError(_)));
        assert!(error.to_string().contains("'日'"));

        let wide_write = definition(vec![transition("A", '1', "A", '日', Direction::Right)]);
        assert!(matches!(
            Machine::new(wide_write),
            Err(TumasError::ConfigurationError(_))
        ));

        let mut combining_blank = definition(Vec::new());
        combining_blank.blank = '\u{301}';
        assert!(Machine::new(combining_blank).is_err());

        let mut machine = Machine::new(definition(Vec::new())).unwrap();
        assert!(machine.set_initial_tape("1\t1").is_err());
        assert_eq!(machine.initial_tape(), &['1', '-', '1']);
    }
}
