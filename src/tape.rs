//! A sparse, unbounded, bidirectional tape.
//!
//! Only written cells are stored; every other position reads as the blank symbol. The tape
//! never shrinks: writing the blank symbol still records the cell.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::types::{Symbol, INPUT_BLANK_SYMBOL};

#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    cells: HashMap<i64, Symbol>,
    blank: Symbol,
}

impl Tape {
    /// Creates an empty tape where every cell reads as `blank`.
    pub fn new(blank: Symbol) -> Self {
        Self {
            cells: HashMap::new(),
            blank,
        }
    }

    /// Creates a tape holding `symbols` at positions `0..symbols.len()`.
    ///
    /// `INPUT_BLANK_SYMBOL` in the input is rewritten to `blank`.
    pub fn from_symbols(blank: Symbol, symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let mut tape = Self::new(blank);
        for (position, symbol) in (0_i64..).zip(symbols) {
            let symbol = if symbol == INPUT_BLANK_SYMBOL {
                blank
            } else {
                symbol
            };
            tape.write(position, symbol);
        }
        tape
    }

    /// Returns the symbol at `position`, or the blank symbol if it was never written.
    pub fn read(&self, position: i64) -> Symbol {
        self.cells.get(&position).copied().unwrap_or(self.blank)
    }

    /// Stores `symbol` at `position`.
    pub fn write(&mut self, position: i64, symbol: Symbol) {
        self.cells.insert(position, symbol);
    }

    pub fn blank(&self) -> Symbol {
        self.blank
    }

    /// Returns the number of written cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the range between the leftmost and rightmost written cells.
    pub fn written_range(&self) -> Option<RangeInclusive<i64>> {
        let min = self.cells.keys().min()?;
        let max = self.cells.keys().max()?;
        Some(*min..=*max)
    }

    /// Returns the symbols within `range`, blanks included.
    pub fn symbols(&self, range: RangeInclusive<i64>) -> Vec<Symbol> {
        range.map(|position| self.read(position)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_cells_read_blank() {
        let tape = Tape::new('_');

        assert_eq!(tape.read(0), '_');
        assert_eq!(tape.read(-42), '_');
        assert_eq!(tape.read(i64::MAX), '_');
        assert!(tape.is_empty());
        assert_eq!(tape.written_range(), None);
    }

    #[test]
    fn test_write_then_read() {
        let mut tape = Tape::new('_');
        tape.write(-3, 'x');
        tape.write(5, 'y');

        assert_eq!(tape.read(-3), 'x');
        assert_eq!(tape.read(5), 'y');
        assert_eq!(tape.read(0), '_');
        assert_eq!(tape.written_range(), Some(-3..=5));
    }

    #[test]
    fn test_writing_blank_keeps_the_cell() {
        let mut tape = Tape::new('_');
        tape.write(1, '1');
        tape.write(1, '_');

        assert_eq!(tape.read(1), '_');
        assert_eq!(tape.len(), 1);
    }

    #[test]
    fn test_from_symbols_rewrites_input_blank() {
        let tape = Tape::from_symbols('-', "a_b".chars());

        assert_eq!(tape.symbols(0..=2), vec!['a', '-', 'b']);
        assert_eq!(tape.read(3), '-');
        assert_eq!(tape.blank(), '-');
    }
}
