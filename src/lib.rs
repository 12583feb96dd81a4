//! This crate provides the core of an animated Turing Machine simulator.
//! It includes modules for parsing machine definitions, executing them one observable
//! micro-step at a time, and mapping the unbounded tape onto a fixed-width terminal line.

pub mod analyzer;
pub mod engine;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;
pub mod viewport;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the simulation engine and its model.
pub use engine::{Model, SimulationEngine, SimulationState, StepInterval};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `Machine` and `TransitionTable` structs from the machine module.
pub use machine::{Machine, TransitionTable};
/// Re-exports the parsing functions from the parser module.
pub use parser::{parse, parse_machine};
/// Re-exports `ProgramManager` and `PROGRAMS` from the programs module.
pub use programs::{ProgramManager, PROGRAMS};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports the types shared across modules.
pub use types::{
    Condition, Direction, Effect, MachineDefinition, Symbol, Transition, TumasError,
    MAX_PROGRAM_SIZE,
};
/// Re-exports the renderer and the frame it produces.
pub use viewport::{Frame, Segment, Style, ViewportRenderer};
