//! This module defines the `SimulationEngine`, which executes a `Machine` one transition at a
//! time, split into four observable phases so each phase can be rendered as its own frame:
//!
//! | phase              | on `advance()`                                  | next phase         |
//! |--------------------|-------------------------------------------------|--------------------|
//! | `Idle`             | look up (state, symbol under head)              | `FoundTransition`, or `Finished` if none |
//! | `FoundTransition`  | write the new symbol, switch to the new state   | `ChangedState`     |
//! | `ChangedState`     | move the head                                   | `Moved`, or `Finished` at the end of the `i64` range |
//! | `Moved`            | clear the pending transition                    | `Idle`             |
//! | `Finished`/`Interrupted` | nothing                                   | unchanged          |

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::machine::Machine;
use crate::tape::Tape;
use crate::types::{Condition, Transition};

/// The phase of the current machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationState {
    /// Waiting to look up the next transition.
    Idle,
    /// A transition matched; nothing has been applied yet.
    FoundTransition,
    /// The new symbol was written and the machine state switched.
    ChangedState,
    /// The head was moved.
    Moved,
    /// No transition matched. Terminal.
    Finished,
    /// The user asked to stop. Terminal.
    Interrupted,
}

impl SimulationState {
    /// Returns `true` for the absorbing states.
    pub fn is_terminal(self) -> bool {
        matches!(self, SimulationState::Finished | SimulationState::Interrupted)
    }
}

/// Time between two micro-steps, kept in tenths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StepInterval {
    tenths: u32,
}

impl StepInterval {
    const MIN_TENTHS: u32 = 1;

    /// Creates an interval from seconds, rounded to the nearest tenth and clamped to 0.1 s.
    pub fn from_secs_f64(secs: f64) -> Self {
        let tenths = if secs.is_finite() && secs > 0.0 {
            (secs * 10.0).round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        Self {
            tenths: tenths.max(Self::MIN_TENTHS),
        }
    }

    /// Shortens the interval by 0.1 s, never going below 0.1 s.
    pub fn accelerate(&mut self) {
        self.tenths = self.tenths.saturating_sub(1).max(Self::MIN_TENTHS);
    }

    /// Lengthens the interval by 0.1 s.
    pub fn slow_down(&mut self) {
        self.tenths = self.tenths.saturating_add(1);
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.tenths) * 100)
    }

    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.tenths) / 10.0
    }
}

impl Default for StepInterval {
    fn default() -> Self {
        Self { tenths: 5 }
    }
}

impl fmt::Display for StepInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} s", self.as_secs_f64())
    }
}

/// Everything that changes while a simulation runs.
///
/// The engine is the only writer, except for the step interval which is adjusted by the
/// input handling. The renderer reads it.
#[derive(Debug, Clone)]
pub struct Model {
    pub machine_state: String,
    pub head: i64,
    pub tape: Tape,
    /// Present only in `FoundTransition`, `ChangedState` and `Moved`.
    pub transition: Option<Transition>,
    pub state: SimulationState,
    pub step_interval: StepInterval,
    /// Number of completed machine transitions.
    pub step_count: usize,
}

impl Model {
    /// Returns the condition the machine is currently in.
    pub fn current_condition(&self) -> Condition {
        Condition::new(self.machine_state.clone(), self.tape.read(self.head))
    }
}

/// Drives a `Machine` through the micro-step phases.
pub struct SimulationEngine {
    machine: Machine,
    model: Model,
}

impl SimulationEngine {
    /// Creates an engine positioned at the machine's initial configuration.
    pub fn new(machine: Machine, step_interval: StepInterval) -> Self {
        let model = Model {
            machine_state: machine.initial_state().to_string(),
            head: machine.initial_head(),
            tape: machine.tape(),
            transition: None,
            state: SimulationState::Idle,
            step_interval,
            step_count: 0,
        };

        Self { machine, model }
    }

    /// Executes one micro-step.
    ///
    /// # Returns
    ///
    /// * `true` if the simulation may continue (including the step that reaches `Finished`).
    /// * `false` once the simulation is `Finished` or `Interrupted`.
    pub fn advance(&mut self) -> bool {
        let model = &mut self.model;

        match model.state {
            SimulationState::Idle => {
                let symbol = model.tape.read(model.head);
                match self
                    .machine
                    .transition_table()
                    .get(&model.machine_state, symbol)
                {
                    Some(effect) => {
                        let condition = Condition::new(model.machine_state.clone(), symbol);
                        trace!(state = %model.machine_state, %symbol, "found transition");
                        model.transition = Some(Transition::new(condition, effect.clone()));
                        model.state = SimulationState::FoundTransition;
                    }
                    None => {
                        info!(
                            state = %model.machine_state,
                            %symbol,
                            steps = model.step_count,
                            "no transition, simulation finished"
                        );
                        model.state = SimulationState::Finished;
                    }
                }
                true
            }
            SimulationState::FoundTransition => {
                if let Some(transition) = &model.transition {
                    let effect = &transition.effect;
                    model.tape.write(model.head, effect.new_symbol);
                    model.machine_state = effect.new_state.clone();
                    trace!(state = %model.machine_state, symbol = %effect.new_symbol, "changed state");
                }
                model.state = SimulationState::ChangedState;
                true
            }
            SimulationState::ChangedState => {
                let offset = model
                    .transition
                    .as_ref()
                    .map_or(0, |t| t.effect.action.offset());
                match model.head.checked_add(offset) {
                    Some(head) => {
                        model.head = head;
                        trace!(head, "moved head");
                        model.state = SimulationState::Moved;
                    }
                    None => {
                        warn!(head = model.head, offset, "head can't move further, simulation finished");
                        model.transition = None;
                        model.state = SimulationState::Finished;
                    }
                }
                true
            }
            SimulationState::Moved => {
                model.transition = None;
                model.step_count += 1;
                model.state = SimulationState::Idle;
                debug!(step = model.step_count, head = model.head, state = %model.machine_state, "step completed");
                true
            }
            SimulationState::Finished | SimulationState::Interrupted => false,
        }
    }

    /// Requests the simulation to stop. Takes effect on the next `advance()`.
    pub fn interrupt(&mut self) {
        if self.model.state.is_terminal() {
            return;
        }
        info!(steps = self.model.step_count, "simulation interrupted");
        self.model.transition = None;
        self.model.state = SimulationState::Interrupted;
    }

    pub fn is_terminated(&self) -> bool {
        self.model.state.is_terminal()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn step_interval(&self) -> StepInterval {
        self.model.step_interval
    }

    pub fn interval_mut(&mut self) -> &mut StepInterval {
        &mut self.model.step_interval
    }
}
