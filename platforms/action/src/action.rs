use keymap::KeyMap;

/// Keys recognized while a simulation is being animated.
#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Shorten the step interval
    #[key("a")]
    Accelerate,
    /// Lengthen the step interval
    #[key("s")]
    SlowDown,
    /// Interrupt the simulation
    #[key("q")]
    Quit,
}
