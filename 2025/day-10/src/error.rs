use miette::Diagnostic;
use thiserror::Error;

/// Rejections raised while assembling a [`Machine`](crate::machine::Machine).
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MachineError {
    #[error(
        "button {button} references index {index}, but the machine has {lights} lights and {counters} counters"
    )]
    #[diagnostic(code(day10::machine::index_out_of_range))]
    IndexOutOfRange {
        button: usize,
        index: usize,
        lights: usize,
        counters: usize,
    },

    #[error("button {button} lists index {index} more than once")]
    #[diagnostic(code(day10::machine::duplicate_index))]
    DuplicateIndex { button: usize, index: usize },

    #[error("counter {counter} targets {target}, at most {max} is supported")]
    #[diagnostic(code(day10::machine::target_too_large))]
    TargetTooLarge { counter: usize, target: u64, max: u64 },
}

/// Why a solver gave up on a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SolveError {
    #[error("target light pattern is unreachable with the available buttons")]
    #[diagnostic(code(day10::lights::unreachable))]
    UnreachableLights,

    #[error("no non-negative integer press counts reach the target counters")]
    #[diagnostic(code(day10::counters::infeasible))]
    InfeasibleCounters,

    #[error("machine has {lights} lights, at most {max} are supported")]
    #[diagnostic(
        code(day10::lights::too_many_lights),
        help("light patterns are searched as single machine words")
    )]
    TooManyLights { lights: usize, max: usize },

    #[error("press counts overflowed while solving the counters")]
    #[diagnostic(code(day10::counters::overflow))]
    CounterOverflow,

    #[error("light search visited more than {limit} patterns")]
    #[diagnostic(
        code(day10::lights::state_budget),
        help("raise the state budget with --max-states")
    )]
    StateBudget { limit: usize },

    #[error("counter search needs {combinations} free-variable combinations, budget is {limit}")]
    #[diagnostic(
        code(day10::counters::enumeration_budget),
        help("raise the enumeration budget with --max-combinations")
    )]
    EnumerationBudget { combinations: u128, limit: u64 },
}

impl SolveError {
    /// `true` when the search finished and proved there is no answer, as opposed
    /// to stopping early on a resource limit.
    pub fn is_no_solution(&self) -> bool {
        matches!(self, Self::UnreachableLights | Self::InfeasibleCounters)
    }
}
