pub mod budget;
pub mod counters;
pub mod error;
pub mod lights;
pub mod machine;
pub mod parser;
pub mod part1;
pub mod part2;

pub use budget::SearchBudget;
pub use counters::{min_presses_for_counters, solve_counters, CounterPresses};
pub use error::{MachineError, SolveError};
pub use lights::min_presses_to_match;
pub use machine::{Button, CounterVector, LightPattern, Machine};
pub use parser::parse_machines;
