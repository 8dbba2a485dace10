use std::collections::{HashSet, VecDeque};

use crate::budget::SearchBudget;
use crate::error::SolveError;
use crate::machine::{Button, Machine};

/// Widest light pattern the search can encode.
pub const MAX_LIGHTS: usize = u64::BITS as usize;

/// XOR mask applied to the packed light pattern when `button` is pressed.
fn toggle_mask(button: &Button) -> u64 {
    button.indices().iter().fold(0u64, |mask, &i| mask ^ (1u64 << i))
}

/// Fewest presses that take the all-off lights to the machine's target pattern.
///
/// Breadth-first search over packed light patterns. Every pattern, the
/// all-off start included, is marked visited before it is queued, so each one
/// is expanded at most once and the search ends after at most `2^lights`
/// patterns even when the target can't be reached.
#[tracing::instrument(level = "debug", skip_all, fields(lights = machine.light_count()))]
pub fn min_presses_to_match(machine: &Machine, budget: &SearchBudget) -> Result<usize, SolveError> {
    let lights = machine.light_count();
    let target = machine
        .target_lights()
        .to_mask()
        .ok_or(SolveError::TooManyLights {
            lights,
            max: MAX_LIGHTS,
        })?;

    if target == 0 {
        return Ok(0);
    }

    let toggles: Vec<u64> = machine.buttons().iter().map(toggle_mask).collect();

    let mut visited = HashSet::from([0u64]);
    let mut queue = VecDeque::from([(0u64, 0usize)]);

    while let Some((pattern, presses)) = queue.pop_front() {
        for &toggle in &toggles {
            let next = pattern ^ toggle;
            if !visited.insert(next) {
                continue;
            }
            if next == target {
                tracing::debug!(presses = presses + 1, visited = visited.len(), "target reached");
                return Ok(presses + 1);
            }
            if visited.len() > budget.max_states {
                return Err(SolveError::StateBudget {
                    limit: budget.max_states,
                });
            }
            queue.push_back((next, presses + 1));
        }
    }

    tracing::debug!(visited = visited.len(), "light patterns exhausted");
    Err(SolveError::UnreachableLights)
}
