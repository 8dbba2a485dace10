use indicatif::ParallelProgressIterator;
use miette::*;
use rayon::prelude::*;

use crate::budget::SearchBudget;
use crate::counters::min_presses_for_counters;
use crate::parser::parse_machines;

#[tracing::instrument]
pub fn process(input: &str) -> Result<String> {
    process_with_budget(input, &SearchBudget::default())
}

/// Sums the fewest presses that bring every machine's counters to their targets.
/// Machines that can't be solved are logged and left out of the sum.
#[tracing::instrument(skip(input))]
pub fn process_with_budget(input: &str, budget: &SearchBudget) -> Result<String> {
    let machines = parse_machines(input)?;

    let total_presses: u64 = machines
        .par_iter()
        .enumerate()
        .progress_count(machines.len() as u64)
        .filter_map(|(i, m)| match min_presses_for_counters(m, budget) {
            Ok(presses) => Some(presses),
            Err(err) => {
                tracing::warn!(machine = i, %err, "skipping machine");
                None
            }
        })
        .sum();

    Ok(total_presses.to_string())
}
