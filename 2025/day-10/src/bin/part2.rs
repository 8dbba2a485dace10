use clap::Parser;
use miette::*;
use std::path::PathBuf;

use aoc2025_day_10::{part2, SearchBudget};

/// Fewest button presses to set every machine's counters.
#[derive(Parser, Debug)]
struct Args {
    /// Puzzle input, one machine per line
    #[arg(default_value = "input2.txt")]
    input: PathBuf,

    /// Most light patterns the search may visit per machine
    #[arg(long, default_value_t = SearchBudget::default().max_states)]
    max_states: usize,

    /// Most free press-count combinations the search may enumerate per machine
    #[arg(long, default_value_t = SearchBudget::default().max_combinations)]
    max_combinations: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let input = std::fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", args.input.display()))?;
    let budget = SearchBudget {
        max_states: args.max_states,
        max_combinations: args.max_combinations,
    };
    let result = part2::process_with_budget(&input, &budget)?;
    println!("Result: {}", result);
    Ok(())
}
