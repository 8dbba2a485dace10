/// Resource limits for the solvers.
///
/// Both searches are exhaustive, so an adversarial machine could otherwise
/// keep them busy for a very long time. Hitting a limit surfaces as a
/// [`SolveError`](crate::error::SolveError) instead of a hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Maximum number of distinct light patterns the BFS may visit.
    pub max_states: usize,
    /// Maximum product of `(bound + 1)` over the free press-count variables.
    pub max_combinations: u64,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_states: 1 << 24,
            max_combinations: 1 << 32,
        }
    }
}
