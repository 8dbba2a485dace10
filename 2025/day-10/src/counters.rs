use num::rational::Rational64;
use num::{One, Signed, Zero};

use crate::budget::SearchBudget;
use crate::error::SolveError;
use crate::machine::Machine;

fn to_rational(value: u64) -> Result<Rational64, SolveError> {
    i64::try_from(value)
        .map(Rational64::from_integer)
        .map_err(|_| SolveError::CounterOverflow)
}

/// `constant + Σ coeffs[j] * x_j` over the button press counts `x`.
///
/// Equations are stored in the same shape with an implied `= 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Affine {
    coeffs: Vec<Rational64>,
    constant: Rational64,
}

impl Affine {
    fn eval(&self, values: &[u64]) -> Result<Rational64, SolveError> {
        self.coeffs
            .iter()
            .zip(values)
            .filter(|(c, _)| !c.is_zero())
            .try_fold(self.constant, |acc, (c, &v)| Ok(acc + c * to_rational(v)?))
    }

    /// Solves `self = 0` for `var`, or `None` if `var` does not appear.
    fn isolate(&self, var: usize) -> Option<Affine> {
        let pivot = self.coeffs[var];
        if pivot.is_zero() {
            return None;
        }
        let scale = -pivot.recip();
        let coeffs = self
            .coeffs
            .iter()
            .enumerate()
            .map(|(j, &c)| if j == var { Rational64::zero() } else { c * scale })
            .collect();
        Some(Affine {
            coeffs,
            constant: self.constant * scale,
        })
    }

    /// Replaces `var` by `expr`.
    fn substitute(&self, var: usize, expr: &Affine) -> Affine {
        let factor = self.coeffs[var];
        if factor.is_zero() {
            return self.clone();
        }
        let coeffs = self
            .coeffs
            .iter()
            .zip(&expr.coeffs)
            .enumerate()
            .map(|(j, (&c, &e))| {
                if j == var {
                    Rational64::zero()
                } else {
                    c + factor * e
                }
            })
            .collect();
        Affine {
            coeffs,
            constant: self.constant + factor * expr.constant,
        }
    }

    fn is_constant(&self) -> bool {
        self.coeffs.iter().all(Zero::is_zero)
    }
}

/// How one button's press count is determined after elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Variable {
    /// Enumerated over `0..=bound`. `None` means the button touches no counter.
    Free { bound: Option<u64> },
    /// Fixed by the other press counts. Only references higher-indexed variables.
    Dependent { expr: Affine },
}

/// The counter equations with every solvable variable eliminated.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Elimination {
    variables: Vec<Variable>,
}

impl Elimination {
    /// Builds one equation per counter and eliminates variables in index order.
    ///
    /// Fails straight away when elimination leaves a contradiction like `0 = 2`.
    fn new(machine: &Machine) -> Result<Self, SolveError> {
        let buttons = machine.buttons();
        let bounds = upper_bounds(machine);

        let mut equations = machine
            .target_counters()
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &target)| {
                Ok(Affine {
                    coeffs: buttons
                        .iter()
                        .map(|b| {
                            if b.contains(i) {
                                Rational64::one()
                            } else {
                                Rational64::zero()
                            }
                        })
                        .collect(),
                    constant: -to_rational(target)?,
                })
            })
            .collect::<Result<Vec<Affine>, SolveError>>()?;

        let mut variables = Vec::with_capacity(buttons.len());
        for (var, bound) in bounds.into_iter().enumerate() {
            match equations.iter().find_map(|eq| eq.isolate(var)) {
                Some(expr) => {
                    for eq in equations.iter_mut() {
                        *eq = eq.substitute(var, &expr);
                    }
                    variables.push(Variable::Dependent { expr });
                }
                None => variables.push(Variable::Free { bound }),
            }
        }

        // Every variable is gone from every equation now, only constants remain.
        if equations
            .iter()
            .any(|eq| eq.is_constant() && !eq.constant.is_zero())
        {
            return Err(SolveError::InfeasibleCounters);
        }

        Ok(Self { variables })
    }

    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn free_count(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| matches!(v, Variable::Free { .. }))
            .count()
    }

    /// Number of free-variable assignments an unpruned search would try.
    /// `None` on `u128` overflow.
    fn combinations(&self) -> Option<u128> {
        self.variables.iter().try_fold(1u128, |acc, v| match v {
            Variable::Free { bound: Some(bound) } => acc.checked_mul(u128::from(*bound) + 1),
            _ => Some(acc),
        })
    }
}

/// A button can't be pressed more often than the smallest target among its counters.
fn upper_bounds(machine: &Machine) -> Vec<Option<u64>> {
    let targets = machine.target_counters().as_slice();
    machine
        .buttons()
        .iter()
        .map(|b| b.indices().iter().map(|&i| targets[i]).min())
        .collect()
}

/// Depth-first search from the highest variable down, so every dependent
/// variable's inputs are assigned by the time it is evaluated.
struct Search<'a> {
    variables: &'a [Variable],
    values: Vec<u64>,
    best: Option<(u64, Vec<u64>)>,
}

impl Search<'_> {
    fn beaten(&self, total: u64) -> bool {
        self.best.as_ref().is_some_and(|(best, _)| total >= *best)
    }

    fn descend(&mut self, remaining: usize, total: u64) -> Result<(), SolveError> {
        if self.beaten(total) {
            return Ok(());
        }
        let Some(var) = remaining.checked_sub(1) else {
            self.best = Some((total, self.values.clone()));
            return Ok(());
        };

        let variables = self.variables;
        match &variables[var] {
            Variable::Dependent { expr } => {
                let value = expr.eval(&self.values)?;
                if value.is_negative() || !value.is_integer() {
                    return Ok(());
                }
                let value = value.to_integer().unsigned_abs();
                self.values[var] = value;
                self.descend(var, add(total, value)?)
            }
            // Pressing a button wired to nothing only adds to the total.
            Variable::Free { bound: None } => {
                self.values[var] = 0;
                self.descend(var, total)
            }
            Variable::Free { bound: Some(bound) } => {
                for value in 0..=*bound {
                    let next = add(total, value)?;
                    if self.beaten(next) {
                        break;
                    }
                    self.values[var] = value;
                    self.descend(var, next)?;
                }
                Ok(())
            }
        }
    }
}

fn add(total: u64, value: u64) -> Result<u64, SolveError> {
    total.checked_add(value).ok_or(SolveError::CounterOverflow)
}

/// Optimal press count for every button of a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterPresses {
    counts: Vec<u64>,
}

impl CounterPresses {
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Per-button press counts with the smallest total that reach the target counters.
#[tracing::instrument(level = "debug", skip_all, fields(buttons = machine.buttons().len()))]
pub fn solve_counters(machine: &Machine, budget: &SearchBudget) -> Result<CounterPresses, SolveError> {
    let elimination = Elimination::new(machine)?;

    let combinations = elimination.combinations().unwrap_or(u128::MAX);
    tracing::debug!(
        free = elimination.free_count(),
        combinations,
        "counter equations eliminated"
    );
    if combinations > u128::from(budget.max_combinations) {
        return Err(SolveError::EnumerationBudget {
            combinations,
            limit: budget.max_combinations,
        });
    }

    let variables = elimination.variables();
    let mut search = Search {
        variables,
        values: vec![0; variables.len()],
        best: None,
    };
    search.descend(variables.len(), 0)?;

    let (_, counts) = search.best.ok_or(SolveError::InfeasibleCounters)?;
    debug_assert_eq!(
        machine.target_counters(),
        &machine.apply_counter_presses(&counts)
    );
    Ok(CounterPresses { counts })
}

/// Fewest total presses that take all-zero counters to the machine's targets.
pub fn min_presses_for_counters(machine: &Machine, budget: &SearchBudget) -> Result<u64, SolveError> {
    solve_counters(machine, budget).map(|presses| presses.total())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::machine::{Button, CounterVector, LightPattern, MAX_COUNTER_TARGET};
    use itertools::Itertools;
    use proptest::prelude::*;
    use rstest::rstest;

    fn machine(buttons: &[&[usize]], targets: &[u64]) -> Machine {
        let buttons = buttons.iter().map(|b| Button::new(b.to_vec())).collect();
        Machine::new(
            LightPattern::off(targets.len()),
            buttons,
            CounterVector::from(targets.to_vec()),
        )
        .unwrap()
    }

    fn solve(machine: &Machine) -> Result<CounterPresses, SolveError> {
        solve_counters(machine, &SearchBudget::default())
    }

    #[rstest]
    #[case::first("[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}", 10)]
    #[case::second("[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}", 12)]
    #[case::third("[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}", 11)]
    fn example_machines(#[case] line: &str, #[case] expected: u64) {
        let m: Machine = line.parse().unwrap();
        let presses = solve(&m).unwrap();
        assert_eq!(expected, presses.total());
        assert_eq!(m.target_counters(), &m.apply_counter_presses(presses.counts()));
    }

    #[test]
    fn two_buttons_sharing_a_counter() {
        let m = machine(&[&[0], &[0, 1]], &[3, 2]);
        let presses = solve(&m).unwrap();
        assert_eq!(&[1, 2], presses.counts());
        assert_eq!(Ok(3), min_presses_for_counters(&m, &SearchBudget::default()));
    }

    #[test]
    fn bounds_come_from_the_tightest_counter() {
        let m = machine(&[&[0, 1], &[1], &[2]], &[4, 9, 0]);
        assert_eq!(vec![Some(4), Some(9), Some(0)], upper_bounds(&m));
    }

    #[test]
    fn redundant_buttons_leave_free_variables() {
        // x0 + x1 + x2 = 5, only x0 can be eliminated.
        let m = machine(&[&[0], &[0], &[0]], &[5]);
        let elimination = Elimination::new(&m).unwrap();
        assert_eq!(2, elimination.free_count());
        assert_eq!(Some(36), elimination.combinations());
        assert_eq!(5, solve(&m).unwrap().total());
    }

    #[test]
    fn unwired_button_is_never_pressed() {
        let m = machine(&[&[], &[0]], &[2]);
        assert_eq!(&[0, 2], solve(&m).unwrap().counts());
    }

    #[rstest]
    #[case::no_buttons("[.] {1}")]
    #[case::contradiction("[..] (0,1) {1,2}")]
    #[case::fractional("[...] (0,1) (1,2) (0,2) {1,1,1}")]
    #[case::negative("[..] (0,1) (1) {1,0}")]
    fn infeasible_systems(#[case] line: &str) {
        let m: Machine = line.parse().unwrap();
        assert_eq!(Err(SolveError::InfeasibleCounters), solve(&m));
    }

    #[rstest]
    #[case::shared("[..] (0,1) {T,T}", 1)]
    #[case::separate("[..] (0) (1) {T,T}", 2)]
    #[case::chained("[...] (0) (0,1) (1,2) {T,T,T}", 2)]
    fn largest_accepted_targets(#[case] template: &str, #[case] multiple: u64) {
        let m: Machine = template.replace('T', &MAX_COUNTER_TARGET.to_string()).parse().unwrap();
        let presses = solve(&m).unwrap();
        assert_eq!(multiple * MAX_COUNTER_TARGET, presses.total());
        assert_eq!(m.target_counters(), &m.apply_counter_presses(presses.counts()));
    }

    #[test]
    fn nothing_to_do() {
        assert_eq!(0, solve(&machine(&[&[0]], &[0])).unwrap().total());
        assert_eq!(0, solve(&machine(&[], &[])).unwrap().total());
    }

    #[test]
    fn enumeration_budget_is_enforced() {
        let m = machine(&[&[0], &[0], &[0], &[0]], &[100]);
        let budget = SearchBudget {
            max_combinations: 1_000,
            ..SearchBudget::default()
        };
        assert_eq!(
            Err(SolveError::EnumerationBudget {
                combinations: 101 * 101 * 101,
                limit: 1_000
            }),
            solve_counters(&m, &budget)
        );
        assert_eq!(100, solve(&m).unwrap().total());
    }

    #[test]
    fn solving_twice_gives_the_same_answer() {
        let m = machine(&[&[0, 2, 3, 4], &[2, 3], &[0, 4], &[0, 1, 2], &[1, 2, 3, 4]], &[7, 5, 12, 7, 2]);
        assert_eq!(solve(&m), solve(&m));
    }

    const COUNTERS: usize = 3;
    const MAX_TARGET: u64 = 5;

    /// Tries every press count up to `MAX_TARGET`, which covers every button
    /// since no counter goes beyond it.
    fn brute_force(m: &Machine) -> Option<u64> {
        if m.buttons().is_empty() {
            let untouched = m.target_counters().as_slice().iter().all(|&t| t == 0);
            return untouched.then_some(0);
        }
        (0..m.buttons().len())
            .map(|_| 0..=MAX_TARGET)
            .multi_cartesian_product()
            .filter(|presses| &m.apply_counter_presses(presses) == m.target_counters())
            .map(|presses| presses.iter().sum())
            .min()
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            wiring in prop::collection::vec(0u8..1 << COUNTERS, 0..=3),
            targets in prop::collection::vec(0..=MAX_TARGET, COUNTERS),
        ) {
            let buttons: Vec<Vec<usize>> = wiring
                .iter()
                .map(|w| (0..COUNTERS).filter(|i| w & (1 << i) != 0).collect())
                .collect();
            let buttons: Vec<&[usize]> = buttons.iter().map(Vec::as_slice).collect();
            let m = machine(&buttons, &targets);

            let expected = brute_force(&m);
            match solve(&m) {
                Ok(presses) => {
                    prop_assert_eq!(expected, Some(presses.total()));
                    prop_assert_eq!(m.target_counters(), &m.apply_counter_presses(presses.counts()));
                }
                Err(err) => {
                    prop_assert_eq!(SolveError::InfeasibleCounters, err);
                    prop_assert_eq!(None, expected);
                }
            }
        }
    }
}
