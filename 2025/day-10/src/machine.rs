use bitvec::prelude::*;
use itertools::Itertools;
use std::fmt;

use crate::error::MachineError;

/// Largest counter target a machine accepts. Keeps exact elimination well
/// inside `i64` even after sums and rational scaling.
pub const MAX_COUNTER_TARGET: u64 = u32::MAX as u64;

/// A bit vector backed by `usize` words with Least Significant Bit first ordering.
pub type Row = BitVec<usize, Lsb0>;

/// Indices wired to a single button. The same indices address lights and counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Button {
    indices: Vec<usize>,
}

impl Button {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.indices.iter().join(","))
    }
}

/// On/off state of every light in a machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LightPattern(Row);

impl LightPattern {
    /// All lights off.
    pub fn off(len: usize) -> Self {
        Self(Row::repeat(false, len))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_on(&self, index: usize) -> bool {
        self.0.get(index).is_some_and(|bit| *bit)
    }

    pub fn is_all_off(&self) -> bool {
        self.0.not_any()
    }

    /// Flips every light wired to `button`.
    pub fn toggle(&mut self, button: &Button) {
        for &i in button.indices() {
            let lit = self.0[i];
            self.0.set(i, !lit);
        }
    }

    /// Packs the pattern into a word, light `i` at bit `i`.
    /// `None` when the pattern does not fit in 64 bits.
    pub fn to_mask(&self) -> Option<u64> {
        if self.0.len() > u64::BITS as usize {
            return None;
        }
        Some(self.0.iter_ones().fold(0, |mask, i| mask | 1u64 << i))
    }
}

impl FromIterator<bool> for LightPattern {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for LightPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: String = self.0.iter().map(|b| if *b { '#' } else { '.' }).collect();
        write!(f, "[{cells}]")
    }
}

/// Accumulated value of every counter in a machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterVector(Vec<u64>);

impl CounterVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Presses `button` `times` times, bumping each of its counters by `times`.
    pub fn press(&mut self, button: &Button, times: u64) {
        for &i in button.indices() {
            self.0[i] = self.0[i].saturating_add(times);
        }
    }
}

impl From<Vec<u64>> for CounterVector {
    fn from(values: Vec<u64>) -> Self {
        Self(values)
    }
}

impl fmt::Display for CounterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

/// One factory machine: its buttons and both targets.
///
/// Every button index is known to be in range for the lights and the counters,
/// and no button lists an index twice. Solvers rely on this without checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    buttons: Vec<Button>,
    target_lights: LightPattern,
    target_counters: CounterVector,
}

impl Machine {
    pub fn new(
        target_lights: LightPattern,
        buttons: Vec<Button>,
        target_counters: CounterVector,
    ) -> Result<Self, MachineError> {
        let lights = target_lights.len();
        let counters = target_counters.len();

        if let Some((counter, &target)) = target_counters
            .as_slice()
            .iter()
            .enumerate()
            .find(|(_, t)| **t > MAX_COUNTER_TARGET)
        {
            return Err(MachineError::TargetTooLarge {
                counter,
                target,
                max: MAX_COUNTER_TARGET,
            });
        }

        for (b, button) in buttons.iter().enumerate() {
            let mut seen = Row::repeat(false, lights.min(counters));
            for &index in button.indices() {
                if index >= lights || index >= counters {
                    return Err(MachineError::IndexOutOfRange {
                        button: b,
                        index,
                        lights,
                        counters,
                    });
                }
                if seen.replace(index, true) {
                    return Err(MachineError::DuplicateIndex { button: b, index });
                }
            }
        }

        Ok(Self {
            buttons,
            target_lights,
            target_counters,
        })
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn target_lights(&self) -> &LightPattern {
        &self.target_lights
    }

    pub fn target_counters(&self) -> &CounterVector {
        &self.target_counters
    }

    pub fn light_count(&self) -> usize {
        self.target_lights.len()
    }

    pub fn counter_count(&self) -> usize {
        self.target_counters.len()
    }

    /// Lights after pressing the buttons at `sequence`, in order, starting from all off.
    /// `None` if the sequence names a button the machine doesn't have.
    pub fn apply_light_presses(&self, sequence: &[usize]) -> Option<LightPattern> {
        let mut lights = LightPattern::off(self.light_count());
        for &b in sequence {
            lights.toggle(self.buttons.get(b)?);
        }
        Some(lights)
    }

    /// Counters after pressing button `b` `presses[b]` times, starting from zero.
    pub fn apply_counter_presses(&self, presses: &[u64]) -> CounterVector {
        let mut counters = CounterVector::zeros(self.counter_count());
        for (button, &times) in self.buttons.iter().zip(presses) {
            counters.press(button, times);
        }
        counters
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_lights)?;
        for button in &self.buttons {
            write!(f, " {button}")?;
        }
        write!(f, " {}", self.target_counters)
    }
}
