//! Forced measurement outcomes for preset-mode runs

use std::collections::{HashMap, VecDeque};

/// How measurement outcomes are chosen during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Draw every outcome from the kernel's distribution
    #[default]
    Sample,
    /// Force mid-circuit outcomes from [`Presets`]
    ///
    /// The run's path probability is then the exact probability of the one
    /// execution path those outcomes select.
    Preset,
}

/// Per-classical-bit queues of forced outcomes, consumed front to back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presets {
    queues: HashMap<usize, VecDeque<bool>>,
}

impl Presets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `outcomes` to the queue of `clbit`, builder style
    pub fn with(mut self, clbit: usize, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.extend(clbit, outcomes);
        self
    }

    pub fn extend(&mut self, clbit: usize, outcomes: impl IntoIterator<Item = bool>) {
        self.queues.entry(clbit).or_default().extend(outcomes);
    }

    /// Queue `k − 1` copies of `repeat` followed by one `last`
    ///
    /// This is the outcome sequence of a loop that succeeds on trial `k`.
    pub fn trial_sequence(clbit: usize, k: usize, repeat: bool, last: bool) -> Self {
        let outcomes = std::iter::repeat(repeat)
            .take(k.saturating_sub(1))
            .chain(std::iter::once(last));
        Self::new().with(clbit, outcomes)
    }

    /// Take the next forced outcome for `clbit`
    pub fn pop(&mut self, clbit: usize) -> Option<bool> {
        self.queues.get_mut(&clbit).and_then(VecDeque::pop_front)
    }

    /// Outcomes still queued for `clbit`
    pub fn remaining(&self, clbit: usize) -> usize {
        self.queues.get(&clbit).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }
}

impl FromIterator<(usize, Vec<bool>)> for Presets {
    fn from_iter<I: IntoIterator<Item = (usize, Vec<bool>)>>(iter: I) -> Self {
        let mut presets = Presets::new();
        for (clbit, outcomes) in iter {
            presets.extend(clbit, outcomes);
        }
        presets
    }
}

impl From<HashMap<usize, Vec<bool>>> for Presets {
    fn from(map: HashMap<usize, Vec<bool>>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order() {
        let mut presets = Presets::new().with(2, [true, false]);
        assert_eq!(presets.remaining(2), 2);
        assert_eq!(presets.pop(2), Some(true));
        assert_eq!(presets.pop(2), Some(false));
        assert_eq!(presets.pop(2), None);
        assert_eq!(presets.pop(0), None);
        assert!(presets.is_empty());
    }

    #[test]
    fn test_trial_sequence() {
        let mut presets = Presets::trial_sequence(0, 3, true, false);
        let drawn: Vec<_> = std::iter::from_fn(|| presets.pop(0)).collect();
        assert_eq!(drawn, vec![true, true, false]);
    }

    #[test]
    fn test_from_map() {
        let mut map = HashMap::new();
        map.insert(1, vec![false]);
        let presets = Presets::from(map);
        assert_eq!(presets.remaining(1), 1);
    }
}
