//! Simulation result types

use std::collections::BTreeMap;
use std::fmt;

use crate::statistics::ExecutionStatistics;

/// Outcome of one run of a dynamic circuit
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Classical bits written during the run
    pub clbits: BTreeMap<usize, bool>,

    /// Product of the conditional probabilities of every mid-circuit outcome
    pub path_probability: f64,

    /// Counters collected while executing
    pub statistics: ExecutionStatistics,
}

impl RunResult {
    /// Value of `clbit`, if any measurement wrote it
    pub fn bit(&self, clbit: usize) -> Option<bool> {
        self.clbits.get(&clbit).copied()
    }

    /// Classical register as a bitstring, highest index first
    ///
    /// Bits that were never written read as `0`.
    pub fn bitstring(&self, num_clbits: usize) -> String {
        (0..num_clbits)
            .rev()
            .map(|c| if self.bit(c).unwrap_or(false) { '1' } else { '0' })
            .collect()
    }
}

/// Tally of classical registers over repeated sample-mode runs
///
/// Bitstrings iterate in lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementCounts {
    tally: BTreeMap<String, usize>,
    shots: usize,
}

impl MeasurementCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more run ending in `bitstring`
    pub fn record(&mut self, bitstring: String) {
        *self.tally.entry(bitstring).or_default() += 1;
        self.shots += 1;
    }

    pub fn get(&self, bitstring: &str) -> usize {
        self.tally.get(bitstring).copied().unwrap_or(0)
    }

    /// Observed frequency of `bitstring`, 0 before any run
    pub fn probability(&self, bitstring: &str) -> f64 {
        match self.shots {
            0 => 0.0,
            shots => self.get(bitstring) as f64 / shots as f64,
        }
    }

    pub fn total_shots(&self) -> usize {
        self.shots
    }

    /// Distinct bitstrings seen
    pub fn len(&self) -> usize {
        self.tally.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tally.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.tally.iter().map(|(bits, &n)| (bits.as_str(), n))
    }
}

impl fmt::Display for MeasurementCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} shots", self.shots)?;
        for (bits, n) in self.iter() {
            writeln!(f, "  {bits}: {n} ({:.4})", self.probability(bits))?;
        }
        Ok(())
    }
}
