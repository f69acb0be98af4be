//! Per-step aggregate series.
//!
//! One [`StepMetrics`] row is collected after model construction (step 0) and
//! after every step. Stratum percentages are measured against the assumed
//! population shares, not the sampled ones, so they can exceed 1.0.

use serde::{Deserialize, Serialize};

use crate::agents::{Stratum, Voter};

pub const RICH: &str = "Rich";
pub const POOR: &str = "Poor";
pub const MIDDLE_CLASS: &str = "Middle Class";
pub const DISENFRANCHISED: &str = "Disenfranchised Voters";

/// Every named series, in reporter order.
pub const SERIES: [&str; 4] = [RICH, POOR, MIDDLE_CLASS, DISENFRANCHISED];

/// Live voters per stratum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StratumCounts {
    pub poor: usize,
    pub middle: usize,
    pub rich: usize,
    /// Voters whose speed matches no stratum.
    pub other: usize,
}

impl StratumCounts {
    pub fn tally<'a>(voters: impl IntoIterator<Item = &'a Voter>) -> Self {
        let mut counts = Self::default();
        for voter in voters {
            match voter.stratum() {
                Some(Stratum::Poor) => counts.poor += 1,
                Some(Stratum::Middle) => counts.middle += 1,
                Some(Stratum::Rich) => counts.rich += 1,
                None => counts.other += 1,
            }
        }
        counts
    }

    pub fn get(&self, stratum: Stratum) -> usize {
        match stratum {
            Stratum::Poor => self.poor,
            Stratum::Middle => self.middle,
            Stratum::Rich => self.rich,
        }
    }

    pub fn total(&self) -> usize {
        self.poor + self.middle + self.rich + self.other
    }
}

/// Aggregates for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step: u64,
    pub poor: usize,
    pub middle: usize,
    pub rich: usize,
    /// Voters who have not voted yet.
    pub disenfranchised: usize,
    pub pc_disenfranchised: f64,
    pub pc_poor: f64,
    pub pc_middle: f64,
    pub pc_rich: f64,
}

impl StepMetrics {
    /// Builds a row from live counts and the initial population size.
    pub fn from_counts(step: u64, counts: StratumCounts, initial_voters: usize) -> Self {
        let initial = initial_voters as f64;
        Self {
            step,
            poor: counts.poor,
            middle: counts.middle,
            rich: counts.rich,
            disenfranchised: counts.total(),
            pc_disenfranchised: ratio(counts.total() as f64, initial),
            pc_poor: ratio(counts.poor as f64, Stratum::Poor.share() * initial),
            pc_middle: ratio(counts.middle as f64, Stratum::Middle.share() * initial),
            pc_rich: ratio(counts.rich as f64, Stratum::Rich.share() * initial),
        }
    }

    /// Value of a named series.
    pub fn series(&self, label: &str) -> Option<usize> {
        match label {
            RICH => Some(self.rich),
            POOR => Some(self.poor),
            MIDDLE_CLASS => Some(self.middle),
            DISENFRANCHISED => Some(self.disenfranchised),
            _ => None,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Machines per 100 initial voters, rounded down. 0 with no voters.
pub fn machines_per_100(total_machines: u64, initial_voters: usize) -> u64 {
    if initial_voters == 0 {
        return 0;
    }
    total_machines * 100 / initial_voters as u64
}

/// Row store for the collected series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataCollector {
    rows: Vec<StepMetrics>,
}

impl DataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, row: StepMetrics) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[StepMetrics] {
        &self.rows
    }

    pub fn latest(&self) -> Option<&StepMetrics> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One named series across every collected step.
    pub fn series(&self, label: &str) -> Option<Vec<usize>> {
        self.rows.iter().map(|row| row.series(label)).collect()
    }
}
