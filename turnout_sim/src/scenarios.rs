//! Named scenarios for the turnout harness.

use serde::Serialize;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Full-size run with every invariant checked each step
    Baseline,

    /// One voter, one machine, clear path
    SingleMachine,

    /// Two voters racing for a single-capacity machine
    Contention,

    /// Zero-vision voter wandering until it stumbles on a machine
    BlindWalker,

    /// Every cell taken and no machines anywhere
    Gridlock,

    /// Two identical runs compared step by step
    Determinism,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::SingleMachine,
            ScenarioId::Contention,
            ScenarioId::BlindWalker,
            ScenarioId::Gridlock,
            ScenarioId::Determinism,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::SingleMachine => "single_machine",
            ScenarioId::Contention => "contention",
            ScenarioId::BlindWalker => "blind_walker",
            ScenarioId::Gridlock => "gridlock",
            ScenarioId::Determinism => "determinism",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Configured grid and population, invariants checked every step",
            ScenarioId::SingleMachine => "3x3 grid, machine at (1,1), voter at (0,0) reaches it and votes",
            ScenarioId::Contention => "Two voters next to one machine: one ballot per availability window",
            ScenarioId::BlindWalker => "Vision 0: random walk until the only machine is stepped on",
            ScenarioId::Gridlock => "Full 3x3 grid without machines: nobody can move",
            ScenarioId::Determinism => "Same seed twice yields identical metrics at every step",
        }
    }

    /// True if the scenario uses the runner's grid and population settings
    /// rather than a fixed layout.
    pub fn is_configurable(&self) -> bool {
        matches!(self, ScenarioId::Baseline | ScenarioId::Determinism)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "baseline" | "base" => Ok(ScenarioId::Baseline),
            "single_machine" | "singlemachine" => Ok(ScenarioId::SingleMachine),
            "contention" => Ok(ScenarioId::Contention),
            "blind_walker" | "blindwalker" => Ok(ScenarioId::BlindWalker),
            "gridlock" => Ok(ScenarioId::Gridlock),
            "determinism" | "replay" => Ok(ScenarioId::Determinism),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert!(!scenario.description().is_empty());
        }
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!("Blind-Walker".parse(), Ok(ScenarioId::BlindWalker));
        assert_eq!("replay".parse(), Ok(ScenarioId::Determinism));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_configurable() {
        assert!(ScenarioId::Baseline.is_configurable());
        assert!(!ScenarioId::Gridlock.is_configurable());
    }
}
