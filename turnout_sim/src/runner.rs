//! Scenario runner - builds, steps and judges turnout scenarios.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use turnout_core::{
    CapacityMap, ModelConfig, ModelError, Neighborhood, Pos, TieBreak, VoterSpec, VotingModel,
};

use crate::exporter::{SimExport, SimFrame};
use crate::oracle::{self, Oracle, Violation};
use crate::scenarios::ScenarioId;

/// Machines scattered over the grid when no capacity map is supplied.
pub const DEFAULT_MACHINES: usize = 116;

/// Results from running a scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Model steps executed
    pub total_steps: u64,

    /// Voters placed at construction
    pub initial_voters: usize,

    /// Voters who never voted
    pub final_voters: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Oracle checks that passed
    pub invariant_checks: u64,

    /// Ballots cast over the whole run
    pub ballots: u64,

    pub total_machines: u64,
    pub machines_per_100: u64,

    /// Share of the initial population that never voted
    pub pc_disenfranchised: f64,
    pub pc_poor: f64,
    pub pc_middle: f64,
    pub pc_rich: f64,
}

impl ScenarioMetrics {
    fn from_model(model: &VotingModel, invariant_checks: u64) -> Self {
        let latest = model.metrics().latest();
        Self {
            invariant_checks,
            ballots: model.voted().iter().map(|v| u64::from(v.votes)).sum(),
            total_machines: model.total_machines(),
            machines_per_100: model.machines_per_100(),
            pc_disenfranchised: latest.map_or(0.0, |r| r.pc_disenfranchised),
            pc_poor: latest.map_or(0.0, |r| r.pc_poor),
            pc_middle: latest.map_or(0.0, |r| r.pc_middle),
            pc_rich: latest.map_or(0.0, |r| r.pc_rich),
        }
    }
}

/// A model under observation: steps it, checks it, and optionally records it.
struct Session<'a> {
    model: VotingModel,
    oracle: Oracle,
    export: Option<&'a mut SimExport>,
    export_interval: u64,
}

impl<'a> Session<'a> {
    fn new(model: VotingModel, mut export: Option<&'a mut SimExport>, export_interval: u64) -> Self {
        if let Some(export) = export.as_deref_mut() {
            export.begin(&model);
        }
        Self {
            oracle: Oracle::new(&model),
            model,
            export,
            export_interval: export_interval.max(1),
        }
    }

    fn step(&mut self) -> Result<(), Violation> {
        self.model.step();
        self.oracle.check(&self.model)?;

        let time = self.model.time();
        if time % self.export_interval == 0 {
            if let Some(export) = self.export.as_deref_mut() {
                export.add_frame(SimFrame::capture(&self.model));
            }
        }
        if time % 25 == 0 {
            debug!(
                "  step={} | live={} | voted={}",
                time,
                self.model.live_voters(),
                self.model.voted().len()
            );
        }
        Ok(())
    }

    fn run(&mut self, steps: u64) -> Result<(), Violation> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Steps until every voter has voted or `max_steps` have run.
    fn run_until_done(&mut self, max_steps: u64) -> Result<(), Violation> {
        for _ in 0..max_steps {
            if self.model.live_voters() == 0 {
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    fn finish(self, scenario: ScenarioId, seed: u64, verdict: Result<(), String>) -> ScenarioResult {
        let passed = verdict.is_ok();
        let failure_reason = verdict.err();
        if let Some(export) = self.export {
            export.finalize(&self.model, passed, failure_reason.clone());
        }

        ScenarioResult {
            scenario,
            seed,
            passed,
            total_steps: self.model.time(),
            initial_voters: self.model.initial_voters(),
            final_voters: self.model.live_voters(),
            failure_reason,
            metrics: ScenarioMetrics::from_model(&self.model, self.oracle.checks()),
        }
    }
}

/// Runs turnout scenarios.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    width: usize,
    height: usize,
    voters: usize,
    vision: usize,

    /// Steps for the configurable scenarios
    steps: u64,

    neighborhood: Neighborhood,
    tie_break: TieBreak,

    /// Supplied capacity map; scattered machines otherwise
    capacity_map: Option<CapacityMap>,

    /// Frame interval when exporting
    export_interval: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner with the model's default grid and population.
    pub fn new(seed: u64) -> Self {
        let defaults = ModelConfig::default();
        Self {
            seed,
            width: defaults.width,
            height: defaults.height,
            voters: defaults.initial_voters,
            vision: defaults.vision,
            steps: 200,
            neighborhood: defaults.neighborhood,
            tie_break: defaults.tie_break,
            capacity_map: None,
            export_interval: 10,
        }
    }

    /// Sets the grid size.
    pub fn with_grid(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the initial population.
    pub fn with_voters(mut self, voters: usize) -> Self {
        self.voters = voters;
        self
    }

    /// Sets the vision radius.
    pub fn with_vision(mut self, vision: usize) -> Self {
        self.vision = vision;
        self
    }

    /// Sets the step count.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Uses a fixed capacity map instead of scattered machines.
    pub fn with_capacity_map(mut self, map: CapacityMap) -> Self {
        self.capacity_map = Some(map);
        self
    }

    pub fn with_export_interval(mut self, interval: u64) -> Self {
        self.export_interval = interval;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario while recording frames and metrics.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let mut export = SimExport::new(scenario.name(), self.seed);
        let result = self.execute(scenario, Some(&mut export));
        if export.config.is_none() {
            export.passed = result.passed;
            export.failure_reason = result.failure_reason.clone();
        }
        (result, export)
    }

    fn execute(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let model = match self.build(scenario) {
            Ok(model) => model,
            Err(e) => {
                warn!("{}: could not build model: {}", scenario.name(), e);
                return ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_steps: 0,
                    initial_voters: 0,
                    final_voters: 0,
                    failure_reason: Some(e.to_string()),
                    metrics: ScenarioMetrics::default(),
                };
            }
        };

        let mut session = Session::new(model, export, self.export_interval);
        let verdict = match scenario {
            ScenarioId::Baseline => self.judge_baseline(&mut session),
            ScenarioId::SingleMachine => judge_single_machine(&mut session),
            ScenarioId::Contention => judge_contention(&mut session),
            ScenarioId::BlindWalker => judge_blind_walker(&mut session),
            ScenarioId::Gridlock => judge_gridlock(&mut session),
            ScenarioId::Determinism => self.judge_determinism(&mut session),
        };

        match &verdict {
            Ok(()) => info!(
                "✓ {} complete: {} of {} voters voted in {} steps",
                scenario.name(),
                session.model.voted().len(),
                session.model.initial_voters(),
                session.model.time()
            ),
            Err(reason) => warn!("{} failed: {}", scenario.name(), reason),
        }

        session.finish(scenario, self.seed, verdict)
    }

    /// Model configuration for the configurable scenarios.
    pub fn config(&self) -> ModelConfig {
        ModelConfig {
            width: self.width,
            height: self.height,
            initial_voters: self.voters,
            vision: self.vision,
            neighborhood: self.neighborhood,
            tie_break: self.tie_break,
            seed: self.seed,
            ..ModelConfig::default()
        }
    }

    /// Config for a fixed layout: runner policies and seed, fixture grid.
    fn fixture_config(&self, width: usize, height: usize) -> ModelConfig {
        ModelConfig {
            width,
            height,
            initial_voters: 0,
            ..self.config()
        }
    }

    /// The supplied capacity map, or machines scattered with a seed-derived layout.
    pub fn capacity_map(&self) -> CapacityMap {
        match &self.capacity_map {
            Some(map) => map.clone(),
            None => {
                let layout_seed = self.seed.wrapping_mul(0x2545f4914f6cdd1d);
                let mut rng = ChaCha8Rng::seed_from_u64(layout_seed);
                CapacityMap::scatter(self.width, self.height, DEFAULT_MACHINES, &mut rng)
            }
        }
    }

    fn build(&self, scenario: ScenarioId) -> Result<VotingModel, ModelError> {
        match scenario {
            ScenarioId::Baseline | ScenarioId::Determinism => {
                VotingModel::new(self.config(), &self.capacity_map())
            }
            ScenarioId::SingleMachine => VotingModel::with_voters(
                self.fixture_config(3, 3),
                &CapacityMap::uniform(3, 3, 0).with(Pos::new(1, 1), 1),
                &[VoterSpec::new((0, 0), 5, 1)],
            ),
            ScenarioId::Contention => VotingModel::with_voters(
                self.fixture_config(3, 3),
                &CapacityMap::uniform(3, 3, 0).with(Pos::new(1, 1), 1),
                &[VoterSpec::new((0, 1), 2, 1), VoterSpec::new((2, 1), 2, 1)],
            ),
            ScenarioId::BlindWalker => VotingModel::with_voters(
                self.fixture_config(5, 5),
                &CapacityMap::uniform(5, 5, 0).with(Pos::new(4, 4), 1),
                &[VoterSpec::new((0, 0), 0, 1)],
            ),
            ScenarioId::Gridlock => {
                let specs: Vec<VoterSpec> = (0..3)
                    .flat_map(|x| (0..3).map(move |y| VoterSpec::new(Pos::new(x, y), 2, 1)))
                    .collect();
                VotingModel::with_voters(
                    self.fixture_config(3, 3),
                    &CapacityMap::uniform(3, 3, 0),
                    &specs,
                )
            }
        }
    }

    /// Invariants only; turnout itself is whatever the configuration yields.
    fn judge_baseline(&self, session: &mut Session<'_>) -> Result<(), String> {
        info!(
            "Initial number of voters: {} ({} machines, {} per 100 voters)",
            session.model.live_voters(),
            session.model.total_machines(),
            session.model.machines_per_100()
        );
        session.run(self.steps).map_err(|v| v.to_string())?;
        info!("Final number of voters: {}", session.model.live_voters());
        Ok(())
    }

    /// Two models from identical inputs must agree at every step.
    fn judge_determinism(&self, session: &mut Session<'_>) -> Result<(), String> {
        let mut replay = self.build(ScenarioId::Determinism).map_err(|e| e.to_string())?;
        session.run(self.steps).map_err(|v| v.to_string())?;
        replay.run(self.steps);

        oracle::compare_histories(session.model.metrics().rows(), replay.metrics().rows())
            .map_err(|v| v.to_string())?;
        if session.model.voted() != replay.voted() {
            return Err("Runs voted in a different order".to_string());
        }
        Ok(())
    }
}

/// The lone voter reaches (1,1) in two steps and votes.
fn judge_single_machine(session: &mut Session<'_>) -> Result<(), String> {
    let machine = Pos::new(1, 1);
    session.run_until_done(10).map_err(|v| v.to_string())?;

    let model = &session.model;
    let Some(voter) = model.voted().first() else {
        return Err(format!("Voter never voted in {} steps", model.time()));
    };
    if voter.pos != machine {
        return Err(format!("Voter voted at {} instead of {}", voter.pos, machine));
    }
    if model.time() > 2 {
        return Err(format!("Voter needed {} steps for a 2-step walk", model.time()));
    }
    if model.capacity_at(machine) != Some(0) {
        return Err("Machine was not consumed".to_string());
    }
    Ok(())
}

/// Only one ballot per availability window, then both eventually vote.
fn judge_contention(session: &mut Session<'_>) -> Result<(), String> {
    let machine = Pos::new(1, 1);
    session.step().map_err(|v| v.to_string())?;

    let model = &session.model;
    if model.voted().len() != 1 {
        return Err(format!(
            "{} voters voted on a single free machine",
            model.voted().len()
        ));
    }
    if model.capacity_at(machine) != Some(0) {
        return Err("Machine still free after a vote".to_string());
    }

    session.run_until_done(20).map_err(|v| v.to_string())?;
    if session.model.live_voters() != 0 {
        return Err("Second voter never got the machine".to_string());
    }
    Ok(())
}

/// The walker moves at most one cell a step and eventually finds the machine.
fn judge_blind_walker(session: &mut Session<'_>) -> Result<(), String> {
    // The oracle rejects any step longer than the walker's speed.
    session.run_until_done(5000).map_err(|v| v.to_string())?;

    match session.model.voted().first() {
        Some(voter) if voter.pos == Pos::new(4, 4) => Ok(()),
        Some(voter) => Err(format!("Walker voted at {} without a machine", voter.pos)),
        None => Err(format!(
            "Walker never found the machine in {} steps",
            session.model.time()
        )),
    }
}

/// Nobody moves and nobody votes.
fn judge_gridlock(session: &mut Session<'_>) -> Result<(), String> {
    let before: Vec<Pos> = session.model.world().voters().map(|v| v.pos).collect();
    session.run(10).map_err(|v| v.to_string())?;
    let after: Vec<Pos> = session.model.world().voters().map(|v| v.pos).collect();

    if before != after {
        return Err("A voter moved on a full grid".to_string());
    }
    if session.model.live_voters() != before.len() {
        return Err("A voter voted without machines".to_string());
    }
    Ok(())
}
