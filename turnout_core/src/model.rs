//! The model driver.
//!
//! `VotingModel` owns the world, the breed scheduler, the movement RNG and the
//! data collector. Construction lays one polling location on every cell (in
//! scan order, so polling location ids follow the grid), registers them,
//! then places voters on distinct cells. Polling locations are registered
//! first and therefore regenerate before any voter moves in a step.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agents::{Agent, AgentId, Breed, PollingLocation, Stratum, Voter};
use crate::capacity::CapacityMap;
use crate::error::ModelError;
use crate::metrics::{self, DataCollector, StepMetrics, StratumCounts};
use crate::movement::TieBreak;
use crate::schedule::BreedScheduler;
use crate::seeds::SeedPlan;
use crate::space::{Neighborhood, Pos};
use crate::world::World;

/// Configuration for a model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub width: usize,
    pub height: usize,

    /// Voters placed at construction
    pub initial_voters: usize,

    /// Vision radius shared by every voter
    pub vision: usize,

    pub neighborhood: Neighborhood,
    pub tie_break: TieBreak,

    /// Sampling weights for poor, middle and rich voters
    pub strata_weights: [f64; 3],

    /// Master seed for determinism
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            initial_voters: 500,
            vision: 10,
            neighborhood: Neighborhood::VonNeumann,
            tie_break: TieBreak::ScanOrder,
            strata_weights: [
                Stratum::Poor.share(),
                Stratum::Middle.share(),
                Stratum::Rich.share(),
            ],
            seed: 42,
        }
    }
}

/// A voter placed by hand instead of sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSpec {
    pub pos: Pos,
    pub vision: usize,
    pub speed: usize,
}

impl VoterSpec {
    pub fn new(pos: impl Into<Pos>, vision: usize, speed: usize) -> Self {
        Self {
            pos: pos.into(),
            vision,
            speed,
        }
    }
}

/// The voting model.
#[derive(Debug, Clone)]
pub struct VotingModel {
    config: ModelConfig,
    seeds: SeedPlan,
    world: World,
    schedule: BreedScheduler,
    movement_rng: ChaCha8Rng,
    collector: DataCollector,
    initial_voters: usize,
    total_machines: u64,
}

impl VotingModel {
    /// Builds a model with `config.initial_voters` randomly placed voters.
    pub fn new(config: ModelConfig, capacity: &CapacityMap) -> Result<Self, ModelError> {
        let mut model = Self::empty(config, capacity)?;
        model.populate()?;
        model.collect();

        info!(
            "Model ready: {}x{} grid, {} voters, {} machines ({} per 100 voters)",
            model.config.width,
            model.config.height,
            model.initial_voters,
            model.total_machines,
            model.machines_per_100()
        );
        Ok(model)
    }

    /// Builds a model with exactly the given voters.
    ///
    /// `config.initial_voters` is replaced by the number of specs.
    pub fn with_voters(
        mut config: ModelConfig,
        capacity: &CapacityMap,
        voters: &[VoterSpec],
    ) -> Result<Self, ModelError> {
        config.initial_voters = voters.len();
        let mut model = Self::empty(config, capacity)?;
        for spec in voters {
            model.spawn_voter(*spec)?;
        }
        model.collect();
        Ok(model)
    }

    /// Grid and polling locations only; no voters and no metrics row yet.
    fn empty(config: ModelConfig, capacity: &CapacityMap) -> Result<Self, ModelError> {
        let (width, height) = (config.width, config.height);
        if width == 0 || height == 0 {
            return Err(ModelError::EmptyGrid { width, height });
        }
        capacity.ensure_dimensions(width, height)?;

        let seeds = SeedPlan::new(config.seed);
        let mut world = World::new(width, height);
        let mut schedule = BreedScheduler::with_rng(seeds.schedule_rng());

        let cells: Vec<Pos> = world.grid().coord_iter().collect();
        for pos in cells {
            let max = capacity.get(pos);
            let id = world.spawn(|id| Agent::PollingLocation(PollingLocation::new(id, pos, max)));
            schedule.add_id(Breed::PollingLocation, id);
        }

        Ok(Self {
            movement_rng: seeds.movement_rng(),
            total_machines: capacity.total_machines(),
            initial_voters: config.initial_voters,
            config,
            seeds,
            world,
            schedule,
            collector: DataCollector::new(),
        })
    }

    /// Places a single voter on a free cell and schedules it.
    fn spawn_voter(&mut self, spec: VoterSpec) -> Result<AgentId, ModelError> {
        let grid = self.world.grid();
        if !grid.in_bounds(spec.pos) {
            return Err(ModelError::out_of_bounds(spec.pos, grid.width(), grid.height()));
        }
        if self.world.is_occupied(spec.pos, None) {
            return Err(ModelError::CellTaken {
                x: spec.pos.x,
                y: spec.pos.y,
            });
        }

        let neighborhood = self.config.neighborhood;
        let id = self.world.spawn(|id| {
            Agent::Voter(
                Voter::new(id, spec.pos, spec.vision, spec.speed).with_neighborhood(neighborhood),
            )
        });
        self.schedule.add_id(Breed::Voter, id);
        Ok(id)
    }

    /// Samples voters onto distinct random cells.
    fn populate(&mut self) -> Result<(), ModelError> {
        let cells = self.world.grid().num_cells();
        let requested = self.config.initial_voters;
        if requested > cells {
            return Err(ModelError::TooManyVoters { requested, cells });
        }

        let strata = WeightedIndex::new(self.config.strata_weights)
            .map_err(|e| ModelError::InvalidStrataWeights(e.to_string()))?;
        let mut rng = self.seeds.placement_rng();
        let (width, height) = (self.config.width, self.config.height);

        for _ in 0..requested {
            let mut pos = Pos::new(rng.gen_range(0..width), rng.gen_range(0..height));
            while self.world.is_occupied(pos, None) {
                pos = Pos::new(rng.gen_range(0..width), rng.gen_range(0..height));
            }
            let speed = Stratum::ALL[strata.sample(&mut rng)].speed();
            self.spawn_voter(VoterSpec::new(pos, self.config.vision, speed))?;
        }

        debug!("Placed {} voters", requested);
        Ok(())
    }

    fn collect(&mut self) {
        let counts = StratumCounts::tally(self.world.voters());
        let row = StepMetrics::from_counts(self.schedule.steps(), counts, self.initial_voters);
        self.collector.collect(row);
    }

    /// Advances the model by one step and records its metrics.
    pub fn step(&mut self) {
        let Self {
            world,
            schedule,
            movement_rng,
            config,
            ..
        } = self;
        let tie_break = config.tie_break;
        schedule.step(|_, id| world.activate(id, tie_break, &mut *movement_rng));

        self.collect();
        debug!("[{}, {}]", self.time(), self.live_voters());
    }

    /// Runs `steps` steps, logging the voter count before and after.
    pub fn run(&mut self, steps: u64) {
        info!("Initial number of voters: {}", self.live_voters());
        for _ in 0..steps {
            self.step();
        }
        info!("Final number of voters: {}", self.live_voters());
    }

    /// Completed steps.
    pub fn time(&self) -> u64 {
        self.schedule.steps()
    }

    /// Voters who have not voted yet.
    pub fn live_voters(&self) -> usize {
        self.schedule.count(Breed::Voter)
    }

    pub fn initial_voters(&self) -> usize {
        self.initial_voters
    }

    /// Sum of every location's maximum capacity.
    pub fn total_machines(&self) -> u64 {
        self.total_machines
    }

    pub fn machines_per_100(&self) -> u64 {
        metrics::machines_per_100(self.total_machines, self.initial_voters)
    }

    pub fn metrics(&self) -> &DataCollector {
        &self.collector
    }

    /// Voters who have voted, in voting order.
    pub fn voted(&self) -> &[Voter] {
        self.world.voted()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn schedule(&self) -> &BreedScheduler {
        &self.schedule
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn seeds(&self) -> &SeedPlan {
        &self.seeds
    }

    /// Current capacity of the polling location on a cell.
    pub fn capacity_at(&self, pos: Pos) -> Option<u32> {
        self.world.polling_location_at(pos).map(|loc| loc.capacity)
    }
}
