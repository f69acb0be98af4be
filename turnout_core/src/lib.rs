//! Turnout Core - Spatial agent model of access to polling machines
//!
//! Voters are scattered over a grid on which every cell hosts a polling
//! location with some number of machines (often none). Each step a voter
//! looks for the nearest free machine it can see, walks toward it at the
//! speed of its socioeconomic stratum, and votes when it lands on one.
//! Voters who never find a machine stay disenfranchised.
//!
//! 1. **Space**: bounded multi-occupancy grid with von Neumann / Moore
//!    neighborhoods ([`space`])
//! 2. **Agents**: polling locations (replenishing resource) and voters
//!    (mobile searchers) as one tagged enum ([`agents`])
//! 3. **Scheduling**: seeded random activation grouped by breed ([`schedule`])
//!
//! # Usage
//!
//! ```ignore
//! use turnout_core::{CapacityMap, ModelConfig, VotingModel};
//!
//! let map = CapacityMap::load("data/pollinglocation_map.txt")?;
//! let mut model = VotingModel::new(ModelConfig::default(), &map)?;
//! model.run(200);
//! println!("{} voters never voted", model.live_voters());
//! ```

pub mod agents;
pub mod capacity;
pub mod error;
pub mod metrics;
pub mod model;
pub mod movement;
pub mod schedule;
pub mod seeds;
pub mod space;
pub mod world;

// Re-export key types for convenience
pub use agents::{Agent, AgentId, Breed, Capability, PollingLocation, Stratum, Voter};
pub use capacity::CapacityMap;
pub use error::{CapacityMapError, ModelError};
pub use metrics::{DataCollector, StepMetrics, StratumCounts};
pub use model::{ModelConfig, VoterSpec, VotingModel};
pub use movement::TieBreak;
pub use schedule::{Activation, BreedScheduler};
pub use seeds::SeedPlan;
pub use space::{MultiGrid, Neighborhood, Pos};
pub use world::World;
