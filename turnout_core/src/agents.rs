//! Agent definitions: polling locations (resources) and voters (mobile).
//!
//! Agents are a closed set, so they are a tagged variant rather than trait
//! objects. Behaviour that needs the grid lives in [`crate::world`] and
//! [`crate::movement`]; the types here only own their state.

use serde::{Deserialize, Serialize};

use crate::space::{Neighborhood, Pos};

/// Unique identifier for an agent within one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scheduler grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breed {
    PollingLocation,
    Voter,
}

impl Breed {
    pub fn name(&self) -> &'static str {
        match self {
            Breed::PollingLocation => "polling_location",
            Breed::Voter => "voter",
        }
    }

    /// What agents of this breed can do.
    pub fn capability(&self) -> Capability {
        match self {
            Breed::PollingLocation => Capability::Resource,
            Breed::Voter => Capability::Mobile,
        }
    }
}

impl std::fmt::Display for Breed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Capability an agent exposes to the rest of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Moves around and occupies cells.
    Mobile,
    /// Fixed, holds a consumable capacity.
    Resource,
}

/// Socioeconomic stratum, encoded by travel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Poor,
    Middle,
    Rich,
}

impl Stratum {
    pub const ALL: [Stratum; 3] = [Stratum::Poor, Stratum::Middle, Stratum::Rich];

    /// Cells a voter of this stratum can cover per step.
    pub fn speed(&self) -> usize {
        match self {
            Stratum::Poor => 1,
            Stratum::Middle => 3,
            Stratum::Rich => 6,
        }
    }

    /// Assumed share of the initial population (also the default sampling weight).
    pub fn share(&self) -> f64 {
        match self {
            Stratum::Poor => 0.6,
            Stratum::Middle => 0.3,
            Stratum::Rich => 0.1,
        }
    }

    /// Reporter label used in collected series and charts.
    pub fn label(&self) -> &'static str {
        match self {
            Stratum::Poor => "Poor",
            Stratum::Middle => "Middle Class",
            Stratum::Rich => "Rich",
        }
    }

    pub fn from_speed(speed: usize) -> Option<Stratum> {
        Stratum::ALL.into_iter().find(|s| s.speed() == speed)
    }
}

/// A polling location: one per cell, never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingLocation {
    pub id: AgentId,
    pub pos: Pos,
    /// Machines currently free.
    pub capacity: u32,
    /// Machines installed at this location.
    pub max_capacity: u32,
}

impl PollingLocation {
    /// Creates a location with every machine free.
    pub fn new(id: AgentId, pos: Pos, max_capacity: u32) -> Self {
        Self {
            id,
            pos,
            capacity: max_capacity,
            max_capacity,
        }
    }

    /// Frees one machine, up to the installed maximum.
    pub fn step(&mut self) {
        self.capacity = self.capacity.saturating_add(1).min(self.max_capacity);
    }

    pub fn is_available(&self) -> bool {
        self.capacity > 0
    }

    /// Consumes every free machine and returns how many there were.
    pub fn take_all(&mut self) -> u32 {
        std::mem::take(&mut self.capacity)
    }
}

/// A voter searching for a free machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub id: AgentId,
    pub pos: Pos,
    /// Radius within which free machines are detected.
    pub vision: usize,
    /// Radius the voter can move per step.
    pub speed: usize,
    /// Ballots cast; positive once the voter has voted.
    pub votes: u32,
    /// Shape used for both vision and movement.
    pub neighborhood: Neighborhood,
}

impl Voter {
    pub fn new(id: AgentId, pos: Pos, vision: usize, speed: usize) -> Self {
        Self {
            id,
            pos,
            vision,
            speed,
            votes: 0,
            neighborhood: Neighborhood::default(),
        }
    }

    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    /// Stratum implied by speed, if the speed is one of the known strata.
    pub fn stratum(&self) -> Option<Stratum> {
        Stratum::from_speed(self.speed)
    }

    pub fn has_voted(&self) -> bool {
        self.votes > 0
    }

    /// Adds the ballots obtained at the current cell.
    pub fn cast(&mut self, ballots: u32) {
        self.votes = self.votes.saturating_add(ballots);
    }
}

/// Any agent on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Agent {
    PollingLocation(PollingLocation),
    Voter(Voter),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Agent::PollingLocation(p) => p.id,
            Agent::Voter(v) => v.id,
        }
    }

    pub fn pos(&self) -> Pos {
        match self {
            Agent::PollingLocation(p) => p.pos,
            Agent::Voter(v) => v.pos,
        }
    }

    pub fn breed(&self) -> Breed {
        match self {
            Agent::PollingLocation(_) => Breed::PollingLocation,
            Agent::Voter(_) => Breed::Voter,
        }
    }

    pub fn capability(&self) -> Capability {
        self.breed().capability()
    }

    pub fn is_mobile(&self) -> bool {
        self.capability() == Capability::Mobile
    }

    pub fn as_voter(&self) -> Option<&Voter> {
        match self {
            Agent::Voter(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_voter_mut(&mut self) -> Option<&mut Voter> {
        match self {
            Agent::Voter(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_polling_location(&self) -> Option<&PollingLocation> {
        match self {
            Agent::PollingLocation(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_polling_location_mut(&mut self) -> Option<&mut PollingLocation> {
        match self {
            Agent::PollingLocation(p) => Some(p),
            _ => None,
        }
    }
}
