//! Invariant oracle.
//!
//! The oracle watches a model from the outside after every step and reports
//! the first broken invariant:
//! - polling capacity stays within `[0, max]`
//! - the live voter count never grows, and live + voted = initial
//! - a live voter has not voted, stands where it says, and shares its cell
//!   with no other voter
//! - a voter who voted is gone from the grid and the scheduler
//! - nobody moves further than their speed in one step

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use turnout_core::{AgentId, Breed, Pos, StepMetrics, Voter, VotingModel};

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("Step {step}: polling location at {pos} holds {capacity} of {max} machines")]
    CapacityOutOfRange {
        step: u64,
        pos: Pos,
        capacity: u32,
        max: u32,
    },

    #[error("Step {step}: live voters grew from {before} to {after}")]
    LiveCountIncreased { step: u64, before: usize, after: usize },

    #[error("Step {step}: {live} live + {voted} voted != {initial} initial voters")]
    Unaccounted {
        step: u64,
        live: usize,
        voted: usize,
        initial: usize,
    },

    #[error("Step {step}: voter {id} is still live after voting")]
    VotedButLive { step: u64, id: AgentId },

    #[error("Step {step}: voter {id} left without voting")]
    LeftWithoutVoting { step: u64, id: AgentId },

    #[error("Step {step}: voter {id} is not on the grid at {pos}")]
    Misplaced { step: u64, id: AgentId, pos: Pos },

    #[error("Step {step}: more than one voter at {pos}")]
    SharedCell { step: u64, pos: Pos },

    #[error("Step {step}: voter {id} moved {distance} cells with speed {speed}")]
    Overstep {
        step: u64,
        id: AgentId,
        distance: usize,
        speed: usize,
    },

    #[error("Step {step}: collected {reported} disenfranchised, model has {live}")]
    MetricsMismatch {
        step: u64,
        reported: usize,
        live: usize,
    },

    #[error("Runs diverged at step {step}")]
    Diverged { step: u64 },
}

/// Step-by-step invariant checker.
#[derive(Debug, Clone)]
pub struct Oracle {
    initial_voters: usize,
    last_live: usize,
    /// Last known position of every live voter
    positions: BTreeMap<AgentId, Pos>,
    /// Voted voters already checked
    seen_voted: usize,
    checks: u64,
}

impl Oracle {
    /// Starts watching a freshly built model.
    pub fn new(model: &VotingModel) -> Self {
        Self {
            initial_voters: model.initial_voters(),
            last_live: model.live_voters(),
            positions: model.world().voters().map(|v| (v.id, v.pos)).collect(),
            seen_voted: model.voted().len(),
            checks: 0,
        }
    }

    /// Number of completed checks.
    pub fn checks(&self) -> u64 {
        self.checks
    }

    /// Checks every invariant against the model's current state.
    pub fn check(&mut self, model: &VotingModel) -> Result<(), Violation> {
        let step = model.time();

        for loc in model.world().polling_locations() {
            if loc.capacity > loc.max_capacity {
                return Err(Violation::CapacityOutOfRange {
                    step,
                    pos: loc.pos,
                    capacity: loc.capacity,
                    max: loc.max_capacity,
                });
            }
        }

        let live = model.live_voters();
        if live > self.last_live {
            return Err(Violation::LiveCountIncreased {
                step,
                before: self.last_live,
                after: live,
            });
        }
        let voted = model.voted().len();
        if live + voted != self.initial_voters {
            return Err(Violation::Unaccounted {
                step,
                live,
                voted,
                initial: self.initial_voters,
            });
        }

        let mut occupied = HashSet::new();
        for voter in model.world().voters() {
            if voter.has_voted() {
                return Err(Violation::VotedButLive { step, id: voter.id });
            }
            if !model.world().grid().cell_contents(voter.pos).contains(&voter.id)
                || !model.schedule().contains(Breed::Voter, voter.id)
            {
                return Err(Violation::Misplaced {
                    step,
                    id: voter.id,
                    pos: voter.pos,
                });
            }
            if !occupied.insert(voter.pos) {
                return Err(Violation::SharedCell {
                    step,
                    pos: voter.pos,
                });
            }
            self.check_move(step, voter)?;
        }

        for voter in &model.voted()[self.seen_voted..] {
            if !voter.has_voted() {
                return Err(Violation::LeftWithoutVoting { step, id: voter.id });
            }
            if model.world().agent(voter.id).is_some()
                || model.schedule().contains(Breed::Voter, voter.id)
                || model.world().grid().cell_contents(voter.pos).contains(&voter.id)
            {
                return Err(Violation::VotedButLive { step, id: voter.id });
            }
            self.check_move(step, voter)?;
            self.positions.remove(&voter.id);
        }

        if let Some(row) = model.metrics().latest() {
            if row.disenfranchised != live {
                return Err(Violation::MetricsMismatch {
                    step,
                    reported: row.disenfranchised,
                    live,
                });
            }
        }

        self.last_live = live;
        self.seen_voted = voted;
        self.checks += 1;
        Ok(())
    }

    fn check_move(&mut self, step: u64, voter: &Voter) -> Result<(), Violation> {
        if let Some(prev) = self.positions.insert(voter.id, voter.pos) {
            let distance = voter.neighborhood.distance(&prev, &voter.pos);
            if distance > voter.speed {
                return Err(Violation::Overstep {
                    step,
                    id: voter.id,
                    distance,
                    speed: voter.speed,
                });
            }
        }
        Ok(())
    }
}

/// Compares two metric histories row by row.
pub fn compare_histories(a: &[StepMetrics], b: &[StepMetrics]) -> Result<(), Violation> {
    for (left, right) in a.iter().zip(b) {
        if left != right {
            return Err(Violation::Diverged { step: left.step });
        }
    }
    if a.len() != b.len() {
        let step = a.len().min(b.len()) as u64;
        return Err(Violation::Diverged { step });
    }
    Ok(())
}
