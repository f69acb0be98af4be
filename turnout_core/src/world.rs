//! The world: grid plus the agents standing on it.
//!
//! `World` owns every live agent and the [`MultiGrid`] that indexes them by
//! cell. It is owned by exactly one [`VotingModel`](crate::VotingModel); the
//! scheduler hands it agent ids to activate.

use std::collections::BTreeMap;

use rand::Rng;

use crate::agents::{Agent, AgentId, PollingLocation, Voter};
use crate::movement::{self, TieBreak};
use crate::schedule::Activation;
use crate::space::{MultiGrid, Pos};

/// Grid and agent store for one model.
#[derive(Debug, Clone)]
pub struct World {
    grid: MultiGrid,
    agents: BTreeMap<AgentId, Agent>,
    next_id: u64,
    /// Voters that cast a ballot, in the order they voted.
    voted: Vec<Voter>,
}

impl World {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid: MultiGrid::new(width, height),
            agents: BTreeMap::new(),
            next_id: 0,
            voted: Vec::new(),
        }
    }

    pub fn grid(&self) -> &MultiGrid {
        &self.grid
    }

    /// Creates an agent with a fresh id and places it on the grid.
    pub fn spawn(&mut self, make: impl FnOnce(AgentId) -> Agent) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;

        let agent = make(id);
        self.grid.place_agent(id, agent.pos());
        self.agents.insert(id, agent);
        id
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Every live agent in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.values()
    }

    /// Live voters in id order.
    pub fn voters(&self) -> impl Iterator<Item = &Voter> + '_ {
        self.agents.values().filter_map(Agent::as_voter)
    }

    /// Polling locations in id order (which is also grid scan order).
    pub fn polling_locations(&self) -> impl Iterator<Item = &PollingLocation> + '_ {
        self.agents.values().filter_map(Agent::as_polling_location)
    }

    /// Voters removed after casting a ballot.
    pub fn voted(&self) -> &[Voter] {
        &self.voted
    }

    /// The polling location on a cell, if any.
    pub fn polling_location_at(&self, pos: Pos) -> Option<&PollingLocation> {
        self.grid
            .cell_contents(pos)
            .iter()
            .find_map(|id| self.agents.get(id).and_then(Agent::as_polling_location))
    }

    fn polling_location_at_mut(&mut self, pos: Pos) -> Option<&mut PollingLocation> {
        let id = self
            .grid
            .cell_contents(pos)
            .iter()
            .copied()
            .find(|id| matches!(self.agents.get(id), Some(Agent::PollingLocation(_))))?;
        self.agents
            .get_mut(&id)
            .and_then(Agent::as_polling_location_mut)
    }

    /// True if a mobile agent other than `me` stands on the cell.
    pub fn is_occupied(&self, pos: Pos, me: Option<AgentId>) -> bool {
        self.grid.cell_contents(pos).iter().any(|id| {
            Some(*id) != me && self.agents.get(id).is_some_and(Agent::is_mobile)
        })
    }

    /// Runs one agent's per-step behaviour.
    pub fn activate<R: Rng + ?Sized>(
        &mut self,
        id: AgentId,
        tie_break: TieBreak,
        rng: &mut R,
    ) -> Activation {
        match self.agents.get_mut(&id) {
            Some(Agent::PollingLocation(loc)) => {
                loc.step();
                Activation::Keep
            }
            Some(Agent::Voter(_)) => self.step_voter(id, tie_break, rng),
            None => Activation::Retire,
        }
    }

    /// Move, vote, and leave if a ballot was cast.
    fn step_voter<R: Rng + ?Sized>(
        &mut self,
        id: AgentId,
        tie_break: TieBreak,
        rng: &mut R,
    ) -> Activation {
        let Some(voter) = self.agents.get(&id).and_then(Agent::as_voter).copied() else {
            return Activation::Retire;
        };

        let destination = movement::next_position(self, &voter, tie_break, rng);
        self.grid.move_agent(id, voter.pos, destination);

        let ballots = self
            .polling_location_at_mut(destination)
            .map_or(0, PollingLocation::take_all);

        let Some(voter) = self.agents.get_mut(&id).and_then(Agent::as_voter_mut) else {
            return Activation::Retire;
        };
        voter.pos = destination;
        voter.cast(ballots);

        if !voter.has_voted() {
            return Activation::Keep;
        }

        let voter = *voter;
        self.grid.remove_agent(id, destination);
        self.agents.remove(&id);
        self.voted.push(voter);
        Activation::Retire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world_with_machine(width: usize, height: usize, machine: Pos, capacity: u32) -> World {
        let mut world = World::new(width, height);
        let cells: Vec<Pos> = world.grid().coord_iter().collect();
        for pos in cells {
            let max = if pos == machine { capacity } else { 0 };
            world.spawn(|id| Agent::PollingLocation(PollingLocation::new(id, pos, max)));
        }
        world
    }

    #[test]
    fn test_polling_location_lookup() {
        let world = world_with_machine(3, 3, Pos::new(2, 1), 4);
        assert_eq!(
            world.polling_location_at(Pos::new(2, 1)).map(|p| p.capacity),
            Some(4)
        );
        assert_eq!(
            world.polling_location_at(Pos::new(0, 0)).map(|p| p.capacity),
            Some(0)
        );
        assert!(world.polling_location_at(Pos::new(5, 5)).is_none());
        assert_eq!(world.polling_locations().count(), 9);
    }

    #[test]
    fn test_occupancy_ignores_self_and_resources() {
        let mut world = world_with_machine(3, 3, Pos::new(1, 1), 1);
        let me = world.spawn(|id| Agent::Voter(Voter::new(id, Pos::new(0, 0), 2, 1)));
        let other = world.spawn(|id| Agent::Voter(Voter::new(id, Pos::new(0, 1), 2, 1)));

        assert!(!world.is_occupied(Pos::new(0, 0), Some(me)));
        assert!(world.is_occupied(Pos::new(0, 0), Some(other)));
        assert!(world.is_occupied(Pos::new(0, 1), Some(me)));
        assert!(!world.is_occupied(Pos::new(1, 1), Some(me)));
    }

    #[test]
    fn test_voter_staying_on_free_machine_votes_and_leaves() {
        let mut world = world_with_machine(3, 3, Pos::new(1, 1), 2);
        let id = world.spawn(|id| Agent::Voter(Voter::new(id, Pos::new(1, 1), 3, 0)));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = world.activate(id, TieBreak::ScanOrder, &mut rng);

        assert_eq!(outcome, Activation::Retire);
        assert!(world.agent(id).is_none());
        assert!(!world.grid().cell_contents(Pos::new(1, 1)).contains(&id));
        assert_eq!(world.voted().len(), 1);
        // Consumption takes the whole slot amount.
        assert_eq!(world.voted()[0].votes, 2);
        assert_eq!(
            world.polling_location_at(Pos::new(1, 1)).map(|p| p.capacity),
            Some(0)
        );
    }

    #[test]
    fn test_voter_on_machine_still_moves_before_voting() {
        let mut wandered = 0;
        for seed in 0..20 {
            let mut world = world_with_machine(2, 1, Pos::new(0, 0), 1);
            let id = world.spawn(|id| Agent::Voter(Voter::new(id, Pos::new(0, 0), 3, 1)));
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            match world.activate(id, TieBreak::ScanOrder, &mut rng) {
                Activation::Keep => {
                    wandered += 1;
                    assert_eq!(world.agent(id).map(Agent::pos), Some(Pos::new(1, 0)));
                    assert!(world.voted().is_empty());
                }
                Activation::Retire => assert_eq!(world.voted()[0].pos, Pos::new(0, 0)),
            }
        }
        assert!(wandered > 0);
    }

    #[test]
    fn test_polling_location_activation_regenerates() {
        let mut world = world_with_machine(1, 1, Pos::new(0, 0), 1);
        let voter = world.spawn(|id| Agent::Voter(Voter::new(id, Pos::new(0, 0), 0, 1)));
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert_eq!(world.activate(voter, TieBreak::ScanOrder, &mut rng), Activation::Retire);
        let loc = AgentId(0);
        assert_eq!(world.polling_location_at(Pos::new(0, 0)).map(|p| p.capacity), Some(0));
        assert_eq!(world.activate(loc, TieBreak::ScanOrder, &mut rng), Activation::Keep);
        assert_eq!(world.polling_location_at(Pos::new(0, 0)).map(|p| p.capacity), Some(1));
    }

    #[test]
    fn test_unknown_agent_retires() {
        let mut world = World::new(2, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            world.activate(AgentId(77), TieBreak::ScanOrder, &mut rng),
            Activation::Retire
        );
    }
}
