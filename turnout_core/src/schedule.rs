//! Breed-grouped random activation.
//!
//! Agents are partitioned by [`Breed`]. Each step activates breeds in the
//! order they were first registered; within a breed the live roster is
//! snapshotted, shuffled with the scheduler's own seeded RNG, and walked.
//! An activation may retire its agent, which removes it at once. Ids retired
//! earlier in the same step are skipped when their turn comes.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agents::{Agent, AgentId, Breed};

/// What happens to an agent after its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Stays on the roster.
    Keep,
    /// Leaves the roster permanently.
    Retire,
}

/// Random activation by breed.
#[derive(Debug, Clone)]
pub struct BreedScheduler {
    /// Breeds in first-registration order.
    order: Vec<Breed>,
    roster: BTreeMap<Breed, BTreeSet<AgentId>>,
    rng: ChaCha8Rng,
    steps: u64,
}

impl BreedScheduler {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            order: Vec::new(),
            roster: BTreeMap::new(),
            rng,
            steps: 0,
        }
    }

    /// Registers an agent. Adding an agent twice has no effect.
    pub fn add(&mut self, agent: &Agent) {
        self.add_id(agent.breed(), agent.id());
    }

    pub fn add_id(&mut self, breed: Breed, id: AgentId) {
        if !self.order.contains(&breed) {
            self.order.push(breed);
        }
        self.roster.entry(breed).or_default().insert(id);
    }

    /// Removes an agent. Returns false (and does nothing) if it was absent.
    pub fn remove(&mut self, agent: &Agent) -> bool {
        self.remove_id(agent.breed(), agent.id())
    }

    pub fn remove_id(&mut self, breed: Breed, id: AgentId) -> bool {
        self.roster
            .get_mut(&breed)
            .is_some_and(|ids| ids.remove(&id))
    }

    pub fn contains(&self, breed: Breed, id: AgentId) -> bool {
        self.roster.get(&breed).is_some_and(|ids| ids.contains(&id))
    }

    /// Live agents of one breed.
    pub fn count(&self, breed: Breed) -> usize {
        self.roster.get(&breed).map_or(0, BTreeSet::len)
    }

    /// Live agents of every breed.
    pub fn total(&self) -> usize {
        self.roster.values().map(BTreeSet::len).sum()
    }

    /// Live ids of one breed in ascending order.
    pub fn ids(&self, breed: Breed) -> impl Iterator<Item = AgentId> + '_ {
        self.roster.get(&breed).into_iter().flatten().copied()
    }

    /// Every live id, breed by breed in activation order.
    pub fn agents(&self) -> impl Iterator<Item = (Breed, AgentId)> + '_ {
        self.order
            .iter()
            .flat_map(move |&breed| self.ids(breed).map(move |id| (breed, id)))
    }

    /// Breeds in activation order.
    pub fn breeds(&self) -> &[Breed] {
        &self.order
    }

    /// Completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Activates every live agent once, breed by breed.
    pub fn step<F>(&mut self, mut activate: F)
    where
        F: FnMut(Breed, AgentId) -> Activation,
    {
        let order = self.order.clone();
        for breed in order {
            self.step_breed(breed, &mut activate);
        }
        self.steps += 1;
    }

    /// Activates every live agent of one breed in a freshly shuffled order.
    pub fn step_breed<F>(&mut self, breed: Breed, activate: &mut F)
    where
        F: FnMut(Breed, AgentId) -> Activation,
    {
        let mut snapshot: Vec<AgentId> = self.ids(breed).collect();
        snapshot.shuffle(&mut self.rng);

        for id in snapshot {
            if !self.contains(breed, id) {
                continue;
            }
            if activate(breed, id) == Activation::Retire {
                self.remove_id(breed, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{PollingLocation, Voter};
    use crate::space::Pos;

    fn voter(id: u64) -> Agent {
        Agent::Voter(Voter::new(AgentId(id), Pos::new(0, 0), 1, 1))
    }

    fn location(id: u64) -> Agent {
        Agent::PollingLocation(PollingLocation::new(AgentId(id), Pos::new(0, 0), 1))
    }

    #[test]
    fn test_add_count_remove() {
        let mut schedule = BreedScheduler::new(42);
        schedule.add(&location(0));
        schedule.add(&voter(1));
        schedule.add(&voter(2));
        schedule.add(&voter(2));

        assert_eq!(schedule.count(Breed::PollingLocation), 1);
        assert_eq!(schedule.count(Breed::Voter), 2);
        assert_eq!(schedule.total(), 3);

        assert!(schedule.remove(&voter(1)));
        assert!(!schedule.remove(&voter(1)));
        assert!(!schedule.remove(&voter(99)));
        assert_eq!(schedule.count(Breed::Voter), 1);
        assert_eq!(
            schedule.agents().collect::<Vec<_>>(),
            vec![(Breed::PollingLocation, AgentId(0)), (Breed::Voter, AgentId(2))]
        );
    }

    #[test]
    fn test_breeds_activate_in_registration_order() {
        let mut schedule = BreedScheduler::new(1);
        schedule.add(&location(0));
        schedule.add(&location(1));
        schedule.add(&voter(2));
        schedule.add(&voter(3));

        let mut seen = Vec::new();
        schedule.step(|breed, _| {
            seen.push(breed);
            Activation::Keep
        });

        assert_eq!(
            seen,
            vec![
                Breed::PollingLocation,
                Breed::PollingLocation,
                Breed::Voter,
                Breed::Voter
            ]
        );
        assert_eq!(schedule.steps(), 1);
    }

    #[test]
    fn test_every_live_agent_activated_once() {
        let mut schedule = BreedScheduler::new(5);
        for id in 0..20 {
            schedule.add(&voter(id));
        }

        let mut seen = Vec::new();
        schedule.step(|_, id| {
            seen.push(id);
            Activation::Keep
        });

        seen.sort();
        let expected: Vec<AgentId> = (0..20).map(AgentId).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_retired_agents_leave_and_are_not_revisited() {
        let mut schedule = BreedScheduler::new(9);
        for id in 0..10 {
            schedule.add(&voter(id));
        }

        let mut activations = 0;
        schedule.step(|_, id| {
            activations += 1;
            if id.0 % 2 == 0 {
                Activation::Retire
            } else {
                Activation::Keep
            }
        });
        assert_eq!(activations, 10);
        assert_eq!(schedule.count(Breed::Voter), 5);

        let mut second = Vec::new();
        schedule.step(|_, id| {
            second.push(id);
            Activation::Keep
        });
        assert!(second.iter().all(|id| id.0 % 2 == 1));
        assert_eq!(second.len(), 5);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let order_for = |seed: u64| {
            let mut schedule = BreedScheduler::new(seed);
            for id in 0..50 {
                schedule.add(&voter(id));
            }
            let mut order = Vec::new();
            schedule.step(|_, id| {
                order.push(id);
                Activation::Keep
            });
            order
        };

        assert_eq!(order_for(42), order_for(42));
        assert_ne!(order_for(42), order_for(43));
    }
}
