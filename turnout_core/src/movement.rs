//! Voter navigation: search within vision, step within speed.
//!
//! A voter looks at every cell within its vision radius, its own cell
//! excluded, that no other voter stands on. The nearest polling location with
//! a free machine becomes the target, and the voter moves to the reachable
//! open cell closest to it. With nothing in sight it takes a random step.
//! Reachable cells include the current one, which is always open to its own
//! occupant, so a move always exists.
//!
//! Distances are Euclidean. Ties go to the first candidate seen; the
//! [`TieBreak`] policy decides what "first" means.

use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agents::Voter;
use crate::space::Pos;
use crate::world::World;

/// Order in which equally good candidates are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Grid scan order: increasing `x`, then increasing `y`.
    #[default]
    ScanOrder,
    /// Candidates shuffled with the movement RNG before the scan.
    Shuffled,
}

impl TieBreak {
    pub fn name(&self) -> &'static str {
        match self {
            TieBreak::ScanOrder => "scan",
            TieBreak::Shuffled => "shuffled",
        }
    }
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "scan" | "scan_order" => Ok(TieBreak::ScanOrder),
            "shuffled" | "shuffle" | "random" => Ok(TieBreak::Shuffled),
            _ => Err(format!("Unknown tie-break policy: {s} (expected scan or shuffled)")),
        }
    }
}

/// Cells within `radius` of the voter that no other voter occupies.
pub fn open_cells(world: &World, voter: &Voter, radius: usize, include_center: bool) -> Vec<Pos> {
    world
        .grid()
        .neighborhood(voter.pos, voter.neighborhood, include_center, radius)
        .into_iter()
        .filter(|&pos| !world.is_occupied(pos, Some(voter.id)))
        .collect()
}

/// The nearest visible polling location with a free machine.
pub fn find_target(world: &World, visible: &[Pos], from: Pos) -> Option<Pos> {
    let available = visible.iter().copied().filter(|&pos| {
        world
            .polling_location_at(pos)
            .is_some_and(|loc| loc.is_available())
    });
    closest(available, from)
}

/// Where the voter ends up this step.
pub fn next_position<R: Rng + ?Sized>(
    world: &World,
    voter: &Voter,
    tie_break: TieBreak,
    rng: &mut R,
) -> Pos {
    let mut visible = open_cells(world, voter, voter.vision, false);
    let mut reachable = open_cells(world, voter, voter.speed, true);
    if tie_break == TieBreak::Shuffled {
        visible.shuffle(rng);
        reachable.shuffle(rng);
    }

    match find_target(world, &visible, voter.pos) {
        Some(target) => closest(reachable.iter().copied(), target).unwrap_or(voter.pos),
        None => reachable.choose(rng).copied().unwrap_or(voter.pos),
    }
}

/// First candidate at minimal Euclidean distance from `to`.
fn closest(candidates: impl IntoIterator<Item = Pos>, to: Pos) -> Option<Pos> {
    let mut best: Option<(Pos, f64)> = None;
    for pos in candidates {
        let d = pos.distance(&to);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((pos, d));
        }
    }
    best.map(|(pos, _)| pos)
}
