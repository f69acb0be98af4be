//! The "SPACE" of the model - a bounded multi-occupancy grid.
//!
//! Every cell holds the ids of the agents standing on it. Cells are stored
//! with `x` as the major axis (index = `x * height + y`), so both
//! [`MultiGrid::coord_iter`] and [`MultiGrid::neighborhood`] visit increasing
//! `x`, then increasing `y`. That order is the grid's scan order and is what
//! the movement tie-break relies on.

use serde::{Deserialize, Serialize};

use crate::agents::AgentId;

/// A cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two cells.
    pub fn distance(&self, other: &Pos) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Manhattan distance between two cells.
    pub fn manhattan(&self, other: &Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev distance between two cells.
    pub fn chebyshev(&self, other: &Pos) -> usize {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl From<(usize, usize)> for Pos {
    fn from((x, y): (usize, usize)) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Shape of a radius-`r` neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// 4-connected: `|dx| + |dy| <= r`.
    #[default]
    VonNeumann,
    /// 8-connected: `max(|dx|, |dy|) <= r`.
    Moore,
}

impl Neighborhood {
    /// Returns true if `cell` lies within `radius` of `center`.
    pub fn contains(&self, center: &Pos, cell: &Pos, radius: usize) -> bool {
        let dx = center.x.abs_diff(cell.x);
        let dy = center.y.abs_diff(cell.y);
        match self {
            Neighborhood::VonNeumann => dx.checked_add(dy).is_some_and(|d| d <= radius),
            Neighborhood::Moore => dx.max(dy) <= radius,
        }
    }

    /// Distance between two cells under this shape's metric.
    pub fn distance(&self, a: &Pos, b: &Pos) -> usize {
        match self {
            Neighborhood::VonNeumann => a.manhattan(b),
            Neighborhood::Moore => a.chebyshev(b),
        }
    }
}

/// A fixed-size, non-toroidal grid where any number of agents may share a cell.
#[derive(Debug, Clone)]
pub struct MultiGrid {
    width: usize,
    height: usize,
    cells: Vec<Vec<AgentId>>,
}

impl MultiGrid {
    /// Creates an empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        debug_assert!(self.in_bounds(pos), "{pos} outside {}x{}", self.width, self.height);
        pos.x * self.height + pos.y
    }

    /// Iterates every cell in scan order.
    pub fn coord_iter(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Pos::new(x, y)))
    }

    /// Adds an agent id to a cell.
    pub fn place_agent(&mut self, id: AgentId, pos: Pos) {
        let idx = self.index(pos);
        self.cells[idx].push(id);
    }

    /// Removes an agent id from a cell. Returns false if it was not there.
    pub fn remove_agent(&mut self, id: AgentId, pos: Pos) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let idx = self.index(pos);
        let cell = &mut self.cells[idx];
        match cell.iter().position(|other| *other == id) {
            Some(slot) => {
                cell.remove(slot);
                true
            }
            None => false,
        }
    }

    /// Moves an agent id between cells.
    pub fn move_agent(&mut self, id: AgentId, from: Pos, to: Pos) {
        if from == to {
            return;
        }
        if self.remove_agent(id, from) {
            self.place_agent(id, to);
        }
    }

    /// Agent ids standing on a cell, in arrival order.
    pub fn cell_contents(&self, pos: Pos) -> &[AgentId] {
        if !self.in_bounds(pos) {
            return &[];
        }
        &self.cells[self.index(pos)]
    }

    /// Cells within `radius` of `pos`, clipped to the grid, in scan order.
    pub fn neighborhood(
        &self,
        pos: Pos,
        shape: Neighborhood,
        include_center: bool,
        radius: usize,
    ) -> Vec<Pos> {
        if !self.in_bounds(pos) {
            return Vec::new();
        }
        let xs = pos.x.saturating_sub(radius)..=pos.x.saturating_add(radius).min(self.width - 1);
        let ys = pos.y.saturating_sub(radius)..=pos.y.saturating_add(radius).min(self.height - 1);
        let mut cells = Vec::new();

        for x in xs {
            for y in ys.clone() {
                let cell = Pos::new(x, y);
                if cell == pos && !include_center {
                    continue;
                }
                if shape.contains(&pos, &cell, radius) {
                    cells.push(cell);
                }
            }
        }

        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_iter_scan_order() {
        let grid = MultiGrid::new(2, 3);
        let cells: Vec<Pos> = grid.coord_iter().collect();
        assert_eq!(
            cells,
            vec![
                Pos::new(0, 0),
                Pos::new(0, 1),
                Pos::new(0, 2),
                Pos::new(1, 0),
                Pos::new(1, 1),
                Pos::new(1, 2),
            ]
        );
    }

    #[test]
    fn test_von_neumann_neighborhood() {
        let grid = MultiGrid::new(5, 5);
        let cells = grid.neighborhood(Pos::new(2, 2), Neighborhood::VonNeumann, true, 1);
        assert_eq!(
            cells,
            vec![
                Pos::new(1, 2),
                Pos::new(2, 1),
                Pos::new(2, 2),
                Pos::new(2, 3),
                Pos::new(3, 2),
            ]
        );

        let ring = grid.neighborhood(Pos::new(2, 2), Neighborhood::VonNeumann, false, 2);
        assert_eq!(ring.len(), 12);
        assert!(!ring.contains(&Pos::new(2, 2)));
    }

    #[test]
    fn test_moore_neighborhood() {
        let grid = MultiGrid::new(5, 5);
        let cells = grid.neighborhood(Pos::new(2, 2), Neighborhood::Moore, true, 1);
        assert_eq!(cells.len(), 9);
        assert!(cells.contains(&Pos::new(1, 1)));
        assert!(cells.contains(&Pos::new(3, 3)));
    }

    #[test]
    fn test_neighborhood_clipped_at_corner() {
        let grid = MultiGrid::new(3, 3);
        let cells = grid.neighborhood(Pos::new(0, 0), Neighborhood::VonNeumann, true, 1);
        assert_eq!(cells, vec![Pos::new(0, 0), Pos::new(0, 1), Pos::new(1, 0)]);

        let big = grid.neighborhood(Pos::new(0, 0), Neighborhood::Moore, true, 10);
        assert_eq!(big.len(), 9);
    }

    #[test]
    fn test_unbounded_radius_covers_grid() {
        let grid = MultiGrid::new(3, 3);
        for shape in [Neighborhood::Moore, Neighborhood::VonNeumann] {
            let all = grid.neighborhood(Pos::new(1, 1), shape, true, usize::MAX);
            assert_eq!(all, grid.coord_iter().collect::<Vec<_>>());

            let ring = grid.neighborhood(Pos::new(1, 1), shape, false, usize::MAX);
            assert_eq!(ring.len(), 8);
            assert!(!ring.contains(&Pos::new(1, 1)));
        }

        let far = grid.neighborhood(Pos::new(2, 0), Neighborhood::VonNeumann, true, 200_000_000);
        assert_eq!(far.len(), 9);
    }

    #[test]
    fn test_zero_radius() {
        let grid = MultiGrid::new(3, 3);
        assert_eq!(
            grid.neighborhood(Pos::new(1, 1), Neighborhood::Moore, true, 0),
            vec![Pos::new(1, 1)]
        );
        assert!(grid
            .neighborhood(Pos::new(1, 1), Neighborhood::Moore, false, 0)
            .is_empty());
    }

    #[test]
    fn test_place_move_remove() {
        let mut grid = MultiGrid::new(3, 3);
        let a = AgentId(1);
        let b = AgentId(2);

        grid.place_agent(a, Pos::new(0, 0));
        grid.place_agent(b, Pos::new(0, 0));
        assert_eq!(grid.cell_contents(Pos::new(0, 0)), &[a, b]);

        grid.move_agent(a, Pos::new(0, 0), Pos::new(2, 1));
        assert_eq!(grid.cell_contents(Pos::new(0, 0)), &[b]);
        assert_eq!(grid.cell_contents(Pos::new(2, 1)), &[a]);

        assert!(grid.remove_agent(a, Pos::new(2, 1)));
        assert!(!grid.remove_agent(a, Pos::new(2, 1)));
        assert!(grid.cell_contents(Pos::new(2, 1)).is_empty());
        assert!(grid.cell_contents(Pos::new(9, 9)).is_empty());
    }

    #[test]
    fn test_distances() {
        let a = Pos::new(0, 0);
        let b = Pos::new(3, 4);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
        assert_eq!(a.manhattan(&b), 7);
        assert_eq!(a.chebyshev(&b), 4);
    }
}
