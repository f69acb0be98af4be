//! Maximum-machine matrix loaded once at model construction.
//!
//! The text format is a whitespace-separated matrix, one row per line. Row
//! index is `x`, column index is `y`, so a `width x height` grid needs
//! `width` rows of `height` numbers. Blank lines and lines starting with `#`
//! are ignored. Numbers may be written as integers or as integral floats
//! (`2.000000000000000000e+00` is what `numpy.savetxt` emits).

use std::path::Path;
use std::str::FromStr;

use rand::seq::index;
use rand::Rng;

use crate::error::CapacityMapError;
use crate::space::Pos;

/// Per-cell maximum machine counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityMap {
    width: usize,
    height: usize,
    /// Indexed `x * height + y`, like the grid.
    values: Vec<u32>,
}

impl CapacityMap {
    /// A map with the same capacity everywhere.
    pub fn uniform(width: usize, height: usize, capacity: u32) -> Self {
        Self {
            width,
            height,
            values: vec![capacity; width * height],
        }
    }

    /// Builds a map from rows (`rows[x][y]`).
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, CapacityMapError> {
        let width = rows.len();
        let height = rows.first().map(Vec::len).ok_or(CapacityMapError::Empty)?;
        if height == 0 {
            return Err(CapacityMapError::Empty);
        }

        let mut values = Vec::with_capacity(width * height);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != height {
                return Err(CapacityMapError::RaggedRow {
                    row,
                    expected: height,
                    found: cols.len(),
                });
            }
            values.extend(cols);
        }

        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Reads a map from a text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CapacityMapError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| CapacityMapError::io(path, e))?;
        text.parse()
    }

    /// Scatters `machines` single-machine locations over distinct random cells.
    ///
    /// Used when no map file is supplied. `machines` is clamped to the cell count.
    pub fn scatter<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        machines: usize,
        rng: &mut R,
    ) -> Self {
        let mut map = Self::uniform(width, height, 0);
        let cells = width * height;
        for idx in index::sample(rng, cells, machines.min(cells)).into_iter() {
            map.values[idx] = 1;
        }
        map
    }

    /// Returns a copy with one cell's capacity replaced.
    pub fn with(mut self, pos: Pos, capacity: u32) -> Self {
        if pos.x < self.width && pos.y < self.height {
            self.values[pos.x * self.height + pos.y] = capacity;
        }
        self
    }

    /// Number of rows (grid width).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of columns (grid height).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Capacity of a cell; 0 outside the map.
    pub fn get(&self, pos: Pos) -> u32 {
        if pos.x < self.width && pos.y < self.height {
            self.values[pos.x * self.height + pos.y]
        } else {
            0
        }
    }

    /// Sum of every cell's maximum capacity.
    pub fn total_machines(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }

    /// Number of cells with at least one machine.
    pub fn machine_cells(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0).count()
    }

    /// Fails unless the map is exactly `width x height`.
    pub fn ensure_dimensions(&self, width: usize, height: usize) -> Result<(), CapacityMapError> {
        if self.width == width && self.height == height {
            Ok(())
        } else {
            Err(CapacityMapError::DimensionMismatch {
                expected_rows: width,
                expected_cols: height,
                found_rows: self.width,
                found_cols: self.height,
            })
        }
    }
}

impl FromStr for CapacityMap {
    type Err = CapacityMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();

        for (line_idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let row = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
                .enumerate()
                .map(|(col, token)| parse_capacity(token, line_idx + 1, col + 1))
                .collect::<Result<Vec<u32>, _>>()?;
            rows.push(row);
        }

        Self::from_rows(rows)
    }
}

impl std::fmt::Display for CapacityMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for x in 0..self.width {
            let row = &self.values[x * self.height..(x + 1) * self.height];
            let line: Vec<String> = row.iter().map(u32::to_string).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

fn parse_capacity(token: &str, line: usize, column: usize) -> Result<u32, CapacityMapError> {
    if let Ok(v) = token.parse::<u32>() {
        return Ok(v);
    }

    let value: f64 = token.parse().map_err(|_| CapacityMapError::Parse {
        line,
        column,
        value: token.to_string(),
    })?;

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(CapacityMapError::InvalidValue {
            line,
            column,
            value,
        });
    }

    Ok(value as u32)
}
