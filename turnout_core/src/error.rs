//! Error types for model construction.
//!
//! A running model never fails: movement edge cases degrade to a random step
//! or to standing still. Only building a model (reading the capacity map,
//! placing voters) can return an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or validating a capacity map.
#[derive(Debug, Error)]
pub enum CapacityMapError {
    /// The file could not be read.
    #[error("Failed to read capacity map {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No rows were found.
    #[error("Capacity map is empty")]
    Empty,

    /// A token is not a number.
    #[error("Unparsable capacity {value:?} at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    /// A number that cannot be a machine count (negative, fractional, NaN, too large).
    #[error("Capacity {value} at line {line}, column {column} is not a non-negative whole number")]
    InvalidValue { line: usize, column: usize, value: f64 },

    /// Rows do not all have the same length.
    #[error("Ragged capacity map: row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The matrix shape does not match the grid.
    #[error(
        "Capacity map is {found_rows}x{found_cols}, grid needs {expected_rows}x{expected_cols}"
    )]
    DimensionMismatch {
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },
}

impl CapacityMapError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while building a [`VotingModel`](crate::VotingModel).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The capacity map was malformed or did not fit the grid.
    #[error(transparent)]
    CapacityMap(#[from] CapacityMapError),

    /// A grid needs at least one cell.
    #[error("Grid must have at least one cell (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    /// More voters than distinct starting cells.
    #[error("Cannot place {requested} voters on a grid with {cells} cells")]
    TooManyVoters { requested: usize, cells: usize },

    /// An explicit voter position lies outside the grid.
    #[error("Position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// An explicit voter position already holds a voter.
    #[error("Cell ({x}, {y}) already holds a voter")]
    CellTaken { x: usize, y: usize },

    /// Stratum sampling weights were rejected.
    #[error("Invalid stratum weights: {0}")]
    InvalidStrataWeights(String),
}

impl ModelError {
    /// Creates an out-of-bounds error.
    pub fn out_of_bounds(pos: crate::Pos, width: usize, height: usize) -> Self {
        Self::OutOfBounds {
            x: pos.x,
            y: pos.y,
            width,
            height,
        }
    }
}
