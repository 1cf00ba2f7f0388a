//! Occupancy matrices describing the footprint of a shape.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::Position;

/// Rectangular grid of `0`/`1` values describing which cells a shape covers.
///
/// The top-left entry is the shape's own origin. Matrices are validated on
/// construction: they are never empty, every row has the same length and
/// every entry is either `0` (free) or `1` (occupied).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct ShapeMatrix {
    rows: Vec<Vec<u8>>,
}

impl ShapeMatrix {
    /// Validates the provided rows and wraps them into a matrix.
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, MatrixError> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(MatrixError::Empty),
        };

        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(MatrixError::Ragged {
                    row: row_index,
                    expected,
                    found: row.len(),
                });
            }
            if let Some(column) = row.iter().position(|value| *value > 1) {
                return Err(MatrixError::InvalidCell {
                    row: row_index,
                    column,
                    value: row[column],
                });
            }
        }

        Ok(Self { rows })
    }

    /// Builds a matrix from rows known to be well formed at compile time.
    pub(crate) fn from_static(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows.iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Single occupied cell.
    #[must_use]
    pub fn unit() -> Self {
        Self {
            rows: vec![vec![1]],
        }
    }

    /// Fully occupied rectangle of the provided dimensions.
    ///
    /// Zero dimensions are clamped to one so the result is never empty.
    #[must_use]
    pub fn filled(height: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![1; width.max(1)]; height.max(1)],
        }
    }

    /// Number of rows in the matrix.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the matrix.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Raw row data.
    #[must_use]
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// Reports whether the entry at the provided offset is occupied.
    #[must_use]
    pub fn is_occupied(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .is_some_and(|value| *value == 1)
    }

    /// Occupied offsets relative to the matrix origin, in row-major order.
    pub fn occupied_offsets(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, value)| **value == 1)
                .map(move |(column, _)| (row, column))
        })
    }

    /// Absolute grid cells covered when the matrix is anchored at `origin`.
    pub fn cells_at(&self, origin: Position) -> impl Iterator<Item = Position> + '_ {
        self.occupied_offsets()
            .map(move |(row, column)| origin.offset_by(row, column))
    }

    /// Number of occupied entries.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied_offsets().count()
    }

    /// Returns a copy rotated 90 degrees clockwise.
    ///
    /// A `h × w` matrix becomes `w × h`; row `c` of the result is column `c`
    /// of the input read bottom to top.
    #[must_use]
    pub fn rotate_clockwise(&self) -> Self {
        let rotated = (0..self.width())
            .map(|column| {
                self.rows
                    .iter()
                    .rev()
                    .map(|row| row[column])
                    .collect::<Vec<u8>>()
            })
            .collect();
        Self { rows: rotated }
    }
}

impl TryFrom<Vec<Vec<u8>>> for ShapeMatrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<ShapeMatrix> for Vec<Vec<u8>> {
    fn from(matrix: ShapeMatrix) -> Self {
        matrix.rows
    }
}

/// Reasons a set of rows cannot form a [`ShapeMatrix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixError {
    /// The matrix has no rows, or its first row has no columns.
    Empty,
    /// A row length differs from the first row.
    Ragged {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// An entry is neither `0` nor `1`.
    InvalidCell {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        column: usize,
        /// Value found at the entry.
        value: u8,
    },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "shape matrix must contain at least one cell"),
            Self::Ragged {
                row,
                expected,
                found,
            } => write!(
                f,
                "shape matrix row {row} has {found} cells but the first row has {expected}"
            ),
            Self::InvalidCell { row, column, value } => write!(
                f,
                "shape matrix entry ({row}, {column}) is {value}; expected 0 or 1"
            ),
        }
    }
}

impl Error for MatrixError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[u8]]) -> ShapeMatrix {
        ShapeMatrix::new(rows.iter().map(|row| row.to_vec()).collect()).expect("valid matrix")
    }

    #[test]
    fn rejects_empty_rows() {
        assert_eq!(ShapeMatrix::new(Vec::new()), Err(MatrixError::Empty));
        assert_eq!(ShapeMatrix::new(vec![Vec::new()]), Err(MatrixError::Empty));
    }

    #[test]
    fn rejects_ragged_rows() {
        let result = ShapeMatrix::new(vec![vec![1, 1], vec![1]]);
        assert_eq!(
            result,
            Err(MatrixError::Ragged {
                row: 1,
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn rejects_non_binary_entries() {
        let result = ShapeMatrix::new(vec![vec![1, 2]]);
        assert_eq!(
            result,
            Err(MatrixError::InvalidCell {
                row: 0,
                column: 1,
                value: 2,
            })
        );
    }

    #[test]
    fn occupied_offsets_skip_zero_entries() {
        let shape = matrix(&[&[1, 1], &[0, 1]]);
        let offsets: Vec<_> = shape.occupied_offsets().collect();
        assert_eq!(offsets, vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(shape.occupied_count(), 3);
    }

    #[test]
    fn cells_at_translates_offsets() {
        let shape = matrix(&[&[0, 1], &[1, 1]]);
        let cells: Vec<_> = shape.cells_at(Position::new(3, -1)).collect();
        assert_eq!(
            cells,
            vec![
                Position::new(3, 0),
                Position::new(4, -1),
                Position::new(4, 0),
            ]
        );
    }

    #[test]
    fn rotate_clockwise_turns_l_shape() {
        let l_shape = matrix(&[&[1, 1, 1], &[1, 0, 0]]);
        let rotated = l_shape.rotate_clockwise();
        assert_eq!(rotated, matrix(&[&[1, 1], &[0, 1], &[0, 1]]));
    }

    #[test]
    fn four_rotations_restore_the_matrix() {
        let q_shape = matrix(&[&[0, 1, 0], &[1, 1, 1], &[1, 1, 1]]);
        let restored = q_shape
            .rotate_clockwise()
            .rotate_clockwise()
            .rotate_clockwise()
            .rotate_clockwise();
        assert_eq!(restored, q_shape);
    }

    #[test]
    fn deserializing_rejects_ragged_json() {
        let parsed: Result<ShapeMatrix, _> = serde_json::from_str("[[1,1],[1]]");
        assert!(parsed.is_err());
        let parsed: ShapeMatrix = serde_json::from_str("[[1,0],[1,1]]").expect("valid json");
        assert_eq!(parsed, matrix(&[&[1, 0], &[1, 1]]));
    }
}
