//! JSON round trip of the raw ownership matrix.

use shape_grid_core::InstanceId;
use thiserror::Error;
use tracing::warn;

use crate::OccupancyGrid;

/// Reasons a serialized grid cannot be restored.
#[derive(Debug, Error)]
pub enum GridStateError {
    /// The payload is not a JSON array of rows of `null`/string cells.
    #[error("grid state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload has a different number of rows than the grid.
    #[error("grid state has {found} rows but the grid has {expected}")]
    RowCount {
        /// Rows in the live grid.
        expected: u32,
        /// Rows found in the payload.
        found: usize,
    },
    /// A row of the payload has a different width than the grid.
    #[error("grid state row {row} has {found} cells but the grid has {expected} columns")]
    ColumnCount {
        /// Index of the offending row.
        row: usize,
        /// Columns in the live grid.
        expected: u32,
        /// Cells found in the offending row.
        found: usize,
    },
}

impl OccupancyGrid {
    /// Serializes the ownership matrix as a JSON array of rows.
    pub fn serialize(&self) -> Result<String, GridStateError> {
        let rows: Vec<&[Option<InstanceId>]> = if self.cols == 0 {
            let empty: &[Option<InstanceId>] = &[];
            vec![empty; usize::try_from(self.rows).unwrap_or(0)]
        } else {
            let width = usize::try_from(self.cols).unwrap_or(usize::MAX);
            self.cells.chunks(width).collect()
        };
        Ok(serde_json::to_string(&rows)?)
    }

    /// Restores the ownership matrix from [`OccupancyGrid::serialize`] output.
    ///
    /// The payload must match the grid's dimensions exactly. On error the
    /// grid is left untouched.
    pub fn deserialize(&mut self, data: &str) -> Result<(), GridStateError> {
        let restored = self.parse_cells(data).inspect_err(|error| {
            warn!(%error, "rejected grid state");
        })?;
        self.cells = restored;
        Ok(())
    }

    fn parse_cells(&self, data: &str) -> Result<Vec<Option<InstanceId>>, GridStateError> {
        let rows: Vec<Vec<Option<InstanceId>>> = serde_json::from_str(data)?;
        if rows.len() != usize::try_from(self.rows).unwrap_or(usize::MAX) {
            return Err(GridStateError::RowCount {
                expected: self.rows,
                found: rows.len(),
            });
        }

        let width = usize::try_from(self.cols).unwrap_or(usize::MAX);
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != width)
        {
            return Err(GridStateError::ColumnCount {
                row,
                expected: self.cols,
                found: cells.len(),
            });
        }

        Ok(rows.into_iter().flatten().collect())
    }
}
