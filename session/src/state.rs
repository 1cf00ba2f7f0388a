//! Export and import of the grid together with the shape list.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shape_grid_core::{InstanceId, PlacedShape, Position};
use shape_grid_occupancy::{GridStateError, OccupancyGrid};
use thiserror::Error;
use tracing::{info, warn};

use crate::PlacementSession;

/// Serialized snapshot of a session: the raw grid and the shape list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// JSON array of grid rows holding owner ids or `null`.
    pub grid: String,
    /// JSON array of placed instances in insertion order.
    pub shapes: String,
}

/// Reasons a session snapshot cannot be produced or restored.
#[derive(Debug, Error)]
pub enum StateError {
    /// The grid part is malformed or does not match the session dimensions.
    #[error(transparent)]
    Grid(#[from] GridStateError),
    /// The shape list is not a JSON array of placed instances.
    #[error("shape list is malformed: {0}")]
    Shapes(#[source] serde_json::Error),
    /// Two entries of the shape list share an instance id.
    #[error("instance '{0}' appears more than once in the shape list")]
    DuplicateInstance(InstanceId),
    /// A listed instance covers cells outside the grid.
    #[error("instance '{0}' extends beyond the grid")]
    ShapeOutOfBounds(InstanceId),
    /// A grid cell is owned by an instance missing from the shape list.
    #[error("cell {position} is owned by unknown instance '{instance}'")]
    UnknownOwner {
        /// Owner recorded in the grid.
        instance: InstanceId,
        /// Cell holding the unknown owner.
        position: Position,
    },
    /// A grid cell names an owner whose footprint does not cover it.
    #[error("cell {position} is owned by '{instance}', which does not cover it")]
    MisplacedOwner {
        /// Owner recorded in the grid.
        instance: InstanceId,
        /// Cell outside the owner's footprint.
        position: Position,
    },
    /// A cell of a listed instance is free in the grid.
    #[error("cell {position} of instance '{instance}' is free in the grid")]
    UncoveredCell {
        /// Listed instance covering the cell.
        instance: InstanceId,
        /// Cell left free in the grid.
        position: Position,
    },
}

impl PlacementSession {
    /// Serializes the grid and the shape list.
    pub fn export_state(&self) -> Result<SessionState, StateError> {
        Ok(SessionState {
            grid: self.grid.serialize()?,
            shapes: serde_json::to_string(&self.shapes).map_err(StateError::Shapes)?,
        })
    }

    /// Replaces the grid and the shape list with a previously exported pair.
    ///
    /// Both parts are parsed and cross-checked before anything changes, so a
    /// rejected import leaves the session exactly as it was. Overlap flags
    /// are re-derived rather than trusted. Returns the number of restored
    /// instances.
    pub fn import_state(&mut self, grid: &str, shapes: &str) -> Result<usize, StateError> {
        let (grid, shapes) = self.parse_state(grid, shapes).inspect_err(|error| {
            warn!(%error, "rejected session import");
        })?;

        self.grid = grid;
        self.shapes = shapes;
        self.dragging = None;
        self.refresh_overlaps();
        info!(shapes = self.shapes.len(), "session imported");
        Ok(self.shapes.len())
    }

    fn parse_state(
        &self,
        grid: &str,
        shapes: &str,
    ) -> Result<(OccupancyGrid, Vec<PlacedShape>), StateError> {
        let (rows, cols) = self.grid.dimensions();
        let mut restored = OccupancyGrid::new(rows, cols);
        restored.deserialize(grid)?;

        let listed: Vec<PlacedShape> = serde_json::from_str(shapes).map_err(StateError::Shapes)?;

        let mut known = HashSet::with_capacity(listed.len());
        for shape in &listed {
            if !known.insert(&shape.instance_id) {
                return Err(StateError::DuplicateInstance(shape.instance_id.clone()));
            }
            if shape.cells().any(|cell| restored.is_out_of_bounds(cell)) {
                return Err(StateError::ShapeOutOfBounds(shape.instance_id.clone()));
            }
        }

        for (position, owner) in restored.occupied_cells() {
            let Some(shape) = listed.iter().find(|shape| &shape.instance_id == owner) else {
                return Err(StateError::UnknownOwner {
                    instance: owner.clone(),
                    position,
                });
            };
            if !shape.cells().any(|cell| cell == position) {
                return Err(StateError::MisplacedOwner {
                    instance: owner.clone(),
                    position,
                });
            }
        }

        for shape in &listed {
            if let Some(position) = shape.cells().find(|&cell| restored.cell(cell).is_none()) {
                return Err(StateError::UncoveredCell {
                    instance: shape.instance_id.clone(),
                    position,
                });
            }
        }

        Ok((restored, listed))
    }
}
