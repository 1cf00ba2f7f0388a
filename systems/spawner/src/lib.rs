#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure palette system that turns a catalog pick into an `AddShape` command.
//!
//! The system never touches the grid. Callers hand it a validation closure
//! that mirrors the occupancy grid's `validate_placement`, and the system
//! emits a command for the first origin in row-major order that validates
//! cleanly.

use std::time::Duration;

use shape_grid_core::{
    Command, InstanceId, PlacedShape, Position, ShapeDefinition, ShapeId, ShapeMatrix,
    ValidationResult,
};

/// Hands out `"{shape}-{millis}"` instance ids that never repeat.
///
/// Creation times that do not advance past the previous id are bumped by one
/// millisecond, so two shapes created within the same tick stay distinct.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceIdAllocator {
    last_millis: Option<u64>,
}

impl InstanceIdAllocator {
    /// Creates an allocator that has not issued any id yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_millis: None }
    }

    /// Allocates an id for `shape` created at `created_at` since the epoch.
    pub fn allocate(&mut self, shape: &ShapeId, created_at: Duration) -> InstanceId {
        let requested = u64::try_from(created_at.as_millis()).unwrap_or(u64::MAX);
        let millis = match self.last_millis {
            Some(last) if requested <= last => last.saturating_add(1),
            _ => requested,
        };
        self.last_millis = Some(millis);
        InstanceId::from_parts(shape, millis)
    }
}

/// Result of asking the spawner for a new instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// An `AddShape` command was queued for the instance.
    Queued {
        /// Identifier allocated for the new instance.
        instance: InstanceId,
        /// First origin that validated cleanly.
        position: Position,
    },
    /// No origin on the grid can hold the shape.
    GridFull,
}

/// Palette system emitting placement commands for newly picked shapes.
#[derive(Clone, Debug, Default)]
pub struct Spawner {
    ids: InstanceIdAllocator,
}

impl Spawner {
    /// Creates a new spawner system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: InstanceIdAllocator::new(),
        }
    }

    /// Searches for a home for `definition` and queues an `AddShape` command.
    ///
    /// Candidate origins are tried row by row, column by column, over a
    /// `rows × cols` grid. The `validate` closure should mirror the grid's
    /// `validate_placement` without exclusions. An id is only allocated when
    /// a command is emitted.
    pub fn handle<F>(
        &mut self,
        definition: &ShapeDefinition,
        dimensions: (u32, u32),
        created_at: Duration,
        mut validate: F,
        out: &mut Vec<Command>,
    ) -> SpawnOutcome
    where
        F: FnMut(&ShapeMatrix, Position) -> ValidationResult,
    {
        let (rows, cols) = dimensions;
        let Some(position) = candidates(rows, cols)
            .find(|&origin| validate(&definition.matrix, origin).valid)
        else {
            return SpawnOutcome::GridFull;
        };

        let instance = self.ids.allocate(&definition.id, created_at);
        out.push(Command::AddShape {
            shape: PlacedShape::from_definition(instance.clone(), definition, position),
        });
        SpawnOutcome::Queued { instance, position }
    }
}

fn candidates(rows: u32, cols: u32) -> impl Iterator<Item = Position> {
    let rows = i32::try_from(rows).unwrap_or(i32::MAX);
    let cols = i32::try_from(cols).unwrap_or(i32::MAX);
    (0..rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_bumps_repeated_timestamps() {
        let mut ids = InstanceIdAllocator::new();
        let shape = ShapeId::new("O");
        let at = Duration::from_millis(1_700_000_000_000);

        assert_eq!(ids.allocate(&shape, at).as_str(), "O-1700000000000");
        assert_eq!(ids.allocate(&shape, at).as_str(), "O-1700000000001");
        assert_eq!(
            ids.allocate(&shape, at - Duration::from_millis(5)).as_str(),
            "O-1700000000002"
        );
        assert_eq!(
            ids.allocate(&shape, at + Duration::from_secs(1)).as_str(),
            "O-1700000001000"
        );
    }

    #[test]
    fn candidates_are_row_major() {
        let order: Vec<_> = candidates(2, 3).collect();
        assert_eq!(
            order,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2),
                Position::new(1, 0),
                Position::new(1, 1),
                Position::new(1, 2),
            ]
        );
    }
}
