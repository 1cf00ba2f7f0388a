#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative cell ownership for the shape grid editor.
//!
//! [`OccupancyGrid`] records which placed instance, if any, owns each cell of
//! a fixed `rows × cols` board. It validates footprints, commits them
//! (optionally overwriting other owners), and knows nothing about pixels or
//! the catalog beyond `0`/`1` matrices.

use std::collections::HashSet;

use shape_grid_core::{
    InstanceId, PixelPosition, PlacedShape, PlacementError, PlacementMode, Position, ShapeMatrix,
    ValidationResult,
};
use tracing::debug;

mod snapshot;

pub use snapshot::GridStateError;

/// Dense ownership matrix stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    rows: u32,
    cols: u32,
    cells: Vec<Option<InstanceId>>,
}

impl OccupancyGrid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        let capacity_u64 = u64::from(rows) * u64::from(cols);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            cols,
            cells: vec![None; capacity],
        }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Provides the dimensions as `(rows, cols)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    /// Reports whether the position lies outside `[0, rows) × [0, cols)`.
    #[must_use]
    pub fn is_out_of_bounds(&self, position: Position) -> bool {
        self.index(position).is_none()
    }

    /// Returns the owner of the cell, or `None` for free or out-of-bounds cells.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<&InstanceId> {
        self.index(position)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    /// Iterator over every owned cell in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Position, &InstanceId)> + '_ {
        let cols = self.cols.max(1) as usize;
        self.cells.iter().enumerate().filter_map(move |(index, owner)| {
            let owner = owner.as_ref()?;
            let row = i32::try_from(index / cols).ok()?;
            let col = i32::try_from(index % cols).ok()?;
            Some((Position::new(row, col), owner))
        })
    }

    /// Cells owned by the provided instance, in row-major order.
    #[must_use]
    pub fn shape_cells(&self, id: &InstanceId) -> Vec<Position> {
        self.occupied_cells()
            .filter(|(_, owner)| *owner == id)
            .map(|(position, _)| position)
            .collect()
    }

    /// Validates placing `matrix` with its origin at `position`.
    ///
    /// Cells owned by `exclude` are treated as free. Any out-of-bounds cell
    /// makes the whole result `OutOfBounds`, even when collisions were also
    /// found; the conflicting cells list then carries both kinds.
    #[must_use]
    pub fn validate_placement(
        &self,
        matrix: &ShapeMatrix,
        position: Position,
        exclude: Option<&InstanceId>,
    ) -> ValidationResult {
        let mut conflicting_cells = Vec::new();
        let mut has_out_of_bounds = false;

        for cell in matrix.cells_at(position) {
            let Some(index) = self.index(cell) else {
                has_out_of_bounds = true;
                conflicting_cells.push(cell);
                continue;
            };

            if let Some(owner) = &self.cells[index] {
                if Some(owner) != exclude {
                    conflicting_cells.push(cell);
                }
            }
        }

        if has_out_of_bounds {
            ValidationResult::out_of_bounds(conflicting_cells)
        } else if !conflicting_cells.is_empty() {
            ValidationResult::collision(conflicting_cells)
        } else {
            ValidationResult::valid()
        }
    }

    /// Writes the shape's footprint into the grid.
    ///
    /// Validation does not exclude the shape's own previous cells, so callers
    /// moving a shape in [`PlacementMode::Strict`] must remove it first. The
    /// previous occupancy of the instance is purged before stamping, and in
    /// [`PlacementMode::Force`] other owners are overwritten. Out-of-bounds
    /// footprints are rejected in every mode and leave the grid untouched.
    pub fn place_shape(
        &mut self,
        shape: &PlacedShape,
        mode: PlacementMode,
    ) -> Result<(), PlacementError> {
        let validation = self.validate_placement(&shape.matrix, shape.position, None);
        match validation.error() {
            Some(PlacementError::OutOfBounds) => return Err(PlacementError::OutOfBounds),
            Some(PlacementError::Collision) if mode == PlacementMode::Strict => {
                return Err(PlacementError::Collision);
            }
            _ => {}
        }

        self.remove_shape(&shape.instance_id);
        for cell in shape.cells() {
            if let Some(index) = self.index(cell) {
                self.cells[index] = Some(shape.instance_id.clone());
            }
        }

        debug!(
            instance = %shape.instance_id,
            position = %shape.position,
            forced = validation.error().is_some(),
            "shape placed"
        );
        Ok(())
    }

    /// Clears every cell owned by the instance. Unknown ids are a no-op.
    pub fn remove_shape(&mut self, id: &InstanceId) {
        let mut cleared = 0_usize;
        for slot in &mut self.cells {
            if slot.as_ref() == Some(id) {
                *slot = None;
                cleared += 1;
            }
        }
        if cleared > 0 {
            debug!(instance = %id, cleared, "shape removed from grid");
        }
    }

    /// Stamps the shape's id into those of its in-bounds cells that are
    /// currently free, leaving cells owned by anyone else untouched.
    ///
    /// Used to hand cells back to a shape after a forced placement on top of
    /// it has been lifted again.
    pub fn backfill(&mut self, shape: &PlacedShape) {
        for cell in shape.cells() {
            if let Some(index) = self.index(cell) {
                let slot = &mut self.cells[index];
                if slot.is_none() {
                    *slot = Some(shape.instance_id.clone());
                }
            }
        }
    }

    /// Reports whether `shape` shares an absolute cell with any other shape.
    ///
    /// The check is purely geometric over `all_shapes` and ignores the grid's
    /// current contents, so it stays correct when forced placements have
    /// overwritten cells. Entries with the same instance id as `shape` are
    /// skipped.
    #[must_use]
    pub fn check_shape_overlap(shape: &PlacedShape, all_shapes: &[PlacedShape]) -> bool {
        let footprint: HashSet<Position> = shape.cells().collect();
        all_shapes
            .iter()
            .filter(|other| other.instance_id != shape.instance_id)
            .flat_map(|other| other.cells())
            .any(|cell| footprint.contains(&cell))
    }

    /// First origin, scanning rows then columns from `(0, 0)`, at which the
    /// matrix validates with neither out-of-bounds cells nor collisions.
    #[must_use]
    pub fn first_available_position(&self, matrix: &ShapeMatrix) -> Option<Position> {
        let rows = i32::try_from(self.rows).unwrap_or(i32::MAX);
        let cols = i32::try_from(self.cols).unwrap_or(i32::MAX);
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| Position::new(row, col)))
            .find(|candidate| self.validate_placement(matrix, *candidate, None).valid)
    }

    /// Clears the grid while keeping its dimensions.
    pub fn reset(&mut self) {
        self.cells.fill(None);
    }

    /// Converts a pixel coordinate to the grid cell under it.
    ///
    /// Uses floor division without clamping, so coordinates left of or above
    /// the grid map to negative indices.
    #[must_use]
    pub fn snap_to_grid(pixel_x: f32, pixel_y: f32, cell_size: f32) -> Position {
        let col = (pixel_x / cell_size).floor() as i32;
        let row = (pixel_y / cell_size).floor() as i32;
        Position::new(row, col)
    }

    /// Converts a grid cell to the pixel coordinate of its top-left corner.
    #[must_use]
    pub fn grid_to_pixel(position: Position, cell_size: f32) -> PixelPosition {
        PixelPosition::new(
            position.col() as f32 * cell_size,
            position.row() as f32 * cell_size,
        )
    }

    fn index(&self, position: Position) -> Option<usize> {
        let row = u32::try_from(position.row()).ok()?;
        let col = u32::try_from(position.col()).ok()?;
        if row < self.rows && col < self.cols {
            let row = usize::try_from(row).ok()?;
            let col = usize::try_from(col).ok()?;
            let width = usize::try_from(self.cols).ok()?;
            Some(row * width + col)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_grid_core::{ShapeColor, ShapeId};

    fn shape(id: &str, rows: &[&[u8]], row: i32, col: i32) -> PlacedShape {
        PlacedShape {
            instance_id: InstanceId::new(id),
            shape_id: ShapeId::new(id),
            position: Position::new(row, col),
            matrix: ShapeMatrix::new(rows.iter().map(|r| r.to_vec()).collect())
                .expect("valid matrix"),
            color: ShapeColor::from_rgb(0, 0, 0),
            has_overlap: false,
        }
    }

    #[test]
    fn new_grid_is_empty() {
        let grid = OccupancyGrid::new(8, 5);
        assert_eq!(grid.dimensions(), (8, 5));
        assert_eq!(grid.occupied_cells().count(), 0);
        assert!(grid.cell(Position::new(0, 0)).is_none());
    }

    #[test]
    fn bounds_cover_rows_and_columns() {
        let grid = OccupancyGrid::new(8, 5);
        assert!(!grid.is_out_of_bounds(Position::new(7, 4)));
        assert!(grid.is_out_of_bounds(Position::new(8, 0)));
        assert!(grid.is_out_of_bounds(Position::new(0, 5)));
        assert!(grid.is_out_of_bounds(Position::new(-1, 0)));
        assert!(grid.is_out_of_bounds(Position::new(0, -1)));
    }

    #[test]
    fn zero_cells_of_the_matrix_are_ignored() {
        let mut grid = OccupancyGrid::new(3, 3);
        let blocker = shape("a", &[&[1]], 0, 0);
        grid.place_shape(&blocker, PlacementMode::Strict)
            .expect("blocker fits");

        let hook = shape("z", &[&[0, 1], &[1, 1]], 0, 0);
        let result = grid.validate_placement(&hook.matrix, hook.position, None);
        assert_eq!(result, ValidationResult::valid());

        let hook_off_left = grid.validate_placement(&hook.matrix, Position::new(1, -1), None);
        assert_eq!(hook_off_left.reason, shape_grid_core::PlacementReason::OutOfBounds);
        assert_eq!(hook_off_left.conflicting_cells, vec![Position::new(2, -1)]);
    }

    #[test]
    fn excluded_owner_does_not_collide() {
        let mut grid = OccupancyGrid::new(4, 4);
        let square = shape("o", &[&[1, 1], &[1, 1]], 0, 0);
        grid.place_shape(&square, PlacementMode::Strict)
            .expect("square fits");

        let shifted = grid.validate_placement(&square.matrix, Position::new(1, 1), None);
        assert_eq!(shifted.conflicting_cells, vec![Position::new(1, 1)]);

        let excluded =
            grid.validate_placement(&square.matrix, Position::new(1, 1), Some(&square.instance_id));
        assert!(excluded.valid);
    }

    #[test]
    fn strict_placement_rejects_collisions_without_mutation() {
        let mut grid = OccupancyGrid::new(4, 4);
        let first = shape("a", &[&[1, 1]], 0, 0);
        let second = shape("b", &[&[1, 1]], 0, 1);
        grid.place_shape(&first, PlacementMode::Strict)
            .expect("first fits");
        let before = grid.clone();

        assert_eq!(
            grid.place_shape(&second, PlacementMode::Strict),
            Err(PlacementError::Collision)
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn forced_placement_overwrites_previous_owner() {
        let mut grid = OccupancyGrid::new(4, 4);
        let first = shape("a", &[&[1, 1]], 0, 0);
        let second = shape("b", &[&[1, 1]], 0, 1);
        grid.place_shape(&first, PlacementMode::Strict)
            .expect("first fits");
        grid.place_shape(&second, PlacementMode::Force)
            .expect("force waives collisions");

        assert_eq!(grid.cell(Position::new(0, 0)), Some(&first.instance_id));
        assert_eq!(grid.cell(Position::new(0, 1)), Some(&second.instance_id));
        assert_eq!(grid.cell(Position::new(0, 2)), Some(&second.instance_id));
    }

    #[test]
    fn placing_again_purges_previous_cells() {
        let mut grid = OccupancyGrid::new(4, 4);
        let bar = shape("a", &[&[1, 1]], 0, 0);
        grid.place_shape(&bar, PlacementMode::Strict)
            .expect("bar fits");
        grid.place_shape(&bar.at(Position::new(3, 2)), PlacementMode::Strict)
            .expect("bar fits elsewhere");

        assert_eq!(
            grid.shape_cells(&bar.instance_id),
            vec![Position::new(3, 2), Position::new(3, 3)]
        );
    }

    #[test]
    fn strict_placement_counts_own_cells_as_collision() {
        let mut grid = OccupancyGrid::new(4, 4);
        let bar = shape("a", &[&[1, 1]], 0, 0);
        grid.place_shape(&bar, PlacementMode::Strict)
            .expect("bar fits");

        assert_eq!(
            grid.place_shape(&bar.at(Position::new(0, 1)), PlacementMode::Strict),
            Err(PlacementError::Collision)
        );
    }

    #[test]
    fn removing_unknown_shape_is_noop() {
        let mut grid = OccupancyGrid::new(2, 2);
        let dot = shape("a", &[&[1]], 1, 1);
        grid.place_shape(&dot, PlacementMode::Strict)
            .expect("dot fits");
        let before = grid.clone();
        grid.remove_shape(&InstanceId::new("missing"));
        assert_eq!(grid, before);
    }

    #[test]
    fn backfill_only_claims_free_cells() {
        let mut grid = OccupancyGrid::new(2, 4);
        let under = shape("under", &[&[1, 1, 1]], 0, 0);
        let over = shape("over", &[&[1, 1]], 0, 1);
        grid.place_shape(&under, PlacementMode::Strict)
            .expect("under fits");
        grid.place_shape(&over, PlacementMode::Force)
            .expect("forced");

        grid.remove_shape(&over.instance_id);
        assert!(grid.cell(Position::new(0, 1)).is_none());

        grid.backfill(&under);
        assert_eq!(grid.shape_cells(&under.instance_id).len(), 3);

        grid.place_shape(&over, PlacementMode::Force)
            .expect("forced again");
        grid.backfill(&under);
        assert_eq!(grid.cell(Position::new(0, 2)), Some(&over.instance_id));
    }

    #[test]
    fn first_available_position_scans_row_major() {
        let mut grid = OccupancyGrid::new(3, 3);
        let blocker = shape("a", &[&[1, 1, 0], &[0, 0, 0]], 0, 0);
        grid.place_shape(&blocker, PlacementMode::Strict)
            .expect("blocker fits");

        let dot = ShapeMatrix::unit();
        assert_eq!(grid.first_available_position(&dot), Some(Position::new(0, 2)));

        let square = ShapeMatrix::filled(2, 2);
        assert_eq!(
            grid.first_available_position(&square),
            Some(Position::new(1, 0))
        );

        let too_tall = ShapeMatrix::filled(4, 1);
        assert_eq!(grid.first_available_position(&too_tall), None);
    }

    #[test]
    fn reset_clears_all_cells() {
        let mut grid = OccupancyGrid::new(2, 2);
        grid.place_shape(&shape("a", &[&[1, 1], &[1, 1]], 0, 0), PlacementMode::Strict)
            .expect("fills grid");
        grid.reset();
        assert_eq!(grid, OccupancyGrid::new(2, 2));
    }

    #[test]
    fn snap_to_grid_floors_without_clamping() {
        assert_eq!(OccupancyGrid::snap_to_grid(149.0, 51.0, 50.0), Position::new(1, 2));
        assert_eq!(OccupancyGrid::snap_to_grid(-1.0, 0.0, 50.0), Position::new(0, -1));
        assert_eq!(
            OccupancyGrid::snap_to_grid(1000.0, 1000.0, 50.0),
            Position::new(20, 20)
        );
    }

    #[test]
    fn grid_to_pixel_returns_top_left_corner() {
        let pixel = OccupancyGrid::grid_to_pixel(Position::new(2, 3), 50.0);
        assert_eq!(pixel, PixelPosition::new(150.0, 100.0));
    }
}
