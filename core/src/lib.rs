#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the shape grid editor.
//!
//! This crate defines the vocabulary that connects adapters, the occupancy
//! grid, the placement session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the session executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values that
//! describe what actually happened. Validation feedback travels as plain
//! [`ValidationResult`] data and is never raised as an error.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod matrix;

pub use catalog::{default_catalog, CatalogError, ShapeCatalog, ShapeDefinition};
pub use matrix::{MatrixError, ShapeMatrix};

/// Grid coordinate expressed as signed row and column indices.
///
/// Positions carry no bounds guarantee: a dragged shape may report negative
/// or oversized coordinates, and only validation against a grid decides
/// whether the position is usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    row: i32,
    col: i32,
}

impl Position {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Row index of the position.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Column index of the position.
    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    /// Translates the position by a non-negative matrix offset.
    #[must_use]
    pub fn offset_by(self, rows: usize, cols: usize) -> Self {
        let rows = i32::try_from(rows).unwrap_or(i32::MAX);
        let cols = i32::try_from(cols).unwrap_or(i32::MAX);
        Self {
            row: self.row.saturating_add(rows),
            col: self.col.saturating_add(cols),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Pixel coordinate on the presentation surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    /// Horizontal offset from the left edge.
    pub x: f32,
    /// Vertical offset from the top edge.
    pub y: f32,
}

impl PixelPosition {
    /// Creates a new pixel coordinate.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pixel geometry used by adapters to lay the grid out on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Side length of a single square cell.
    pub cell_size: f32,
    /// Spacing inserted between neighbouring cells.
    pub cell_gap: f32,
}

impl GridGeometry {
    /// Creates a geometry description.
    #[must_use]
    pub const fn new(cell_size: f32, cell_gap: f32) -> Self {
        Self {
            cell_size,
            cell_gap,
        }
    }

    /// Distance between the origins of two neighbouring cells.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.cell_size + self.cell_gap
    }

    /// Extent covered by `count` cells laid out along one axis.
    ///
    /// The trailing gap is not part of the extent. Zero cells cover nothing.
    #[must_use]
    pub fn extent(&self, count: u32) -> f32 {
        if count == 0 {
            return 0.0;
        }
        count as f32 * self.pitch() - self.cell_gap
    }
}

/// Stable catalog key of a shape definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Wraps the provided key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed view of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of a placed shape instance.
///
/// Grid cells store this identifier to record ownership.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives an identifier from a catalog key and a creation timestamp.
    #[must_use]
    pub fn from_parts(shape: &ShapeId, created_at_millis: u64) -> Self {
        Self(format!("{shape}-{created_at_millis}"))
    }

    /// Borrowed view of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fill color applied to a shape.
///
/// Serialized as a `#rrggbb` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl ShapeColor {
    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a `#rrggbb` (or `rrggbb`) hex string.
    pub fn from_hex(value: &str) -> Result<Self, ColorError> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError(value.to_owned()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError(value.to_owned()))
        };
        Ok(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
        })
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for ShapeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl TryFrom<String> for ShapeColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ShapeColor> for String {
    fn from(color: ShapeColor) -> Self {
        color.to_string()
    }
}

/// A color string that is not a six digit hex triplet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorError(String);

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a #rrggbb color", self.0)
    }
}

impl Error for ColorError {}

/// One instance of a shape living on the grid.
///
/// The matrix and color are copied from the catalog so instances stay
/// decoupled from later catalog changes. `has_overlap` is derived state that
/// the session recomputes after every mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedShape {
    /// Unique identifier of the instance.
    pub instance_id: InstanceId,
    /// Catalog key the instance was created from.
    pub shape_id: ShapeId,
    /// Grid position of the matrix origin.
    pub position: Position,
    /// Footprint of the instance.
    pub matrix: ShapeMatrix,
    /// Fill color of the instance.
    pub color: ShapeColor,
    /// Whether any occupied cell is shared with another instance.
    #[serde(default)]
    pub has_overlap: bool,
}

impl PlacedShape {
    /// Instantiates a catalog definition at the provided position.
    #[must_use]
    pub fn from_definition(
        instance_id: InstanceId,
        definition: &ShapeDefinition,
        position: Position,
    ) -> Self {
        Self {
            instance_id,
            shape_id: definition.id.clone(),
            position,
            matrix: definition.matrix.clone(),
            color: definition.color,
            has_overlap: false,
        }
    }

    /// Returns a copy of the instance anchored at a different position.
    #[must_use]
    pub fn at(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Absolute grid cells covered by the instance.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.matrix.cells_at(self.position)
    }
}

/// Outcome classification reported by placement validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementReason {
    /// Every occupied cell is in bounds and free.
    Valid,
    /// At least one occupied cell falls outside the grid.
    OutOfBounds,
    /// Every cell is in bounds but some are owned by another instance.
    Collision,
}

/// Reasons a placement cannot be committed as requested.
///
/// The two kinds are deliberately separate: [`PlacementMode::Force`] waives
/// [`PlacementError::Collision`] but never [`PlacementError::OutOfBounds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint leaves the grid.
    OutOfBounds,
    /// The requested footprint overlaps cells owned by another instance.
    Collision,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "shape extends beyond the grid"),
            Self::Collision => write!(f, "shape overlaps another shape"),
        }
    }
}

impl Error for PlacementError {}

/// How a placement treats cells already owned by other instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    /// Reject the placement when any target cell is owned by someone else.
    Strict,
    /// Overwrite owned cells; overlap becomes a displayed condition.
    Force,
}

/// Result of validating a footprint against the grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Whether the footprint can be placed without conflicts.
    pub valid: bool,
    /// Classification of the outcome.
    pub reason: PlacementReason,
    /// Every offending absolute cell, both out-of-bounds and occupied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicting_cells: Vec<Position>,
}

impl ValidationResult {
    /// Result describing a conflict-free footprint.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: PlacementReason::Valid,
            conflicting_cells: Vec::new(),
        }
    }

    /// Result describing a footprint that leaves the grid.
    #[must_use]
    pub fn out_of_bounds(conflicting_cells: Vec<Position>) -> Self {
        Self {
            valid: false,
            reason: PlacementReason::OutOfBounds,
            conflicting_cells,
        }
    }

    /// Result describing an in-bounds footprint overlapping other instances.
    #[must_use]
    pub fn collision(conflicting_cells: Vec<Position>) -> Self {
        Self {
            valid: false,
            reason: PlacementReason::Collision,
            conflicting_cells,
        }
    }

    /// Converts the result into the error it would raise on commit, if any.
    #[must_use]
    pub const fn error(&self) -> Option<PlacementError> {
        match self.reason {
            PlacementReason::Valid => None,
            PlacementReason::OutOfBounds => Some(PlacementError::OutOfBounds),
            PlacementReason::Collision => Some(PlacementError::Collision),
        }
    }
}

/// Why a shape was dropped from the session without an explicit removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscardReason {
    /// An out-of-bounds drop found no valid position anywhere on the grid.
    GridFull,
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Places a new instance without overwriting anything.
    AddShape {
        /// Instance to add, already anchored at its candidate position.
        shape: PlacedShape,
    },
    /// Removes an instance from the grid and the shape list.
    RemoveShape {
        /// Instance targeted for removal.
        instance: InstanceId,
    },
    /// Lifts an instance off the grid at the start of a drag.
    StartDrag {
        /// Instance being dragged.
        instance: InstanceId,
    },
    /// Drops the dragged instance at the provided position.
    EndDrag {
        /// Instance being dropped.
        instance: InstanceId,
        /// Grid position under the pointer when the drag ended.
        position: Position,
    },
    /// Clears the grid and the shape list.
    Reset,
    /// Replaces the session state with a previously exported snapshot.
    ImportState {
        /// Serialized occupancy grid.
        grid: String,
        /// Serialized shape list.
        shapes: String,
    },
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a new instance was placed.
    ShapeAdded {
        /// Identifier of the new instance.
        instance: InstanceId,
        /// Position the instance occupies.
        position: Position,
    },
    /// Reports that adding an instance was rejected.
    ShapePlacementRejected {
        /// Identifier of the rejected instance.
        instance: InstanceId,
        /// Position provided in the request.
        position: Position,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that an instance was removed on request.
    ShapeRemoved {
        /// Identifier of the removed instance.
        instance: InstanceId,
    },
    /// Confirms that an instance was lifted off the grid.
    DragStarted {
        /// Identifier of the dragged instance.
        instance: InstanceId,
        /// Position the instance occupied before the drag.
        origin: Position,
    },
    /// Confirms that a drop was committed where the pointer released it.
    ShapeMoved {
        /// Identifier of the moved instance.
        instance: InstanceId,
        /// New position of the instance.
        position: Position,
        /// Whether the new footprint overlaps other instances.
        overlapping: bool,
    },
    /// Reports that an out-of-bounds drop was moved to the first free slot.
    ShapeRepositioned {
        /// Identifier of the repositioned instance.
        instance: InstanceId,
        /// Position where the pointer released the instance.
        requested: Position,
        /// Position chosen by the recovery scan.
        position: Position,
    },
    /// Reports that an instance left the session without an explicit removal.
    ShapeDiscarded {
        /// Identifier of the discarded instance.
        instance: InstanceId,
        /// Why the instance was discarded.
        reason: DiscardReason,
    },
    /// Reports that a drop could not be committed and the instance went back.
    DragReverted {
        /// Identifier of the reverted instance.
        instance: InstanceId,
        /// Position the instance returned to.
        position: Position,
    },
    /// Confirms that the session was cleared.
    SessionReset,
    /// Confirms that a snapshot replaced the session state.
    StateImported {
        /// Number of instances restored from the snapshot.
        shapes: usize,
    },
    /// Reports that a snapshot was rejected and the state left untouched.
    ImportRejected {
        /// Human readable rejection reason.
        reason: String,
    },
}
