#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement session state for the shape grid editor.
//!
//! A [`PlacementSession`] owns the occupancy grid together with the ordered
//! list of placed instances and is the only place either of them changes.
//! Every mutation ends by re-deriving the `has_overlap` flag of every
//! instance. Adapters either call the session methods directly or submit
//! [`Command`] values through [`apply`] and observe the resulting [`Event`]s.
//!
//! Only one shape may be dragging at a time. The session logs but does not
//! prevent interleaved drags; callers must not start a second drag before
//! ending the first.

use shape_grid_core::{Command, Event, InstanceId, PlacedShape, PlacementError, PlacementMode};
use shape_grid_occupancy::OccupancyGrid;
use tracing::{debug, info, warn};

mod drag;
mod state;

pub use drag::DragOutcome;
pub use state::{SessionState, StateError};

/// Authoritative grid plus the ordered list of instances living on it.
#[derive(Clone, Debug)]
pub struct PlacementSession {
    grid: OccupancyGrid,
    shapes: Vec<PlacedShape>,
    dragging: Option<InstanceId>,
}

impl PlacementSession {
    /// Creates an empty session over a `rows × cols` grid.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            grid: OccupancyGrid::new(rows, cols),
            shapes: Vec::new(),
            dragging: None,
        }
    }

    /// Read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Placed instances in insertion order.
    #[must_use]
    pub fn shapes(&self) -> &[PlacedShape] {
        &self.shapes
    }

    /// Looks up a placed instance by id.
    #[must_use]
    pub fn shape(&self, id: &InstanceId) -> Option<&PlacedShape> {
        self.shapes.iter().find(|shape| &shape.instance_id == id)
    }

    /// Instance currently lifted off the grid by a drag, if any.
    #[must_use]
    pub fn dragging(&self) -> Option<&InstanceId> {
        self.dragging.as_ref()
    }

    /// Number of instances flagged as overlapping another instance.
    #[must_use]
    pub fn overlapping_count(&self) -> usize {
        self.shapes.iter().filter(|shape| shape.has_overlap).count()
    }

    /// Places a new instance without overwriting any cell.
    ///
    /// On failure nothing changes and the caller may retry at another
    /// position; the session performs no search of its own here. An id that
    /// is already placed is reported as a collision.
    pub fn add_shape(&mut self, shape: PlacedShape) -> Result<(), PlacementError> {
        if self.shape(&shape.instance_id).is_some() {
            warn!(instance = %shape.instance_id, "instance is already placed");
            return Err(PlacementError::Collision);
        }
        self.commit(shape, PlacementMode::Strict)
    }

    /// Removes an instance from the grid and the list.
    ///
    /// Returns whether the instance existed. Unknown ids are a no-op.
    pub fn remove_shape(&mut self, id: &InstanceId) -> bool {
        if self.dragging.as_ref() == Some(id) {
            self.dragging = None;
        }
        let removed = self.discard(id);
        if removed {
            info!(instance = %id, "shape removed");
        }
        removed
    }

    /// Clears the grid and empties the shape list.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.shapes.clear();
        self.dragging = None;
        info!("session reset");
    }

    /// Writes the instance into the grid and, on success, records it in the
    /// list (replacing an entry with the same id in place).
    fn commit(&mut self, shape: PlacedShape, mode: PlacementMode) -> Result<(), PlacementError> {
        self.grid.place_shape(&shape, mode)?;
        match self
            .shapes
            .iter_mut()
            .find(|existing| existing.instance_id == shape.instance_id)
        {
            Some(existing) => *existing = shape,
            None => self.shapes.push(shape),
        }
        self.refresh_overlaps();
        Ok(())
    }

    /// Clears the instance's cells from the grid and hands any cells it had
    /// overwritten back to the listed instances still covering them.
    ///
    /// A lifted instance never receives cells back.
    fn release(&mut self, id: &InstanceId) {
        self.grid.remove_shape(id);
        let lifted = self.dragging.as_ref();
        for shape in self
            .shapes
            .iter()
            .filter(|shape| &shape.instance_id != id && Some(&shape.instance_id) != lifted)
        {
            self.grid.backfill(shape);
        }
    }

    /// Drops the instance from both the grid and the list.
    fn discard(&mut self, id: &InstanceId) -> bool {
        self.release(id);
        let before = self.shapes.len();
        self.shapes.retain(|shape| &shape.instance_id != id);
        let removed = self.shapes.len() != before;
        if removed {
            self.refresh_overlaps();
        }
        removed
    }

    fn refresh_overlaps(&mut self) {
        let flags: Vec<bool> = self
            .shapes
            .iter()
            .map(|shape| OccupancyGrid::check_shape_overlap(shape, &self.shapes))
            .collect();
        for (shape, has_overlap) in self.shapes.iter_mut().zip(flags) {
            shape.has_overlap = has_overlap;
        }
        debug!(
            shapes = self.shapes.len(),
            overlapping = self.overlapping_count(),
            "overlap flags refreshed"
        );
    }
}

/// Applies the provided command to the session and reports what happened.
///
/// Commands that target unknown instances emit nothing.
pub fn apply(session: &mut PlacementSession, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::AddShape { shape } => {
            let instance = shape.instance_id.clone();
            let position = shape.position;
            match session.add_shape(shape) {
                Ok(()) => out_events.push(Event::ShapeAdded { instance, position }),
                Err(reason) => out_events.push(Event::ShapePlacementRejected {
                    instance,
                    position,
                    reason,
                }),
            }
        }
        Command::RemoveShape { instance } => {
            if session.remove_shape(&instance) {
                out_events.push(Event::ShapeRemoved { instance });
            }
        }
        Command::StartDrag { instance } => {
            if let Some(origin) = session.drag_start(&instance) {
                out_events.push(Event::DragStarted { instance, origin });
            }
        }
        Command::EndDrag { instance, position } => match session.drag_end(&instance, position) {
            DragOutcome::Committed {
                position,
                overlapping,
            } => out_events.push(Event::ShapeMoved {
                instance,
                position,
                overlapping,
            }),
            DragOutcome::Repositioned {
                requested,
                position,
            } => out_events.push(Event::ShapeRepositioned {
                instance,
                requested,
                position,
            }),
            DragOutcome::Discarded { reason } => {
                out_events.push(Event::ShapeDiscarded { instance, reason });
            }
            DragOutcome::Restored { position } => {
                out_events.push(Event::DragReverted { instance, position });
            }
            DragOutcome::Ignored => {}
        },
        Command::Reset => {
            session.reset();
            out_events.push(Event::SessionReset);
        }
        Command::ImportState { grid, shapes } => match session.import_state(&grid, &shapes) {
            Ok(count) => out_events.push(Event::StateImported { shapes: count }),
            Err(error) => out_events.push(Event::ImportRejected {
                reason: error.to_string(),
            }),
        },
    }
}
