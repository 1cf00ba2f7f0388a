//! Drag lifecycle: lift on start, pure validation while moving, commit or
//! recover on drop.

use shape_grid_core::{
    DiscardReason, InstanceId, PlacedShape, PlacementMode, PlacementReason, Position,
    ValidationResult,
};
use tracing::{info, warn};

use crate::PlacementSession;

/// Terminal outcome of a drag, reported to the caller for user feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// The instance now sits where it was dropped.
    Committed {
        /// Position the instance was committed to.
        position: Position,
        /// Whether the committed footprint overlaps another instance.
        overlapping: bool,
    },
    /// The drop left the grid, so the instance moved to the first free slot.
    Repositioned {
        /// Position where the pointer released the instance.
        requested: Position,
        /// First fully valid position in row-major order.
        position: Position,
    },
    /// The drop left the grid and no valid slot exists; the instance is gone.
    Discarded {
        /// Why the instance was discarded.
        reason: DiscardReason,
    },
    /// The drop could not be committed; the instance went back to its origin.
    Restored {
        /// Position the instance returned to.
        position: Position,
    },
    /// The instance is not part of the session.
    Ignored,
}

impl PlacementSession {
    /// Lifts the instance off the grid so its own cells never count as
    /// collisions while it moves. Returns the position it was lifted from.
    pub fn drag_start(&mut self, id: &InstanceId) -> Option<Position> {
        let Some(origin) = self.shape(id).map(|shape| shape.position) else {
            warn!(instance = %id, "drag started for an unknown instance");
            return None;
        };

        if let Some(active) = self.dragging.as_ref().filter(|active| *active != id) {
            warn!(
                active = %active,
                instance = %id,
                "drag started while another instance is still dragging"
            );
        }

        self.release(id);
        self.dragging = Some(id.clone());
        Some(origin)
    }

    /// Validates the dragged instance at `position` for live feedback.
    ///
    /// This is a pure query: neither the grid nor the list change. Unknown
    /// instances report a collision with no conflicting cells.
    #[must_use]
    pub fn drag_move(&self, id: &InstanceId, position: Position) -> ValidationResult {
        match self.shape(id) {
            Some(shape) => self
                .grid
                .validate_placement(&shape.matrix, position, Some(id)),
            None => ValidationResult::collision(Vec::new()),
        }
    }

    /// Drops the dragged instance at `position`.
    ///
    /// In-bounds drops always commit, collisions included. Drops with any
    /// cell off the grid trigger the row-major recovery scan: the instance
    /// moves to the first fully valid position, or is discarded when the
    /// scan finds none. A drop without a preceding [`drag_start`] lifts the
    /// instance first.
    ///
    /// [`drag_start`]: PlacementSession::drag_start
    pub fn drag_end(&mut self, id: &InstanceId, position: Position) -> DragOutcome {
        let Some(original) = self.shape(id).cloned() else {
            warn!(instance = %id, "drag ended for an unknown instance");
            if self.dragging.as_ref() == Some(id) {
                self.dragging = None;
            }
            return DragOutcome::Ignored;
        };

        if self.dragging.as_ref() != Some(id) {
            warn!(instance = %id, "drag ended without a matching drag start");
            self.release(id);
        }
        self.dragging = None;

        let validation = self
            .grid
            .validate_placement(&original.matrix, position, None);
        if validation.reason == PlacementReason::OutOfBounds {
            return self.recover(original, position);
        }

        match self.commit(original.at(position), PlacementMode::Force) {
            Ok(()) => {
                let overlapping = self.shape(id).is_some_and(|shape| shape.has_overlap);
                info!(instance = %id, %position, overlapping, "drop committed");
                DragOutcome::Committed {
                    position,
                    overlapping,
                }
            }
            Err(error) => {
                warn!(instance = %id, %position, %error, "drop could not be committed");
                self.restore(original)
            }
        }
    }

    fn recover(&mut self, original: PlacedShape, requested: Position) -> DragOutcome {
        let id = original.instance_id.clone();
        let Some(found) = self.grid.first_available_position(&original.matrix) else {
            let _ = self.discard(&id);
            info!(instance = %id, %requested, "no free slot after off-grid drop; shape discarded");
            return DragOutcome::Discarded {
                reason: DiscardReason::GridFull,
            };
        };

        match self.commit(original.at(found), PlacementMode::Force) {
            Ok(()) => {
                info!(
                    instance = %id,
                    %requested,
                    position = %found,
                    "off-grid drop repositioned"
                );
                DragOutcome::Repositioned {
                    requested,
                    position: found,
                }
            }
            Err(error) => {
                warn!(instance = %id, position = %found, %error, "repositioning failed");
                self.restore(original)
            }
        }
    }

    /// Puts the instance back where it was before the drag without touching
    /// the list.
    fn restore(&mut self, original: PlacedShape) -> DragOutcome {
        if let Err(error) = self.grid.place_shape(&original, PlacementMode::Force) {
            warn!(instance = %original.instance_id, %error, "could not restore dragged shape");
        }
        DragOutcome::Restored {
            position: original.position,
        }
    }
}
