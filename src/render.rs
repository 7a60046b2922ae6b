//! Render state tracking for partial display updates.
//!
//! The panel is written over SPI, so a full-screen repaint per loop iteration is far
//! too slow. [`RenderState`] remembers what each zone last showed and answers
//! "does this zone need repainting?" once per frame.
//!
//! # Update Strategy
//!
//! | Zone | Repainted when |
//! |------|----------------|
//! | Status bar | Cache revision or offline flag changes |
//! | Button bar | A button's in-flight state changes |
//! | Camera viewport | New frame, error state changes, active slot switches, notice closes |
//! | Notice | Shown, replaced, or the camera under it was repainted |
//!
//! Everything is dirty on the first frame.
//!
//! # Notice Cleanup
//!
//! The notice is drawn over the camera area. When it closes, its area is cleared and the
//! camera viewports are marked dirty in the same frame so the frame underneath is
//! restored. Replacing one notice with another needs no cleanup since every notice has
//! the same geometry.

use crate::camera::SlotId;
use crate::config::CAMERA_SLOTS;
use crate::state::Notice;

/// Status bar, button bar and one entry per camera viewport.
const ZONES: usize = 2 + CAMERA_SLOTS;

/// What a zone was drawn with. Two equal marks mean identical pixels.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mark {
    /// Cache revision and offline flag.
    Status { revision: u32, offline: bool },
    /// In-flight flag of each button.
    Buttons([bool; 3]),
    /// Frames decoded into the slot so far and whether the failure marker is shown.
    Camera { slot: SlotId, frames: u32, failed: bool },
}

impl Mark {
    const fn zone(&self) -> usize {
        match self {
            Self::Status { .. } => 0,
            Self::Buttons(_) => 1,
            Self::Camera { slot, .. } => 2 + slot.index(),
        }
    }
}

/// Tracks render state for dirty-zone repaints.
pub struct RenderState {
    /// Whether this is the first frame (need full redraw).
    first_frame: bool,

    /// Mark each zone was last drawn with.
    drawn: [Option<Mark>; ZONES],

    /// Slot shown when viewports overlap.
    prev_active: Option<SlotId>,

    /// Notice currently drawn.
    prev_notice: Option<Notice>,

    /// Whether a new notice must be drawn this frame.
    notice_dirty: bool,

    /// Whether the notice closed this frame (need to clear remnants).
    notice_just_closed: bool,

    /// Whether all camera viewports must be redrawn this frame.
    cameras_invalidated: bool,
}

impl RenderState {
    /// Create a new render state for first frame.
    pub const fn new() -> Self {
        Self {
            first_frame: true,
            drawn: [None; ZONES],
            prev_active: None,
            prev_notice: None,
            notice_dirty: false,
            notice_just_closed: false,
            cameras_invalidated: false,
        }
    }

    /// Record `mark` for its zone and report whether the zone needs redrawing.
    pub fn check_dirty(
        &mut self,
        mark: Mark,
    ) -> bool {
        let forced = self.first_frame || (self.cameras_invalidated && matches!(mark, Mark::Camera { .. }));
        let prev = self.drawn[mark.zone()].replace(mark);
        forced || prev != Some(mark)
    }

    /// Record which slot is shown; switching invalidates the viewports.
    pub fn update_active(
        &mut self,
        active: SlotId,
    ) {
        if self.prev_active.is_some_and(|prev| prev != active) {
            self.cameras_invalidated = true;
        }
        self.prev_active = Some(active);
    }

    /// Update notice state with the current notice.
    ///
    /// A new or replaced notice must be drawn; a closed one invalidates the cameras.
    pub fn update_notice(
        &mut self,
        notice: Option<&Notice>,
    ) {
        let current = notice.copied();
        if current == self.prev_notice {
            return;
        }
        if current.is_some() {
            self.notice_dirty = true;
        } else {
            self.notice_just_closed = true;
            self.cameras_invalidated = true;
        }
        self.prev_notice = current;
    }

    /// Check if the notice needs drawing, given whether any viewport was just repainted.
    pub const fn need_notice(
        &self,
        cameras_painted: bool,
    ) -> bool {
        self.prev_notice.is_some() && (self.notice_dirty || cameras_painted || self.first_frame)
    }

    /// Check if the notice closed this frame.
    #[inline]
    pub const fn notice_just_closed(&self) -> bool { self.notice_just_closed }

    /// Check if this is the first frame.
    #[inline]
    pub const fn is_first_frame(&self) -> bool { self.first_frame }

    /// Force every zone to redraw on the next frame.
    pub const fn invalidate(&mut self) { self.first_frame = true; }

    /// Call at end of frame to reset per-frame state.
    pub const fn end_frame(&mut self) {
        self.first_frame = false;
        self.notice_dirty = false;
        self.notice_just_closed = false;
        self.cameras_invalidated = false;
    }
}

impl Default for RenderState {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
