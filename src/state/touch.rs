//! Touch handling: press-edge detection with debouncing, and zone hit-testing.
//!
//! The touch controller only reports whether a finger is down and where. A held
//! finger must not fire a command on every loop iteration, so [`TouchTracker`]
//! turns contact into discrete events: one on the press edge, none while held, and
//! state changes within the debounce window are ignored to suppress chatter.
//!
//! A tap that starts and ends inside the window after a release cannot be told apart
//! from chatter, so it is dropped. Dropped presses are logged and counted.

use embassy_time::{Duration, Instant};
use embedded_graphics::prelude::Point;
use embedded_graphics::primitives::Rectangle;

use crate::command::Action;
use crate::config::layout::{BUTTON_BAR, BUTTON_WIDTH, CAMERA_AREA, TOUCH_DEBOUNCE_MS};

/// Touchable screen zone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Zone {
    /// One of the three command buttons.
    Button(Action),
    /// Camera area (toggles the visible camera).
    Camera,
}

/// A tap, consumed at most once.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TouchEvent {
    pub zone: Zone,
    pub at: Instant,
}

/// Resolve a touch point to a zone. The status bar is not touchable.
pub fn hit_test(
    point: Point,
    viewports: &[Rectangle],
) -> Option<Zone> {
    if BUTTON_BAR.contains(point) {
        let index = (point.x.max(0) as u32 / BUTTON_WIDTH) as usize;
        return Some(Zone::Button(Action::ALL[index.min(Action::ALL.len() - 1)]));
    }
    if CAMERA_AREA.contains(point) || viewports.iter().any(|vp| vp.contains(point)) {
        return Some(Zone::Camera);
    }
    None
}

/// Touch debounce state with time-based edge detection.
pub struct TouchTracker {
    was_touching: bool,
    last_change: Option<Instant>,
    dropped_presses: u32,
}

impl TouchTracker {
    /// Create a new tracker (finger up).
    pub const fn new() -> Self {
        Self {
            was_touching: false,
            last_change: None,
            dropped_presses: 0,
        }
    }

    /// Press edges ignored because they fell inside the debounce window.
    #[inline]
    pub const fn dropped_presses(&self) -> u32 { self.dropped_presses }

    /// Returns the contact point only on the press edge.
    ///
    /// `contact` is the controller's current report (`None` when released).
    pub fn just_pressed(
        &mut self,
        contact: Option<Point>,
        now: Instant,
    ) -> Option<Point> {
        let touching = contact.is_some();
        if touching == self.was_touching {
            return None;
        }

        // Apply debounce: only accept change if enough time has passed
        if let Some(last) = self.last_change
            && now.saturating_duration_since(last) < Duration::from_millis(TOUCH_DEBOUNCE_MS)
        {
            if touching {
                self.dropped_presses = self.dropped_presses.wrapping_add(1);
                log_debug!("Touch press dropped ({} ms)", now.saturating_duration_since(last).as_millis());
            }
            return None;
        }

        self.was_touching = touching;
        self.last_change = Some(now);
        contact
    }
}

impl Default for TouchTracker {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
