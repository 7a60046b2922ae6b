//! Display geometry and pre-computed layout constants.
//!
//! # Optimization: Pre-computed Layout Constants
//!
//! Zone boundaries like `SCREEN_HEIGHT - BOTTOM_BAR_HEIGHT` are computed at compile time
//! as `const`, so drawing and hit-testing never recompute them per frame.
//!
//! # Zones
//!
//! ```text
//! y=0    +---------------------------------+
//!        | status bar (progress, ETA, temps)|
//! y=40   +---------------------------------+
//!        |                                 |
//!        |      camera area (175 px)       |
//!        |                                 |
//! y=215  +---------------------------------+
//!        | PAUSE    | RESUME    | CANCEL   |
//! y=240  +---------------------------------+
//! ```

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

// =============================================================================
// Display Configuration
// =============================================================================

/// Display width in pixels (320x240 landscape panel).
pub const SCREEN_WIDTH: u32 = 320;

/// Display height in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

/// Full screen rectangle. Viewports must lie inside it.
pub const SCREEN: Rectangle = Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));

// =============================================================================
// Bars
// =============================================================================

/// Top status bar height in pixels.
pub const TOP_BAR_HEIGHT: u32 = 40;

/// Bottom button bar height in pixels.
pub const BOTTOM_BAR_HEIGHT: u32 = 25;

/// Status bar rectangle.
pub const STATUS_BAR: Rectangle = Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, TOP_BAR_HEIGHT));

/// Y coordinate where the button bar starts.
pub const BUTTON_BAR_Y: i32 = (SCREEN_HEIGHT - BOTTOM_BAR_HEIGHT) as i32;

/// Button bar rectangle.
pub const BUTTON_BAR: Rectangle = Rectangle::new(Point::new(0, BUTTON_BAR_Y), Size::new(SCREEN_WIDTH, BOTTOM_BAR_HEIGHT));

/// Width of one button (bar split into equal thirds).
pub const BUTTON_WIDTH: u32 = SCREEN_WIDTH / 3;

// =============================================================================
// Camera Area
// =============================================================================

/// First row of the camera area (directly under the status bar).
pub const CAMERA_AREA_TOP: i32 = TOP_BAR_HEIGHT as i32;

/// First row below the camera area (top of the button bar).
pub const CAMERA_AREA_BOTTOM: i32 = BUTTON_BAR_Y;

/// Camera area height in pixels (175 with the default bars).
pub const CAMERA_AREA_HEIGHT: u32 = SCREEN_HEIGHT - TOP_BAR_HEIGHT - BOTTOM_BAR_HEIGHT;

/// Camera area rectangle, the default viewport of both camera slots.
pub const CAMERA_AREA: Rectangle =
    Rectangle::new(Point::new(0, CAMERA_AREA_TOP), Size::new(SCREEN_WIDTH, CAMERA_AREA_HEIGHT));

/// Height of the downscaled camera snapshots the hub serves.
pub const CAMERA_IMAGE_HEIGHT: u32 = 240;

/// Draw origin of camera 1: bottom of the image aligned with the bottom of the camera
/// area (215 - 240 = -25).
pub const CAMERA1_DRAW_ORIGIN: Point = Point::new(0, CAMERA_AREA_BOTTOM - CAMERA_IMAGE_HEIGHT as i32);

/// Draw origin of camera 2: top of the image directly under the status bar.
pub const CAMERA2_DRAW_ORIGIN: Point = Point::new(0, CAMERA_AREA_TOP);

/// Largest frame a decoder may produce (a full screen).
pub const MAX_FRAME_SIZE: Size = Size::new(SCREEN_WIDTH, SCREEN_HEIGHT);

// =============================================================================
// Overlay Geometry
// =============================================================================

/// Screen center X coordinate. Used for centering notices and placeholders.
pub const CENTER_X: i32 = (SCREEN_WIDTH / 2) as i32;

/// Center of the camera area. Notices are centered here so bars stay visible.
pub const CAMERA_CENTER_Y: i32 = CAMERA_AREA_TOP + (CAMERA_AREA_HEIGHT / 2) as i32;

/// Notice box width (without the 3 px border).
pub const NOTICE_WIDTH: u32 = 220;

/// Notice box height (without the 3 px border).
pub const NOTICE_HEIGHT: u32 = 50;

/// Notice rectangle including its border.
pub const NOTICE_AREA: Rectangle = Rectangle::new(
    Point::new(CENTER_X - (NOTICE_WIDTH / 2) as i32 - 3, CAMERA_CENTER_Y - (NOTICE_HEIGHT / 2) as i32 - 3),
    Size::new(NOTICE_WIDTH + 6, NOTICE_HEIGHT + 6),
);

/// Side of the failure marker square drawn in a viewport corner.
pub const FAILURE_MARKER_SIZE: u32 = 8;

// =============================================================================
// Memory Budgets
// =============================================================================

/// Default image size cap in bytes (one compressed snapshot).
pub const IMAGE_SIZE_CAP: usize = 30_000;

/// Largest state response body accepted from the hub.
pub const STATE_BODY_CAPACITY: usize = 1536;

/// Maximum number of polled sensor entities.
pub const MAX_SENSORS: usize = 8;

/// Touch debounce window in milliseconds.
pub const TOUCH_DEBOUNCE_MS: u64 = 50;

// =============================================================================
// Unit Tests
// =============================================================================
