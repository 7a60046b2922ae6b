//! Color constants for the printer dashboard.
//!
//! Uses the built-in `RgbColor` trait constants where they exist, custom
//! `Rgb565::new(r, g, b)` values otherwise.
//!
//! ## Rgb565 Color Format
//!
//! Rgb565 uses 16 bits per pixel: 5 bits red, 6 bits green, 5 bits blue.
//! - Red: 0-31 (5 bits)
//! - Green: 0-63 (6 bits)
//! - Blue: 0-31 (5 bits)
//!
//! This format is native to the ILI9341/ST7789 panels this dashboard targets and
//! requires no conversion when writing to the display.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait - guaranteed optimal values)
// =============================================================================

/// Pure black (0, 0, 0). Camera placeholder and screen background.
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white (31, 63, 31). Text on dark bars.
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red (31, 0, 0). Cancel button, failure notices, offline marker.
pub const RED: Rgb565 = Rgb565::RED;

/// Pure green (0, 63, 0). Progress bar fill and "printing" indicator.
pub const GREEN: Rgb565 = Rgb565::GREEN;

/// Pure yellow (31, 63, 0). Highlight for a button whose command is in flight.
pub const YELLOW: Rgb565 = Rgb565::YELLOW;

// =============================================================================
// Custom Colors (application-specific)
// =============================================================================

/// Orange (31, 32, 0). Pause button and "busy" notices.
pub const ORANGE: Rgb565 = Rgb565::new(31, 32, 0);

/// Mid gray (16, 32, 16). Stale sensor values and log debug entries.
pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Dark slate (3, 7, 5). Status and button bar backgrounds.
pub const BAR_BG: Rgb565 = Rgb565::new(3, 7, 5);

/// Dark green (0, 24, 8). Resume button and "command sent" notices.
pub const DARK_GREEN: Rgb565 = Rgb565::new(0, 24, 8);

/// Dark gray (6, 12, 6). Empty part of the progress bar.
pub const TRACK: Rgb565 = Rgb565::new(6, 12, 6);
