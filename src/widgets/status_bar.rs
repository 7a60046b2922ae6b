//! Top status bar: job progress, finish estimate, temperatures, printer state.
//!
//! ```text
//! +--------------------------------------------------------+
//! | 42%          ETA 14:30             B 60     T 210       |
//! | [=========-----------------]        o PRINTING          |
//! +--------------------------------------------------------+
//! ```
//!
//! Every value is drawn white when fresh, gray when the latest poll cycle failed, and
//! as `--` before the first successful poll. While offline the printer state is
//! replaced by a red `OFFLINE` marker.

use core::fmt::Write;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use heapless::String;

use super::primitives::{draw_progress_bar, fill_area, push_truncated};
use crate::colors::{BAR_BG, GRAY, GREEN, RED, TRACK};
use crate::config::layout::{CENTER_X, SCREEN_WIDTH, STATUS_BAR};
use crate::state::Reading;
use crate::styles::{
    CENTERED,
    LABEL_FONT,
    LABEL_STYLE_GRAY,
    LABEL_STYLE_WHITE,
    LEFT_ALIGNED,
    RIGHT_ALIGNED,
    VALUE_STYLE_STALE,
    VALUE_STYLE_WHITE,
};

// =============================================================================
// Layout Constants
// =============================================================================

/// Baseline of the value row.
const VALUE_BASELINE: i32 = 18;

/// Baseline of the small label row.
const LABEL_BASELINE: i32 = 35;

const PROGRESS_POS: Point = Point::new(6, VALUE_BASELINE);
const FINISH_POS: Point = Point::new(CENTER_X - 20, VALUE_BASELINE);
const BED_POS: Point = Point::new(SCREEN_WIDTH as i32 - 66, VALUE_BASELINE);
const TOOL_POS: Point = Point::new(SCREEN_WIDTH as i32 - 6, VALUE_BASELINE);
const STATE_POS: Point = Point::new(SCREEN_WIDTH as i32 - 6, LABEL_BASELINE);

const PROGRESS_BAR: Rectangle = Rectangle::new(Point::new(6, 27), Size::new(200, 8));
const INDICATOR: Circle = Circle::new(Point::new(222, 27), 8);

const INDICATOR_ON: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_fill(GREEN);
const INDICATOR_OFF: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_stroke(GRAY, 1);
const OFFLINE_STYLE: MonoTextStyle<'static, Rgb565> = MonoTextStyle::new(LABEL_FONT, RED);

/// Placeholder for a value that has never been polled or is unavailable.
const NO_VALUE: &str = "--";

// =============================================================================
// Formatting
// =============================================================================

/// Readings shown in the status bar.
#[derive(Clone, Copy, Debug)]
pub struct StatusView<'r> {
    pub progress: &'r Reading,
    pub finish: &'r Reading,
    pub bed: &'r Reading,
    pub tool: &'r Reading,
    pub printing: &'r Reading,
    /// Latest poll cycle failed.
    pub offline: bool,
    /// Offset applied to timestamped finish estimates.
    pub utc_offset_minutes: i16,
}

/// Value text style for `reading`: gray when stale.
pub const fn value_style(reading: &Reading) -> MonoTextStyle<'static, Rgb565> {
    if reading.stale { VALUE_STYLE_STALE } else { VALUE_STYLE_WHITE }
}

/// Progress percentage, clamped to 0..=100.
pub fn progress_percent(reading: &Reading) -> Option<f32> { reading.number().map(|p| p.clamp(0.0, 100.0)) }

/// `"42%"`, or `"--"` without a number.
pub fn format_progress(reading: &Reading) -> String<8> {
    let mut out = String::new();
    match progress_percent(reading) {
        Some(percent) => {
            let _ = write!(out, "{percent:.0}%");
        }
        None => push_truncated(&mut out, NO_VALUE),
    }
    out
}

/// `"B 60"` style temperature, or `"B --"`.
pub fn format_temp(
    prefix: char,
    reading: &Reading,
) -> String<8> {
    let mut out = String::new();
    match reading.number() {
        Some(temp) => {
            let _ = write!(out, "{prefix} {temp:.0}");
        }
        None => {
            let _ = write!(out, "{prefix} {NO_VALUE}");
        }
    }
    out
}

/// `"ETA HH:MM"` for timestamps, `"ETA <text>"` for other text, `"ETA --"` otherwise.
pub fn format_finish(
    reading: &Reading,
    utc_offset_minutes: i16,
) -> String<12> {
    let mut out = String::new();
    push_truncated(&mut out, "ETA ");
    match reading.text() {
        Some(text) => match finish_clock(text, utc_offset_minutes) {
            Some((hour, minute)) => {
                let _ = write!(out, "{hour:02}:{minute:02}");
            }
            None => push_truncated(&mut out, text),
        },
        None => push_truncated(&mut out, NO_VALUE),
    }
    out
}

/// Wall clock `(hour, minute)` of an ISO-8601 timestamp such as
/// `2026-10-17T12:30:00+00:00`.
///
/// Timestamps with a zone designator are converted to UTC and shifted by
/// `utc_offset_minutes`; timestamps without one are shown as written.
pub fn finish_clock(
    text: &str,
    utc_offset_minutes: i16,
) -> Option<(u8, u8)> {
    let (_, time) = text.split_once('T')?;
    if time.as_bytes().get(2) != Some(&b':') {
        return None;
    }
    let hour: i32 = parse_digits(time.get(0..2)?)?;
    let minute: i32 = parse_digits(time.get(3..5)?)?;
    if hour > 23 || minute > 59 {
        return None;
    }

    let mut minutes = hour * 60 + minute;
    if let Some(zone) = zone_offset_minutes(&time[5..]) {
        minutes += i32::from(utc_offset_minutes) - zone;
    }
    let minutes = minutes.rem_euclid(24 * 60);
    Some(((minutes / 60) as u8, (minutes % 60) as u8))
}

/// Zone designator after the minutes (`Z`, `+02:00`, `-0500`), in minutes east of UTC.
fn zone_offset_minutes(rest: &str) -> Option<i32> {
    if rest.ends_with('Z') {
        return Some(0);
    }
    let sign_at = rest.rfind(['+', '-'])?;
    let sign = if rest.as_bytes()[sign_at] == b'-' { -1 } else { 1 };
    let zone = &rest[sign_at + 1..];
    let hours: i32 = parse_digits(zone.get(0..2)?)?;
    let minutes: i32 = match zone.get(2..) {
        Some(tail) if !tail.is_empty() => parse_digits(tail.trim_start_matches(':').get(0..2)?)?,
        _ => 0,
    };
    Some(sign * (hours * 60 + minutes))
}

fn parse_digits(digits: &str) -> Option<i32> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Printer state from the binary sensor: `Some(true)` while printing.
pub fn printing_state(reading: &Reading) -> Option<bool> {
    match reading.text()? {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Drawing
// =============================================================================

/// Draw the whole status bar.
pub fn draw_status_bar<D>(
    display: &mut D,
    view: &StatusView<'_>,
) where
    D: DrawTarget<Color = Rgb565>,
{
    fill_area(display, &STATUS_BAR, BAR_BG);

    Text::with_text_style(&format_progress(view.progress), PROGRESS_POS, value_style(view.progress), LEFT_ALIGNED)
        .draw(display)
        .ok();

    let finish = format_finish(view.finish, view.utc_offset_minutes);
    Text::with_text_style(&finish, FINISH_POS, value_style(view.finish), CENTERED)
        .draw(display)
        .ok();

    Text::with_text_style(&format_temp('B', view.bed), BED_POS, value_style(view.bed), RIGHT_ALIGNED)
        .draw(display)
        .ok();
    Text::with_text_style(&format_temp('T', view.tool), TOOL_POS, value_style(view.tool), RIGHT_ALIGNED)
        .draw(display)
        .ok();

    let bar_color = if view.progress.stale { GRAY } else { GREEN };
    let fraction = progress_percent(view.progress).map_or(0.0, |p| p / 100.0);
    draw_progress_bar(display, &PROGRESS_BAR, fraction, bar_color, TRACK);

    if view.offline {
        Text::with_text_style("OFFLINE", STATE_POS, OFFLINE_STYLE, RIGHT_ALIGNED)
            .draw(display)
            .ok();
        return;
    }

    let (label, style, indicator) = match printing_state(view.printing) {
        Some(true) => ("PRINTING", LABEL_STYLE_WHITE, INDICATOR_ON),
        Some(false) => ("IDLE", LABEL_STYLE_GRAY, INDICATOR_OFF),
        None => (NO_VALUE, LABEL_STYLE_GRAY, INDICATOR_OFF),
    };
    INDICATOR.into_styled(indicator).draw(display).ok();
    Text::with_text_style(label, STATE_POS, style, RIGHT_ALIGNED)
        .draw(display)
        .ok();
}

// =============================================================================
// Unit Tests
// =============================================================================
