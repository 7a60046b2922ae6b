//! Camera viewport: the slot's last good frame, or a placeholder.
//!
//! The slot stores only the part of its snapshot that lands in the viewport (the
//! bottom or top of a 240 px image in the 175 px camera area). Parts of the viewport
//! the frame does not cover are cleared to black first.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;

use super::primitives::fill_area;
use crate::camera::CameraSlot;
use crate::colors::{BLACK, RED};
use crate::config::layout::FAILURE_MARKER_SIZE;
use crate::styles::{CENTERED_MIDDLE, LABEL_STYLE_GRAY};

/// Distance of the failure marker from the viewport's top-right corner.
const MARKER_MARGIN: u32 = 4;

const MARKER_FILL: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_fill(RED);

/// Square drawn in `viewport`'s top-right corner after a failed fetch.
pub fn failure_marker(viewport: &Rectangle) -> Rectangle {
    let offset = viewport.size.width.saturating_sub(FAILURE_MARKER_SIZE + MARKER_MARGIN);
    Rectangle::new(
        viewport.top_left + Point::new(offset as i32, MARKER_MARGIN as i32),
        Size::new_equal(FAILURE_MARKER_SIZE),
    )
}

/// Draw `slot` into its viewport.
pub fn draw_camera<D>(
    display: &mut D,
    slot: &CameraSlot<'_>,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let viewport = slot.config().viewport;

    match slot.frame() {
        Some(frame) => {
            if frame.area() != viewport {
                fill_area(display, &viewport, BLACK);
            }
            frame.draw_clipped(display, &viewport);
        }
        None => {
            fill_area(display, &viewport, BLACK);
            Text::with_text_style("NO IMAGE", viewport.center(), LABEL_STYLE_GRAY, CENTERED_MIDDLE)
                .draw(&mut display.clipped(&viewport))
                .ok();
        }
    }

    if slot.last_error().is_some() {
        failure_marker(&viewport).into_styled(MARKER_FILL).draw(display).ok();
    }
}
