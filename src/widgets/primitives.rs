//! Low-level drawing primitives shared across widgets.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use heapless::String;

/// Fill `area` with a solid color.
pub fn fill_area<D>(
    display: &mut D,
    area: &Rectangle,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    area.into_styled(PrimitiveStyle::with_fill(color)).draw(display).ok();
}

/// Fill `area` shrunk by `inset` pixels on every side.
///
/// Leaves a border of whatever was underneath, which separates adjacent boxes
/// without drawing explicit lines.
pub fn fill_inset<D>(
    display: &mut D,
    area: &Rectangle,
    inset: u32,
    color: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    // Guard against underflow with small dimensions
    if area.size.width <= inset * 2 || area.size.height <= inset * 2 {
        return;
    }
    let inner = Rectangle::new(
        area.top_left + Point::new(inset as i32, inset as i32),
        Size::new(area.size.width - inset * 2, area.size.height - inset * 2),
    );
    fill_area(display, &inner, color);
}

/// Horizontal bar filled left to right by `fraction` (clamped to 0..=1).
pub fn draw_progress_bar<D>(
    display: &mut D,
    area: &Rectangle,
    fraction: f32,
    fill: Rgb565,
    track: Rgb565,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let filled = filled_width(area.size.width, fraction);
    let done = Rectangle::new(area.top_left, Size::new(filled, area.size.height));
    let rest = Rectangle::new(
        area.top_left + Point::new(filled as i32, 0),
        Size::new(area.size.width - filled, area.size.height),
    );
    fill_area(display, &done, fill);
    fill_area(display, &rest, track);
}

/// Pixels of a `width` wide bar covered by `fraction`.
pub fn filled_width(
    width: u32,
    fraction: f32,
) -> u32 {
    if fraction.is_nan() || fraction <= 0.0 {
        return 0;
    }
    ((width as f32 * fraction.min(1.0)) as u32).min(width)
}

/// Append as much of `text` as fits, stopping on a char boundary.
pub fn push_truncated<const N: usize>(
    out: &mut String<N>,
    text: &str,
) {
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}
