//! Bottom button bar: pause, resume and cancel.
//!
//! The bar is split into equal thirds matching the touch hit-test. A button whose
//! command is still outstanding is drawn highlighted until the hub answers.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::Text;

use super::primitives::{fill_area, fill_inset};
use crate::colors::{BAR_BG, DARK_GREEN, ORANGE, RED, YELLOW};
use crate::command::Action;
use crate::config::layout::{BOTTOM_BAR_HEIGHT, BUTTON_BAR_Y, BUTTON_WIDTH, SCREEN_WIDTH};
use crate::styles::{CENTERED_MIDDLE, TITLE_STYLE_BLACK, TITLE_STYLE_WHITE};

/// Gap left between neighbouring buttons.
const BUTTON_INSET: u32 = 2;

/// Screen area of `action`'s button. The last button absorbs the rounding remainder.
pub const fn button_area(action: Action) -> Rectangle {
    let index = action.index() as u32;
    let width = if index == 2 { SCREEN_WIDTH - BUTTON_WIDTH * 2 } else { BUTTON_WIDTH };
    Rectangle::new(
        Point::new((index * BUTTON_WIDTH) as i32, BUTTON_BAR_Y),
        Size::new(width, BOTTOM_BAR_HEIGHT),
    )
}

/// Resting color of `action`'s button.
pub const fn button_color(action: Action) -> Rgb565 {
    match action {
        Action::Pause => ORANGE,
        Action::Resume => DARK_GREEN,
        Action::Cancel => RED,
    }
}

/// Draw one button; `busy` highlights it.
pub fn draw_button<D>(
    display: &mut D,
    action: Action,
    busy: bool,
) where
    D: DrawTarget<Color = Rgb565>,
{
    let area = button_area(action);
    fill_area(display, &area, BAR_BG);

    let (fill, style) = if busy { (YELLOW, TITLE_STYLE_BLACK) } else { (button_color(action), TITLE_STYLE_WHITE) };
    fill_inset(display, &area, BUTTON_INSET, fill);
    Text::with_text_style(action.label(), area.center(), style, CENTERED_MIDDLE)
        .draw(display)
        .ok();
}

/// Draw all three buttons. `busy` is indexed by [`Action::index`].
pub fn draw_button_bar<D>(
    display: &mut D,
    busy: [bool; 3],
) where
    D: DrawTarget<Color = Rgb565>,
{
    for action in Action::ALL {
        draw_button(display, action, busy[action.index()]);
    }
}
