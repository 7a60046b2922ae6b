//! Notice overlay for command feedback.
//!
//! The notice appears centered on the camera area with a white border. Its
//! background tells the outcome at a glance: green for sent, orange for busy, red
//! for failed. Button input stays live while it is shown.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use heapless::String;

use crate::colors::{DARK_GREEN, ORANGE, RED, WHITE};
use crate::config::layout::{CAMERA_CENTER_Y, CENTER_X, NOTICE_AREA, NOTICE_HEIGHT, NOTICE_WIDTH};
use crate::state::NoticeKind;
use crate::styles::{CENTERED, TITLE_STYLE_WHITE, VALUE_STYLE_WHITE};

const NOTICE_BG: Rectangle = Rectangle::new(
    Point::new(CENTER_X - (NOTICE_WIDTH / 2) as i32, CAMERA_CENTER_Y - (NOTICE_HEIGHT / 2) as i32),
    Size::new(NOTICE_WIDTH, NOTICE_HEIGHT),
);

const TEXT1_POS: Point = Point::new(CENTER_X, CAMERA_CENTER_Y - 2);
const TEXT2_POS: Point = Point::new(CENTER_X, CAMERA_CENTER_Y + 18);
const SINGLE_TEXT_POS: Point = Point::new(CENTER_X, CAMERA_CENTER_Y + 6);

const WHITE_FILL: PrimitiveStyle<Rgb565> = PrimitiveStyle::with_fill(WHITE);

/// Background color for `kind`.
pub const fn notice_color(kind: &NoticeKind) -> Rgb565 {
    match kind {
        NoticeKind::CommandSent(_) => DARK_GREEN,
        NoticeKind::CommandBusy(_) => ORANGE,
        NoticeKind::CommandFailed(..) => RED,
    }
}

/// Headline (`"CANCEL SENT"`) and, for failures, the error (`"TIMEOUT"`).
pub fn notice_text(kind: &NoticeKind) -> (String<20>, Option<String<20>>) {
    let mut headline = String::new();
    let label = kind.action().label();
    let detail = match kind {
        NoticeKind::CommandSent(_) => {
            let _ = write!(headline, "{label} SENT");
            None
        }
        NoticeKind::CommandBusy(_) => {
            let _ = write!(headline, "{label} BUSY");
            None
        }
        NoticeKind::CommandFailed(_, err) => {
            let _ = write!(headline, "{label} FAILED");
            let mut detail = String::new();
            let _ = write!(detail, "{err}");
            Some(detail)
        }
    };
    (headline, detail)
}

/// Draw the notice for `kind`.
pub fn draw_notice<D>(
    display: &mut D,
    kind: &NoticeKind,
) where
    D: DrawTarget<Color = Rgb565>,
{
    // White border (drawn as larger rectangle behind the box)
    NOTICE_AREA.into_styled(WHITE_FILL).draw(display).ok();
    NOTICE_BG
        .into_styled(PrimitiveStyle::with_fill(notice_color(kind)))
        .draw(display)
        .ok();

    let (headline, detail) = notice_text(kind);
    match detail {
        Some(detail) => {
            Text::with_text_style(&headline, TEXT1_POS, TITLE_STYLE_WHITE, CENTERED)
                .draw(display)
                .ok();
            Text::with_text_style(&detail, TEXT2_POS, VALUE_STYLE_WHITE, CENTERED)
                .draw(display)
                .ok();
        }
        None => {
            Text::with_text_style(&headline, SINGLE_TEXT_POS, TITLE_STYLE_WHITE, CENTERED)
                .draw(display)
                .ok();
        }
    }
}
