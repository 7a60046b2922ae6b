//! Widget components for the printer dashboard display.
//!
//! All widgets are generic over `DrawTarget<Color = Rgb565>` for platform independence.
//!
//! - [`status_bar`]: Progress, finish estimate, temperatures and printer state
//! - [`button_bar`]: Pause / resume / cancel buttons
//! - [`camera`]: Camera viewport with placeholder and failure marker
//! - [`notice`]: Command feedback overlay
//! - [`primitives`]: Shared low-level drawing utilities
//!
//! Each widget fully repaints its own zone, so the compositor can redraw zones
//! independently in any order.

pub mod button_bar;
pub mod camera;
pub mod notice;
pub mod primitives;
pub mod status_bar;

pub use button_bar::{button_area, draw_button_bar};
pub use camera::draw_camera;
pub use notice::draw_notice;
pub use status_bar::{StatusView, draw_status_bar, finish_clock};
