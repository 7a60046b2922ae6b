//! State management for the dashboard.
//!
//! - `cache`: Last known sensor readings, single writer (the poll scheduler)
//! - `touch`: Touch press edge detection and zone hit-testing
//! - `notice`: Transient notification state

mod cache;
mod notice;
mod touch;

pub use cache::{Freshness, Reading, StateCache, TEXT_CAPACITY, Value};
pub use notice::{Notice, NoticeKind};
pub use touch::{TouchEvent, TouchTracker, Zone, hit_test};
