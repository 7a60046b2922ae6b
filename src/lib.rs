//! Printer dashboard library - the orchestration engine behind the smart display.
//!
//! Shows a 3D printer's state from a Home Assistant hub on a small touch display:
//! two camera snapshot feeds, a status bar (progress, finish estimate, temperatures)
//! and a pause / resume / cancel button bar.
//!
//! Everything here is host-testable logic. Board bring-up (WiFi, the HTTP stack,
//! the panel and touch controller) lives outside the crate and plugs in through
//! [`http::HttpClient`], [`dashboard::TouchSource`] and an `embedded-graphics`
//! `DrawTarget`.
//!
//! # Loop
//!
//! [`dashboard::Dashboard::tick`] is called repeatedly from a single cooperative loop.
//! Each call, in order:
//! 1. advances the [`poll::PollScheduler`] (sensor states into the [`state::StateCache`])
//! 2. advances the [`camera::ImagePipeline`] for both camera slots
//! 3. collects command completions, then drains at most one touch event into the
//!    [`command::CommandDispatcher`]
//! 4. repaints the zones flagged dirty in [`render::RenderState`]
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test --lib
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

// Logging macros must be defined before the modules that use them
#[macro_use]
pub mod log_buffer;

// Configuration
pub mod config;

// Remote side
pub mod entity;
pub mod error;
pub mod http;

// Engine components
pub mod camera;
pub mod command;
pub mod poll;
pub mod state;

// Rendering
pub mod colors;
pub mod dashboard;
pub mod render;
pub mod styles;
pub mod widgets;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, TickReport, TouchSource};
pub use error::{FetchError, Rejected, TransportKind};
