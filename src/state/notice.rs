//! Transient notification state.
//!
//! A notice appears when a command is sent, fails, or is refused because the same
//! button is still busy, and disappears on its own after the configured duration.
//! Only one notice is shown at a time; a newer one replaces the older.

use embassy_time::{Duration, Instant};

use crate::command::Action;
use crate::error::FetchError;

/// What the notice reports.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoticeKind {
    /// Hub accepted the command.
    CommandSent(Action),
    /// Command request failed.
    CommandFailed(Action, FetchError),
    /// Tap refused: a command for this button is still outstanding.
    CommandBusy(Action),
}

impl NoticeKind {
    pub const fn action(&self) -> Action {
        match self {
            Self::CommandSent(a) | Self::CommandFailed(a, _) | Self::CommandBusy(a) => *a,
        }
    }

    /// Whether the notice reports a problem.
    pub const fn is_error(&self) -> bool { matches!(self, Self::CommandFailed(..)) }
}

/// Active notice with its start time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Notice {
    kind: NoticeKind,
    shown_at: Instant,
}

impl Notice {
    pub const fn new(
        kind: NoticeKind,
        now: Instant,
    ) -> Self {
        Self { kind, shown_at: now }
    }

    #[inline]
    pub const fn kind(&self) -> NoticeKind { self.kind }

    #[inline]
    pub const fn shown_at(&self) -> Instant { self.shown_at }

    /// Check if this notice has expired.
    #[inline]
    pub fn is_expired(
        &self,
        now: Instant,
        duration: Duration,
    ) -> bool {
        now.saturating_duration_since(self.shown_at) >= duration
    }
}
