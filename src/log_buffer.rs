//! Engine log: a small ring of recent events kept on the device.
//!
//! The `log_*!` macros format into a fixed-size string and append it to [`LOG_BUFFER`],
//! which holds the newest [`LOG_ENTRIES`] entries. Board code or the simulator reads
//! them back with [`drain_logs`]. With the `defmt` feature enabled every message is
//! also forwarded to `defmt`.
//!
//! ```ignore
//! log_info!("{} sent", action);
//! log_warn!("Camera {} fetch failed: {}", slot, err);
//! ```
//!
//! Entries carry the time of the last loop tick published through [`set_clock`], so
//! logging never reads the clock.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Instant;
use heapless::{Deque, String};

/// Entries kept before the oldest is overwritten.
pub const LOG_ENTRIES: usize = 14;

/// Longest message kept, in bytes.
pub const LOG_MSG_LEN: usize = 40;

/// Log severity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Single-character tag (`D`, `I`, `W`, `E`).
    pub const fn prefix(self) -> char {
        match self {
            Self::Debug => 'D',
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }
}

/// One logged event.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Message, cut on a char boundary at [`LOG_MSG_LEN`] bytes.
    pub message: String<LOG_MSG_LEN>,
    /// Loop tick in milliseconds.
    pub timestamp_ms: u32,
}

impl LogEntry {
    pub fn new(
        level: LogLevel,
        message: &str,
        timestamp_ms: u32,
    ) -> Self {
        let mut kept = String::new();
        for c in message.chars() {
            if kept.push(c).is_err() {
                break;
            }
        }
        Self {
            level,
            message: kept,
            timestamp_ms,
        }
    }
}

/// Ring of the newest entries, oldest first.
pub struct LogBuffer {
    entries: Deque<LogEntry, LOG_ENTRIES>,
    /// Entries overwritten before anyone read them.
    overwritten: u32,
}

impl LogBuffer {
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
            overwritten: 0,
        }
    }

    /// Append `entry`, overwriting the oldest when full.
    pub fn push(
        &mut self,
        entry: LogEntry,
    ) {
        if self.entries.is_full() {
            self.entries.pop_front();
            self.overwritten = self.overwritten.saturating_add(1);
        }
        // Room was made above
        let _ = self.entries.push_back(entry);
    }

    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries lost to overwriting since the last [`LogBuffer::clear`].
    #[inline]
    pub const fn overwritten(&self) -> u32 { self.overwritten }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.overwritten = 0;
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> { self.entries.iter() }
}

impl Default for LogBuffer {
    fn default() -> Self { Self::new() }
}

/// Engine-wide log.
pub static LOG_BUFFER: Mutex<CriticalSectionRawMutex, LogBuffer> = Mutex::new(LogBuffer::new());

static CLOCK_MS: AtomicU32 = AtomicU32::new(0);

/// Publish the current loop tick for log timestamps.
#[inline]
pub fn set_clock(now: Instant) { CLOCK_MS.store(now.as_millis() as u32, Ordering::Relaxed); }

#[inline]
pub fn current_timestamp_ms() -> u32 { CLOCK_MS.load(Ordering::Relaxed) }

/// Append a message to [`LOG_BUFFER`]. Dropped if the buffer is locked.
pub fn push_log(
    level: LogLevel,
    message: &str,
) {
    if let Ok(mut buffer) = LOG_BUFFER.try_lock() {
        buffer.push(LogEntry::new(level, message, current_timestamp_ms()));
    }
}

/// Hand every buffered entry to `sink`, oldest first, and empty the buffer.
///
/// Returns the number of entries lost to overwriting since the previous drain, or
/// `None` if the buffer was locked.
pub fn drain_logs(mut sink: impl FnMut(&LogEntry)) -> Option<u32> {
    let mut buffer = LOG_BUFFER.try_lock().ok()?;
    buffer.iter().for_each(&mut sink);
    let lost = buffer.overwritten();
    buffer.clear();
    Some(lost)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $defmt:ident, $($arg:tt)*) => {{
        use core::fmt::Write as _;
        let mut buf: heapless::String<{ $crate::log_buffer::LOG_MSG_LEN }> = heapless::String::new();
        // Overlong messages are cut, which is fine for the ring
        let _ = write!(buf, $($arg)*);
        $crate::log_buffer::push_log($crate::log_buffer::LogLevel::$level, buf.as_str());
        #[cfg(feature = "defmt")]
        defmt::$defmt!($($arg)*);
    }};
}

/// Log at Debug level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log!(Debug, debug, $($arg)*) };
}

/// Log at Info level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log!(Info, info, $($arg)*) };
}

/// Log at Warn level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log!(Warn, warn, $($arg)*) };
}

/// Log at Error level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log!(Error, error, $($arg)*) };
}

// =============================================================================
// Unit Tests
// =============================================================================
