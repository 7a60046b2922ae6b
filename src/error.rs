//! Error taxonomy.
//!
//! Nothing here is fatal: fetch failures turn into stale indicators or a kept camera
//! frame, command failures into a transient notice.
//!
//! | Kind | Raised by |
//! |------|-----------|
//! | `Transport` | connection failures and request deadlines |
//! | `HttpStatus` | non-2xx responses |
//! | `Oversized` | payloads larger than their buffer |
//! | `Malformed` | undecodable bodies and images |
//! | `Rejected::InFlight` | a second submit for a busy button |

use core::fmt;

use crate::http::HttpError;

/// Why a transport failed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    /// No response within the request deadline.
    Timeout,
    /// Connection refused, reset, or the request could not be sent.
    Connection,
}

/// Failure of a single fetch (state, camera or command).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    Transport(TransportKind),
    /// Non-2xx response status.
    HttpStatus(u16),
    /// Payload exceeded the byte cap; the transfer was abandoned.
    Oversized,
    /// Payload arrived complete but could not be decoded.
    Malformed,
}

impl FetchError {
    pub const TIMEOUT: Self = Self::Transport(TransportKind::Timeout);
    pub const CONNECTION: Self = Self::Transport(TransportKind::Connection);
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout => Self::TIMEOUT,
            HttpError::Status(code) => Self::HttpStatus(code),
            HttpError::Transport => Self::CONNECTION,
        }
    }
}

impl From<DecodeError> for FetchError {
    fn from(_: DecodeError) -> Self { Self::Malformed }
}

impl fmt::Display for FetchError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Transport(TransportKind::Timeout) => f.write_str("TIMEOUT"),
            Self::Transport(TransportKind::Connection) => f.write_str("NO CONNECTION"),
            Self::HttpStatus(code) => write!(f, "HTTP {code}"),
            Self::Oversized => f.write_str("OVERSIZED"),
            Self::Malformed => f.write_str("MALFORMED"),
        }
    }
}

/// Submission refused by the command dispatcher.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejected {
    /// A command for the same button entity is still outstanding.
    InFlight,
}

impl fmt::Display for Rejected {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::InFlight => f.write_str("IN FLIGHT"),
        }
    }
}

/// Image decode failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Zero-length payload.
    Empty,
    /// Not a valid image of the expected format.
    Corrupt,
    /// Image dimensions exceed the allowed frame size.
    TooLarge,
    /// Pixel layout the frame format cannot represent.
    Unsupported,
}

impl fmt::Display for DecodeError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let text = match self {
            Self::Empty => "empty image",
            Self::Corrupt => "corrupt image",
            Self::TooLarge => "image too large",
            Self::Unsupported => "unsupported pixel format",
        };
        f.write_str(text)
    }
}

/// Invalid configuration, reported once at startup.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ImageCapZero,
    /// Image cap larger than the scratch buffer handed to the pipeline.
    ImageCapExceedsBuffer,
    ZeroInterval,
    ZeroTimeout,
    /// Empty base URL or one ending in `/`.
    BaseUrl,
    EmptyEntity,
    /// A request URL or body does not fit its fixed-size buffer.
    UrlTooLong,
    /// Camera viewport (by slot index) is empty or leaves the screen.
    ViewportOutOfBounds(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::ImageCapZero => f.write_str("image size cap is zero"),
            Self::ImageCapExceedsBuffer => f.write_str("image size cap exceeds scratch buffer"),
            Self::ZeroInterval => f.write_str("sensor interval is zero"),
            Self::ZeroTimeout => f.write_str("request timeout is zero"),
            Self::BaseUrl => f.write_str("invalid base URL"),
            Self::EmptyEntity => f.write_str("empty entity id"),
            Self::UrlTooLong => f.write_str("request URL too long"),
            Self::ViewportOutOfBounds(slot) => write!(f, "camera {} viewport outside screen", slot + 1),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
