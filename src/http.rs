//! HTTP client adapter contract and the bounded transfer state machine built on it.
//!
//! The board support code owns the network stack and implements [`HttpClient`]. Every
//! call is non-blocking: `start` queues a request, `poll` advances it by one step and
//! `abort` abandons it. Each engine component talks on its own [`Channel`], so a slow
//! camera download never holds up a state poll or a button press.
//!
//! [`Transfer`] drives one exchange to completion for the engine: it checks the
//! status, enforces the caller's byte bound and the request deadline, and aborts the
//! channel on every failure so no connection is left half-read.

use embassy_time::{Duration, Instant};

use crate::error::FetchError;

/// HTTP method.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
}

/// Logical connection used by one engine component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Sensor state polling.
    State,
    /// Camera snapshot downloads (one at a time, shared by both slots).
    Camera,
    /// Button presses, one channel per button index.
    Command(u8),
}

/// Request handed to [`HttpClient::start`]. The adapter copies what it needs.
#[derive(Clone, Copy, Debug)]
pub struct Request<'r> {
    pub method: Method,
    pub url: &'r str,
    /// Opaque access token; the adapter sends it as `Authorization: Bearer <credential>`.
    pub credential: &'r str,
    /// JSON body (`Content-Type: application/json`).
    pub body: Option<&'r [u8]>,
}

/// One step of an exchange as reported by [`HttpClient::poll`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// Nothing new yet.
    Pending,
    /// Response head received.
    Head {
        status: u16,
        content_length: Option<usize>,
    },
    /// `n` body bytes were written to the front of the buffer.
    Body(usize),
    /// Response complete; the adapter has released the connection.
    Done,
}

/// Adapter-level failure.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpError {
    Timeout,
    Status(u16),
    Transport,
}

/// Non-blocking HTTP client provided by the platform.
pub trait HttpClient {
    /// Begin a request on `channel`. Any previous exchange on the channel is finished.
    fn start(
        &mut self,
        channel: Channel,
        request: &Request<'_>,
    ) -> Result<(), HttpError>;

    /// Advance the exchange on `channel`. Body bytes go to the front of `buf`, never
    /// more than `buf.len()`.
    fn poll(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
    ) -> Result<Progress, HttpError>;

    /// Abandon the exchange on `channel` and release its connection.
    fn abort(
        &mut self,
        channel: Channel,
    );
}

// =============================================================================
// Transfer
// =============================================================================

/// What happens when the body does not fit the buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Overflow {
    /// Fail with [`FetchError::Oversized`].
    Reject,
    /// Keep reading and overwrite; the body is not needed.
    Discard,
}

/// Result of one [`Transfer::advance`] call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Step {
    Pending,
    /// Body complete; `filled` bytes at the front of the buffer.
    Complete { filled: usize },
    Failed(FetchError),
}

/// One in-flight exchange on a channel.
#[derive(Debug)]
pub(crate) struct Transfer {
    channel: Channel,
    deadline: Instant,
    overflow: Overflow,
    filled: usize,
}

impl Transfer {
    /// Start `request` on `channel`, with a deadline of `now + timeout`.
    pub(crate) fn start<H: HttpClient>(
        http: &mut H,
        channel: Channel,
        request: &Request<'_>,
        now: Instant,
        timeout: Duration,
        overflow: Overflow,
    ) -> Result<Self, FetchError> {
        if let Err(err) = http.start(channel, request) {
            http.abort(channel);
            return Err(err.into());
        }
        Ok(Self {
            channel,
            deadline: now + timeout,
            overflow,
            filled: 0,
        })
    }

    /// Poll the adapter once, writing body bytes into `buf` after those already received.
    pub(crate) fn advance<H: HttpClient>(
        &mut self,
        http: &mut H,
        buf: &mut [u8],
        now: Instant,
    ) -> Step {
        if now >= self.deadline {
            return self.fail(http, FetchError::TIMEOUT);
        }

        if self.overflow == Overflow::Discard && self.filled >= buf.len() {
            self.filled = 0;
        }

        // A full buffer still gets polled through a one-byte window so any further body
        // byte is seen as overflow rather than stalling the exchange.
        let mut spare = [0u8; 1];
        let full = self.filled >= buf.len();
        let window: &mut [u8] = if full { &mut spare } else { &mut buf[self.filled..] };
        let room = window.len();

        match http.poll(self.channel, window) {
            Ok(Progress::Pending) => Step::Pending,
            Ok(Progress::Head { status, content_length }) => {
                if !(200..300).contains(&status) {
                    return self.fail(http, FetchError::HttpStatus(status));
                }
                if self.overflow == Overflow::Reject && content_length.is_some_and(|len| len > buf.len()) {
                    return self.fail(http, FetchError::Oversized);
                }
                Step::Pending
            }
            Ok(Progress::Body(0)) => Step::Pending,
            Ok(Progress::Body(n)) => {
                if full {
                    return self.fail(http, FetchError::Oversized);
                }
                self.filled += n.min(room);
                Step::Pending
            }
            Ok(Progress::Done) => Step::Complete { filled: self.filled },
            Err(err) => self.fail(http, err.into()),
        }
    }

    fn fail<H: HttpClient>(
        &mut self,
        http: &mut H,
        err: FetchError,
    ) -> Step {
        http.abort(self.channel);
        Step::Failed(err)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
