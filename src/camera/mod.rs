//! Camera image pipeline: fetch, size-check, decode, hand over a frame.
//!
//! - `scratch`: The shared download buffer and its lease
//! - `frame`: Decoded frames, the decoder trait and the JPEG decoder
//!
//! # Pipeline
//!
//! Both slots share one [`ScratchBuffer`], so only one snapshot downloads at a time
//! (on [`Channel::Camera`]). A fetch owns the buffer [`Lease`] for its whole life and
//! ends in exactly one place, `ImagePipeline::finish`, which decodes what was
//! received and hands the lease back whatever the outcome. The slot's frame is only
//! replaced by a successful decode; every failure keeps the previous frame.
//!
//! # Memory
//!
//! Everything is reserved in [`ImagePipeline::new`] and reused by every fetch: the
//! caller's scratch buffer, one decode workspace shared by both slots (sized by the
//! decoder for [`MAX_FRAME_SIZE`]) and one frame buffer per slot holding only what its
//! viewport can show. Decoders write to the workspace alone, so a failed decode never
//! touches a stored frame. With the default layout and [`JpegDecoder`] that is
//! 230,400 + 2 x 112,000 bytes next to the 30,000 byte scratch buffer.
//!
//! Slots take turns: if a slot asks while the other holds the buffer it is owed the
//! next turn, and the holder cannot start again until the owed slot has.

mod frame;
mod scratch;

use alloc::boxed::Box;
use alloc::vec;

use embassy_time::{Duration, Instant};
use embedded_graphics::prelude::Size;
#[cfg(feature = "jpeg")]
pub use frame::JpegDecoder;
pub use frame::{Frame, FrameDecoder, pack_rgb565, rgb565_be};
pub use scratch::{Lease, ScratchBuffer};

use crate::config::layout::MAX_FRAME_SIZE;
use crate::config::{CAMERA_SLOTS, CameraSlotConfig, DashboardConfig};
use crate::entity::Entity;
use crate::error::FetchError;
use crate::http::{Channel, HttpClient, Overflow, Request, Step, Transfer};

/// One of the two camera slots.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotId {
    First,
    Second,
}

impl SlotId {
    pub const ALL: [Self; CAMERA_SLOTS] = [Self::First, Self::Second];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// The other slot.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Result of [`ImagePipeline::request`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestOutcome {
    /// Fetch started; the slot holds the scratch buffer.
    Started,
    /// This slot's fetch is already running.
    AlreadyPending,
    /// The buffer is busy or it is the other slot's turn.
    Deferred,
    /// The refresh interval since the last fetch has not elapsed.
    NotDue,
    /// The request could not be sent; recorded as the slot's last error.
    Failed(FetchError),
}

/// A finished fetch reported by [`ImagePipeline::service`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotUpdate {
    pub slot: SlotId,
    /// `Ok` when the slot's frame was replaced.
    pub result: Result<(), FetchError>,
}

/// A camera slot: its configuration, latest frame and fetch bookkeeping.
pub struct CameraSlot<'a> {
    config: CameraSlotConfig<'a>,
    frame: Frame,
    has_frame: bool,
    last_error: Option<FetchError>,
    next_due: Option<Instant>,
    frames_decoded: u32,
}

impl<'a> CameraSlot<'a> {
    fn new(config: CameraSlotConfig<'a>) -> Self {
        Self {
            config,
            frame: Frame::for_viewport(&config.viewport),
            has_frame: false,
            last_error: None,
            next_due: None,
            frames_decoded: 0,
        }
    }

    #[inline]
    pub const fn config(&self) -> &CameraSlotConfig<'a> { &self.config }

    /// Latest successfully decoded frame.
    #[inline]
    pub fn frame(&self) -> Option<&Frame> { self.has_frame.then_some(&self.frame) }

    /// Error of the most recent fetch, cleared by the next success.
    #[inline]
    pub const fn last_error(&self) -> Option<FetchError> { self.last_error }

    /// Number of frames decoded into this slot so far.
    #[inline]
    pub const fn frames_decoded(&self) -> u32 { self.frames_decoded }

    fn is_due(
        &self,
        now: Instant,
    ) -> bool {
        self.next_due.is_none_or(|due| now >= due)
    }
}

/// The in-flight download. Owns the scratch lease until `ImagePipeline::finish`.
struct Fetch<'b> {
    slot: SlotId,
    transfer: Transfer,
    lease: Lease<'b>,
}

/// Fetches, validates and decodes camera snapshots for both slots.
pub struct ImagePipeline<'a, D> {
    slots: [CameraSlot<'a>; CAMERA_SLOTS],
    scratch: ScratchBuffer<'a>,
    in_flight: Option<Fetch<'a>>,
    /// Slot that asked while the buffer was busy; it goes next.
    owed: Option<SlotId>,
    decoder: D,
    /// Decoder output, shared by both slots.
    workspace: Box<[u8]>,
    base_url: &'a str,
    credential: &'a str,
    image_cap: usize,
    interval: Duration,
    timeout: Duration,
    max_frame: Size,
}

impl<'a, D: FrameDecoder> ImagePipeline<'a, D> {
    /// Pipeline for the cameras of `config`, downloading into `scratch`.
    pub fn new(
        config: &DashboardConfig<'a>,
        scratch: &'a mut [u8],
        decoder: D,
    ) -> Self {
        let [first, second] = config.cameras;
        let image_cap = config.image_size_cap.min(scratch.len());
        let workspace = vec![0; decoder.workspace_len(MAX_FRAME_SIZE)].into_boxed_slice();
        Self {
            slots: [CameraSlot::new(first), CameraSlot::new(second)],
            scratch: ScratchBuffer::new(scratch),
            in_flight: None,
            owed: None,
            decoder,
            workspace,
            base_url: config.base_url,
            credential: config.credential,
            image_cap,
            interval: config.camera_interval,
            timeout: config.request_timeout,
            max_frame: MAX_FRAME_SIZE,
        }
    }

    #[inline]
    pub fn slot(
        &self,
        id: SlotId,
    ) -> &CameraSlot<'a> {
        &self.slots[id.index()]
    }

    /// Slot currently downloading, if any.
    #[inline]
    pub fn in_flight(&self) -> Option<SlotId> { self.in_flight.as_ref().map(|fetch| fetch.slot) }

    /// Bytes reserved for decoding and storing frames, excluding the scratch buffer.
    pub fn frame_memory(&self) -> usize {
        self.workspace.len() + self.slots.iter().map(|slot| slot.frame.capacity()).sum::<usize>()
    }

    /// Whether the scratch buffer is free.
    #[inline]
    pub const fn is_buffer_free(&self) -> bool { self.scratch.is_free() }

    /// Start a fetch for `slot` if the buffer is free, the slot is due and it is its turn.
    pub fn request<H: HttpClient>(
        &mut self,
        slot: SlotId,
        now: Instant,
        http: &mut H,
    ) -> RequestOutcome {
        if self.in_flight() == Some(slot) {
            return RequestOutcome::AlreadyPending;
        }
        if !self.slots[slot.index()].is_due(now) {
            return RequestOutcome::NotDue;
        }
        if self.owed.is_some_and(|owed| owed != slot) {
            return RequestOutcome::Deferred;
        }
        let Some(lease) = self.scratch.acquire() else {
            self.owed = Some(slot);
            return RequestOutcome::Deferred;
        };
        if self.owed == Some(slot) {
            self.owed = None;
        }

        match self.begin(slot, now, http) {
            Ok(transfer) => {
                self.in_flight = Some(Fetch { slot, transfer, lease });
                RequestOutcome::Started
            }
            Err(err) => {
                self.scratch.release(lease);
                self.record(slot, Err(err), now);
                RequestOutcome::Failed(err)
            }
        }
    }

    /// Advance the running download by one step.
    ///
    /// Returns the slot update when the fetch ends during this call.
    pub fn service<H: HttpClient>(
        &mut self,
        now: Instant,
        http: &mut H,
    ) -> Option<SlotUpdate> {
        let mut fetch = self.in_flight.take()?;
        let cap = self.image_cap;
        match fetch.transfer.advance(http, &mut fetch.lease.as_mut_slice()[..cap], now) {
            Step::Pending => {
                self.in_flight = Some(fetch);
                None
            }
            Step::Complete { filled } => Some(self.finish(fetch, Ok(filled), now)),
            Step::Failed(err) => Some(self.finish(fetch, Err(err), now)),
        }
    }

    /// The single end of every fetch: decode on success, always return the lease.
    fn finish(
        &mut self,
        fetch: Fetch<'a>,
        received: Result<usize, FetchError>,
        now: Instant,
    ) -> SlotUpdate {
        let Fetch { slot, lease, .. } = fetch;
        let decoded = match received {
            Ok(filled) => self
                .decoder
                .decode(&lease.as_slice()[..filled], self.max_frame, &mut self.workspace)
                .map_err(FetchError::from),
            Err(err) => Err(err),
        };
        self.scratch.release(lease);

        let state = &mut self.slots[slot.index()];
        let stored = decoded.and_then(|size| {
            let CameraSlotConfig { draw_origin, viewport, .. } = state.config;
            state.frame.store_visible(&self.workspace, size, draw_origin, &viewport).map_err(FetchError::from)
        });
        let result = match stored {
            Ok(()) => {
                state.has_frame = true;
                state.frames_decoded = state.frames_decoded.wrapping_add(1);
                Ok(())
            }
            Err(err) => {
                log_warn!("Camera {} fetch failed: {}", slot.index() + 1, err);
                Err(err)
            }
        };
        self.record(slot, result, now);
        SlotUpdate { slot, result }
    }

    fn record(
        &mut self,
        slot: SlotId,
        result: Result<(), FetchError>,
        now: Instant,
    ) {
        let state = &mut self.slots[slot.index()];
        state.last_error = result.err();
        state.next_due = Some(now + self.interval);
    }

    fn begin<H: HttpClient>(
        &self,
        slot: SlotId,
        now: Instant,
        http: &mut H,
    ) -> Result<Transfer, FetchError> {
        let entity = Entity::Camera(self.slots[slot.index()].config.entity);
        let url = entity.url(self.base_url).map_err(|_| FetchError::CONNECTION)?;
        let request = Request {
            method: entity.method(),
            url: url.as_str(),
            credential: self.credential,
            body: None,
        };
        Transfer::start(http, Channel::Camera, &request, now, self.timeout, Overflow::Reject)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
