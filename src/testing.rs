//! Test doubles: a scripted HTTP client, an in-memory screen and a fake decoder.

use std::collections::{HashMap, HashSet, VecDeque};
use std::string::String;
use std::vec::Vec;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::camera::FrameDecoder;
use crate::error::DecodeError;
use crate::http::{Channel, HttpClient, HttpError, Method, Progress, Request};

// =============================================================================
// Fake HTTP
// =============================================================================

/// Scripted response for one request.
#[derive(Clone, Debug)]
pub(crate) struct Reply {
    head: Result<u16, HttpError>,
    body: Vec<u8>,
    chunk: usize,
    declare_length: bool,
    delay: usize,
    hang: bool,
}

impl Reply {
    /// 200 response with `body`, sent in one chunk with a content length.
    pub(crate) fn ok(body: &[u8]) -> Self {
        Self {
            head: Ok(200),
            body: body.to_vec(),
            chunk: usize::MAX,
            declare_length: true,
            delay: 0,
            hang: false,
        }
    }

    /// Response with `code` and an empty body.
    pub(crate) fn status(code: u16) -> Self {
        Self {
            head: Ok(code),
            ..Self::ok(b"")
        }
    }

    /// Adapter error on the first poll.
    pub(crate) fn error(err: HttpError) -> Self {
        Self {
            head: Err(err),
            ..Self::ok(b"")
        }
    }

    /// Never answers until [`FakeHttp::release`] is called.
    pub(crate) fn hang() -> Self {
        Self {
            hang: true,
            ..Self::ok(b"")
        }
    }

    pub(crate) fn chunked(
        mut self,
        chunk: usize,
    ) -> Self {
        self.chunk = chunk;
        self
    }

    pub(crate) fn without_length(mut self) -> Self {
        self.declare_length = false;
        self
    }

    /// Answer `Pending` to the first `polls` polls.
    pub(crate) fn delayed(
        mut self,
        polls: usize,
    ) -> Self {
        self.delay = polls;
        self
    }

    /// Like [`Reply::hang`] but with a body once released.
    pub(crate) fn held(mut self) -> Self {
        self.hang = true;
        self
    }
}

struct Exchange {
    reply: Reply,
    head_sent: bool,
    offset: usize,
}

/// Request as seen by the adapter.
#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) credential: String,
    pub(crate) body: Option<Vec<u8>>,
}

/// Scripted [`HttpClient`]. Replies are queued per channel; a request without a
/// scripted reply hangs.
#[derive(Default)]
pub(crate) struct FakeHttp {
    scripts: HashMap<Channel, VecDeque<Reply>>,
    active: HashMap<Channel, Exchange>,
    requests: HashMap<Channel, Vec<RecordedRequest>>,
    aborts: HashMap<Channel, usize>,
    polls: HashMap<Channel, usize>,
    refused: HashSet<Channel>,
}

impl FakeHttp {
    pub(crate) fn new() -> Self { Self::default() }

    /// Queue the reply for the next request on `channel`.
    pub(crate) fn script(
        &mut self,
        channel: Channel,
        reply: Reply,
    ) {
        self.scripts.entry(channel).or_default().push_back(reply);
    }

    /// Make every `start` on `channel` fail.
    pub(crate) fn refuse_start(
        &mut self,
        channel: Channel,
    ) {
        self.refused.insert(channel);
    }

    /// Let a hanging exchange on `channel` proceed.
    pub(crate) fn release(
        &mut self,
        channel: Channel,
    ) {
        if let Some(exchange) = self.active.get_mut(&channel) {
            exchange.reply.hang = false;
        }
    }

    /// Whether an exchange is open on `channel`.
    pub(crate) fn is_open(
        &self,
        channel: Channel,
    ) -> bool {
        self.active.contains_key(&channel)
    }

    pub(crate) fn requests(
        &self,
        channel: Channel,
    ) -> &[RecordedRequest] {
        self.requests.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn aborts(
        &self,
        channel: Channel,
    ) -> usize {
        self.aborts.get(&channel).copied().unwrap_or(0)
    }

    pub(crate) fn polls(
        &self,
        channel: Channel,
    ) -> usize {
        self.polls.get(&channel).copied().unwrap_or(0)
    }
}

impl HttpClient for FakeHttp {
    fn start(
        &mut self,
        channel: Channel,
        request: &Request<'_>,
    ) -> Result<(), HttpError> {
        if self.refused.contains(&channel) {
            return Err(HttpError::Transport);
        }
        self.requests.entry(channel).or_default().push(RecordedRequest {
            method: request.method,
            url: request.url.into(),
            credential: request.credential.into(),
            body: request.body.map(<[u8]>::to_vec),
        });
        let reply = self
            .scripts
            .get_mut(&channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(Reply::hang);
        self.active.insert(
            channel,
            Exchange {
                reply,
                head_sent: false,
                offset: 0,
            },
        );
        Ok(())
    }

    fn poll(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
    ) -> Result<Progress, HttpError> {
        *self.polls.entry(channel).or_default() += 1;
        let Some(exchange) = self.active.get_mut(&channel) else {
            return Err(HttpError::Transport);
        };
        if exchange.reply.hang {
            return Ok(Progress::Pending);
        }
        if exchange.reply.delay > 0 {
            exchange.reply.delay -= 1;
            return Ok(Progress::Pending);
        }

        let head = exchange.reply.head;
        let status = match head {
            Ok(status) => status,
            Err(err) => {
                self.active.remove(&channel);
                return Err(err);
            }
        };
        if !exchange.head_sent {
            exchange.head_sent = true;
            let len = exchange.reply.body.len();
            return Ok(Progress::Head {
                status,
                content_length: exchange.reply.declare_length.then_some(len),
            });
        }

        let remaining = exchange.reply.body.len() - exchange.offset;
        if remaining > 0 {
            let n = remaining.min(exchange.reply.chunk).min(buf.len());
            buf[..n].copy_from_slice(&exchange.reply.body[exchange.offset..exchange.offset + n]);
            exchange.offset += n;
            return Ok(Progress::Body(n));
        }

        self.active.remove(&channel);
        Ok(Progress::Done)
    }

    fn abort(
        &mut self,
        channel: Channel,
    ) {
        self.active.remove(&channel);
        *self.aborts.entry(channel).or_default() += 1;
    }
}

/// Minimal Home Assistant state body.
pub(crate) fn state_json(state: &str) -> String {
    std::format!(r#"{{"entity_id":"sensor.test","state":"{state}","last_updated":"2026-10-17T12:00:00+00:00"}}"#)
}

// =============================================================================
// Test Screen
// =============================================================================

/// In-memory RGB565 display that remembers which pixels were written.
pub(crate) struct TestScreen {
    size: Size,
    pixels: Vec<Rgb565>,
    touched: Vec<bool>,
}

impl TestScreen {
    pub(crate) fn new(size: Size) -> Self {
        let len = (size.width * size.height) as usize;
        Self {
            size,
            pixels: std::vec![Rgb565::BLACK; len],
            touched: std::vec![false; len],
        }
    }

    pub(crate) fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb565> {
        self.index(point).map(|i| self.pixels[i])
    }

    /// Forget which pixels were written.
    pub(crate) fn reset_touched(&mut self) { self.touched.fill(false); }

    /// Whether any pixel inside `area` was written since the last reset.
    pub(crate) fn touched_in(
        &self,
        area: &Rectangle,
    ) -> bool {
        area.points().any(|p| self.index(p).is_some_and(|i| self.touched[i]))
    }

    /// Whether any pixel was written since the last reset.
    pub(crate) fn touched_any(&self) -> bool { self.touched.iter().any(|t| *t) }

    /// Whether `area` contains a pixel of `color`.
    pub(crate) fn contains_color(
        &self,
        area: &Rectangle,
        color: Rgb565,
    ) -> bool {
        area.points().any(|p| self.pixel(p) == Some(color))
    }

    fn index(
        &self,
        point: Point,
    ) -> Option<usize> {
        let inside = point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.size.width
            && (point.y as u32) < self.size.height;
        inside.then(|| point.y as usize * self.size.width as usize + point.x as usize)
    }
}

impl OriginDimensions for TestScreen {
    fn size(&self) -> Size { self.size }
}

impl DrawTarget for TestScreen {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
                self.touched[i] = true;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Fake Decoder
// =============================================================================

/// Size of the frames produced by [`FakeDecoder`].
pub(crate) const FAKE_FRAME: Size = Size::new(8, 8);

/// Payload the fake decoder accepts: a frame filled with `color`, padded to `len` bytes.
pub(crate) fn fake_image(
    color: Rgb565,
    len: usize,
) -> Vec<u8> {
    let raw = color.into_storage().to_be_bytes();
    let mut data = std::vec![b'O', b'K', raw[0], raw[1]];
    data.resize(len.max(4), 0);
    data
}

/// Decoder for [`fake_image`] payloads; anything else is corrupt.
///
/// A corrupt payload scribbles over the workspace first, like a decoder that fails
/// halfway through an image.
#[derive(Default)]
pub(crate) struct FakeDecoder {
    pub(crate) decodes: usize,
}

impl FrameDecoder for FakeDecoder {
    fn workspace_len(
        &self,
        _max_size: Size,
    ) -> usize {
        (FAKE_FRAME.width * FAKE_FRAME.height * 2) as usize
    }

    fn decode(
        &mut self,
        data: &[u8],
        max_size: Size,
        workspace: &mut [u8],
    ) -> Result<Size, DecodeError> {
        self.decodes += 1;
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if data.len() < 4 || &data[..2] != b"OK" {
            workspace.fill(0xEE);
            return Err(DecodeError::Corrupt);
        }
        if FAKE_FRAME.width > max_size.width || FAKE_FRAME.height > max_size.height {
            return Err(DecodeError::TooLarge);
        }
        let bytes = self.workspace_len(max_size);
        let out = workspace.get_mut(..bytes).ok_or(DecodeError::Unsupported)?;
        for pixel in out.chunks_exact_mut(2) {
            pixel.copy_from_slice(&data[2..4]);
        }
        Ok(FAKE_FRAME)
    }
}
