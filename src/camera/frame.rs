//! Decoded camera frames and the decoders that produce them.
//!
//! A decoder writes RGB565 big-endian pixels, the panel's native byte order, into a
//! workspace owned by the pipeline. [`Frame::store_visible`] then copies the part of
//! the image its viewport can show into the slot's own buffer. Both buffers are sized
//! once, so a fetch never allocates, and a [`Frame`] blits with `ImageRawBE` without
//! per-pixel conversion.

use alloc::boxed::Box;
use alloc::vec;

use embedded_graphics::image::{Image, ImageRawBE};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::DecodeError;

/// Bytes per RGB565 pixel.
const PIXEL_BYTES: usize = 2;

#[inline]
const fn area_bytes(size: Size) -> usize { size.width as usize * size.height as usize * PIXEL_BYTES }

/// The visible part of a decoded image, in a buffer reserved for one viewport.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame {
    /// Screen area covered by the stored pixels.
    area: Rectangle,
    pixels: Box<[u8]>,
}

impl Frame {
    /// Empty frame with room for every pixel of `viewport`.
    pub fn for_viewport(viewport: &Rectangle) -> Self {
        Self {
            area: Rectangle::zero(),
            pixels: vec![0; area_bytes(viewport.size)].into_boxed_slice(),
        }
    }

    #[inline]
    pub const fn area(&self) -> Rectangle { self.area }

    /// Stored pixels, row by row across [`Frame::area`].
    #[inline]
    pub fn pixels(&self) -> &[u8] { &self.pixels[..area_bytes(self.area.size)] }

    /// Bytes reserved for this frame.
    #[inline]
    pub fn capacity(&self) -> usize { self.pixels.len() }

    /// Replace the contents with the part of `image` that falls inside `viewport` when
    /// the image is drawn at `origin`.
    ///
    /// `image` holds `size` RGB565 big-endian pixels. Nothing is written on error.
    pub fn store_visible(
        &mut self,
        image: &[u8],
        size: Size,
        origin: Point,
        viewport: &Rectangle,
    ) -> Result<(), DecodeError> {
        let stride = size.width as usize * PIXEL_BYTES;
        if image.len() < area_bytes(size) {
            return Err(DecodeError::Corrupt);
        }
        let area = Rectangle::new(origin, size).intersection(viewport);
        if area_bytes(area.size) > self.pixels.len() {
            return Err(DecodeError::TooLarge);
        }

        let row_bytes = area.size.width as usize * PIXEL_BYTES;
        if row_bytes > 0 {
            let skip = area.top_left - origin;
            let (x, y) = (skip.x as usize * PIXEL_BYTES, skip.y as usize);
            let rows = self.pixels.chunks_exact_mut(row_bytes).take(area.size.height as usize);
            for (row, out) in rows.enumerate() {
                let start = (y + row) * stride + x;
                out.copy_from_slice(&image[start..start + row_bytes]);
            }
        }
        self.area = area;
        Ok(())
    }

    /// Draw at the stored position, clipped to `viewport`.
    pub fn draw_clipped<D>(
        &self,
        display: &mut D,
        viewport: &Rectangle,
    ) where
        D: DrawTarget<Color = Rgb565>,
    {
        if self.area.size.width == 0 || self.area.size.height == 0 {
            return;
        }
        let raw = ImageRawBE::<Rgb565>::new(self.pixels(), self.area.size.width);
        Image::new(&raw, self.area.top_left).draw(&mut display.clipped(viewport)).ok();
    }
}

/// Turns a compressed payload into RGB565 pixels.
pub trait FrameDecoder {
    /// Workspace bytes [`FrameDecoder::decode`] needs for images up to `max_size`.
    fn workspace_len(
        &self,
        max_size: Size,
    ) -> usize;

    /// Decode `data` into the start of `workspace` as RGB565 big-endian rows and
    /// return the image size. Images larger than `max_size` in either dimension are
    /// rejected. The workspace contents are unspecified after an error.
    fn decode(
        &mut self,
        data: &[u8],
        max_size: Size,
        workspace: &mut [u8],
    ) -> Result<Size, DecodeError>;
}

/// Pack 8-bit RGB into big-endian RGB565.
#[inline]
pub const fn rgb565_be(
    r: u8,
    g: u8,
    b: u8,
) -> [u8; 2] {
    let value = ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3);
    value.to_be_bytes()
}

/// Convert the first `len` bytes of `buf`, interleaved 8-bit pixels with `channels`
/// components (1 = gray, 3+ = RGB first), to RGB565 big-endian in place.
///
/// Returns the packed length.
pub fn pack_rgb565(
    buf: &mut [u8],
    len: usize,
    channels: usize,
) -> Result<usize, DecodeError> {
    if channels == 0 || channels == 2 || len > buf.len() || len % channels != 0 {
        return Err(DecodeError::Unsupported);
    }
    let count = len / channels;
    if channels == 1 {
        if count * PIXEL_BYTES > buf.len() {
            return Err(DecodeError::TooLarge);
        }
        // Output is wider than input: fill back to front
        for i in (0..count).rev() {
            let y = buf[i];
            let [hi, lo] = rgb565_be(y, y, y);
            buf[2 * i] = hi;
            buf[2 * i + 1] = lo;
        }
    } else {
        // Output index 2i+1 never passes input index channels*i, so front to back is safe
        for i in 0..count {
            let src = i * channels;
            let [hi, lo] = rgb565_be(buf[src], buf[src + 1], buf[src + 2]);
            buf[2 * i] = hi;
            buf[2 * i + 1] = lo;
        }
    }
    Ok(count * PIXEL_BYTES)
}

// =============================================================================
// JPEG
// =============================================================================

/// Components per pixel `zune-jpeg` writes for color images.
#[cfg(feature = "jpeg")]
const RGB_CHANNELS: usize = 3;

/// Baseline/progressive JPEG decoder backed by `zune-jpeg`.
///
/// Decodes to RGB888 in the workspace with `decode_into`, then packs in place.
#[cfg(feature = "jpeg")]
#[derive(Default)]
pub struct JpegDecoder;

#[cfg(feature = "jpeg")]
impl FrameDecoder for JpegDecoder {
    fn workspace_len(
        &self,
        max_size: Size,
    ) -> usize {
        max_size.width as usize * max_size.height as usize * RGB_CHANNELS
    }

    fn decode(
        &mut self,
        data: &[u8],
        max_size: Size,
        workspace: &mut [u8],
    ) -> Result<Size, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut decoder = zune_jpeg::JpegDecoder::new(data);
        decoder.decode_headers().map_err(|_| DecodeError::Corrupt)?;
        let (width, height) = decoder.dimensions().ok_or(DecodeError::Corrupt)?;
        if width == 0 || height == 0 {
            return Err(DecodeError::Empty);
        }
        if width > max_size.width as usize || height > max_size.height as usize {
            return Err(DecodeError::TooLarge);
        }

        let needed = decoder.output_buffer_size().ok_or(DecodeError::Corrupt)?;
        let out = workspace.get_mut(..needed).ok_or(DecodeError::Unsupported)?;
        decoder.decode_into(out).map_err(|_| DecodeError::Corrupt)?;
        pack_rgb565(workspace, needed, needed / (width * height))?;
        Ok(Size::new(width as u32, height as u32))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestScreen;

    /// 4x4 image whose rows are red, green, blue, white.
    fn striped() -> std::vec::Vec<u8> {
        [rgb565_be(255, 0, 0), rgb565_be(0, 255, 0), rgb565_be(0, 0, 255), rgb565_be(255, 255, 255)]
            .iter()
            .flat_map(|pixel| pixel.repeat(4))
            .collect()
    }

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(rgb565_be(255, 255, 255), [0xFF, 0xFF]);
        assert_eq!(rgb565_be(255, 0, 0), [0xF8, 0x00]);
        assert_eq!(rgb565_be(0, 255, 0), [0x07, 0xE0]);
        assert_eq!(rgb565_be(0, 0, 255), [0x00, 0x1F]);
    }

    #[test]
    fn test_pack_rgb_in_place() {
        let mut buf = [255, 0, 0, 0, 255, 0, 0, 0, 255];
        assert_eq!(pack_rgb565(&mut buf, 9, 3), Ok(6));
        assert_eq!(buf[..6], [0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F]);
    }

    #[test]
    fn test_pack_gray_expands() {
        let mut buf = [0, 255, 0, 0];
        assert_eq!(pack_rgb565(&mut buf, 2, 1), Ok(4));
        assert_eq!(buf, [0x00, 0x00, 0xFF, 0xFF]);

        let mut short = [0, 255, 0];
        assert_eq!(pack_rgb565(&mut short, 2, 1), Err(DecodeError::TooLarge));
    }

    #[test]
    fn test_pack_rejects_bad_layout() {
        assert_eq!(pack_rgb565(&mut [1, 2, 3, 4], 4, 3), Err(DecodeError::Unsupported));
        assert_eq!(pack_rgb565(&mut [1, 2], 2, 2), Err(DecodeError::Unsupported));
        assert_eq!(pack_rgb565(&mut [1, 2, 3], 6, 3), Err(DecodeError::Unsupported));
    }

    #[test]
    fn test_frame_reserves_viewport() {
        let frame = Frame::for_viewport(&Rectangle::new(Point::new(0, 40), Size::new(320, 175)));
        assert_eq!(frame.capacity(), 112_000);
        assert!(frame.pixels().is_empty());
    }

    #[test]
    fn test_store_keeps_visible_rows() {
        let viewport = Rectangle::new(Point::new(0, 0), Size::new(4, 2));
        let mut frame = Frame::for_viewport(&viewport);

        // Drawn two rows above the viewport, so only the blue and white rows show
        frame.store_visible(&striped(), Size::new(4, 4), Point::new(0, -2), &viewport).unwrap();

        assert_eq!(frame.area(), viewport);
        assert_eq!(frame.pixels()[..8], rgb565_be(0, 0, 255).repeat(4)[..]);
        assert_eq!(frame.pixels()[8..], rgb565_be(255, 255, 255).repeat(4)[..]);
    }

    #[test]
    fn test_store_keeps_visible_columns() {
        let viewport = Rectangle::new(Point::new(2, 0), Size::new(4, 4));
        let mut frame = Frame::for_viewport(&viewport);

        frame.store_visible(&striped(), Size::new(4, 4), Point::zero(), &viewport).unwrap();

        assert_eq!(frame.area(), Rectangle::new(Point::new(2, 0), Size::new(2, 4)));
        assert_eq!(frame.pixels().len(), 16);
        assert_eq!(frame.pixels()[..4], rgb565_be(255, 0, 0).repeat(2)[..]);
    }

    #[test]
    fn test_store_outside_viewport_is_empty() {
        let viewport = Rectangle::new(Point::new(0, 10), Size::new(4, 4));
        let mut frame = Frame::for_viewport(&viewport);
        frame.store_visible(&striped(), Size::new(4, 4), Point::zero(), &viewport).unwrap();

        assert!(frame.pixels().is_empty());
        let mut screen = TestScreen::new(Size::new(8, 16));
        frame.draw_clipped(&mut screen, &viewport);
        assert!(!screen.touched_any());
    }

    #[test]
    fn test_failed_store_keeps_contents() {
        let viewport = Rectangle::new(Point::zero(), Size::new(4, 4));
        let mut frame = Frame::for_viewport(&viewport);
        frame.store_visible(&striped(), Size::new(4, 4), Point::zero(), &viewport).unwrap();
        let before = frame.clone();

        let short = striped()[..20].to_vec();
        assert_eq!(
            frame.store_visible(&short, Size::new(4, 4), Point::zero(), &viewport),
            Err(DecodeError::Corrupt)
        );
        assert_eq!(frame, before);

        // A viewport larger than the reserved one cannot fit
        let wide = Rectangle::new(Point::zero(), Size::new(8, 8));
        let big = [0u8; 128];
        assert_eq!(frame.store_visible(&big, Size::new(8, 8), Point::zero(), &wide), Err(DecodeError::TooLarge));
        assert_eq!(frame, before);
    }

    #[test]
    fn test_draw_clipped_to_viewport() {
        let red = rgb565_be(255, 0, 0);
        let stored = Rectangle::new(Point::zero(), Size::new(4, 4));
        let mut frame = Frame::for_viewport(&stored);
        frame.store_visible(&red.repeat(16), Size::new(4, 4), Point::zero(), &stored).unwrap();
        let mut screen = TestScreen::new(Size::new(8, 8));
        let viewport = Rectangle::new(Point::new(0, 2), Size::new(8, 2));

        // Stored from y=0 but only rows 2..4 may change
        frame.draw_clipped(&mut screen, &viewport);

        assert_eq!(screen.pixel(Point::new(0, 2)), Some(Rgb565::RED));
        assert_eq!(screen.pixel(Point::new(3, 3)), Some(Rgb565::RED));
        assert_eq!(screen.pixel(Point::new(0, 1)), Some(Rgb565::BLACK));
        assert_eq!(screen.pixel(Point::new(0, 4)), Some(Rgb565::BLACK));
        assert!(!screen.touched_in(&Rectangle::new(Point::new(0, 0), Size::new(8, 2))));
    }

    #[cfg(feature = "jpeg")]
    mod jpeg {
        use embedded_graphics::pixelcolor::raw::RawU16;

        use super::*;

        /// Baseline 4:4:4 JPEG, 16x8: left half red, right half blue.
        const RED_BLUE: &[u8] = include_bytes!("testdata/red_blue.jpg");

        const MAX: Size = Size::new(320, 240);

        fn workspace() -> std::vec::Vec<u8> { std::vec![0u8; JpegDecoder.workspace_len(MAX)] }

        /// Compare channels allowing one step of rounding.
        fn assert_close(
            pixel: &[u8],
            expected: Rgb565,
        ) {
            let actual = Rgb565::from(RawU16::new(u16::from_be_bytes([pixel[0], pixel[1]])));
            assert!(
                actual.r().abs_diff(expected.r()) <= 1
                    && actual.g().abs_diff(expected.g()) <= 1
                    && actual.b().abs_diff(expected.b()) <= 1,
                "{actual:?} is not close to {expected:?}"
            );
        }

        #[test]
        fn test_jpeg_rejects_garbage() {
            let mut decoder = JpegDecoder;
            let mut ws = workspace();
            assert_eq!(decoder.decode(b"", MAX, &mut ws), Err(DecodeError::Empty));
            assert_eq!(decoder.decode(b"\xFF\xD8not a jpeg at all", MAX, &mut ws), Err(DecodeError::Corrupt));
            assert_eq!(decoder.decode(b"<html>error</html>", MAX, &mut ws), Err(DecodeError::Corrupt));
        }

        #[test]
        fn test_jpeg_workspace_fits_rgb888() {
            assert_eq!(JpegDecoder.workspace_len(MAX), 230_400);
        }

        #[test]
        fn test_jpeg_decodes_to_rgb565() {
            let mut ws = workspace();
            let size = JpegDecoder.decode(RED_BLUE, MAX, &mut ws).unwrap();

            assert_eq!(size, Size::new(16, 8));
            let pixel = |x: usize, y: usize| &ws[(y * 16 + x) * 2..][..2];
            for y in [0, 3, 7] {
                for x in [0, 7] {
                    assert_close(pixel(x, y), Rgb565::RED);
                }
                for x in [8, 15] {
                    assert_close(pixel(x, y), Rgb565::BLUE);
                }
            }
        }

        #[test]
        fn test_jpeg_header_larger_than_max() {
            let mut ws = workspace();
            assert_eq!(JpegDecoder.decode(RED_BLUE, Size::new(8, 8), &mut ws), Err(DecodeError::TooLarge));
            assert_eq!(JpegDecoder.decode(RED_BLUE, Size::new(16, 4), &mut ws), Err(DecodeError::TooLarge));
            assert!(ws.iter().all(|&b| b == 0), "Rejected before touching the workspace");
        }

        #[test]
        fn test_jpeg_short_workspace_rejected() {
            let mut ws = std::vec![0u8; 16 * 8 * 3 - 1];
            assert_eq!(JpegDecoder.decode(RED_BLUE, MAX, &mut ws), Err(DecodeError::Unsupported));
        }
    }
}
