//! Graphics Output Protocol surface.
//!
//! The protocol is opened non-exclusively: an exclusive open would disconnect
//! the text console that shares the same GOP, and status messages must stay
//! visible.

use bootsplash_common::surface::{BgrxPixel, TargetSurface};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use uefi::boot::{self, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::proto::console::gop::{BltOp, BltPixel, BltRegion, GraphicsOutput, PixelFormat};

/// The firmware framebuffer, driven through blit operations.
pub struct GopSurface {
    gop: ScopedProtocol<GraphicsOutput>,
}

impl GopSurface {
    /// Open the first handle that supports GOP.
    pub fn open() -> uefi::Result<Self> {
        let handle = boot::get_handle_for_protocol::<GraphicsOutput>()?;
        // SAFETY: the console driver keeps using this GOP for text output, which
        // never overlaps a blit because the application is single-threaded.
        let gop = unsafe {
            boot::open_protocol::<GraphicsOutput>(
                OpenProtocolParams {
                    handle,
                    agent: boot::image_handle(),
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )?
        };
        Ok(Self { gop })
    }
}

#[inline]
fn coords(point: Point) -> (usize, usize) { (point.x.max(0) as usize, point.y.max(0) as usize) }

#[inline]
fn dims(size: Size) -> (usize, usize) { (size.width as usize, size.height as usize) }

/// Reinterpret native pixels as firmware blit pixels.
fn as_blt(pixels: &[BgrxPixel]) -> &[BltPixel] {
    // SAFETY: `BgrxPixel` is `repr(C)` with the same four `u8` fields in the
    // same order as `BltPixel`, so size, alignment and layout match.
    unsafe { core::slice::from_raw_parts(pixels.as_ptr().cast::<BltPixel>(), pixels.len()) }
}

impl TargetSurface for GopSurface {
    type Error = uefi::Error;
    type Pixel = BgrxPixel;

    fn resolution(&self) -> Size {
        let (width, height) = self.gop.current_mode_info().resolution();
        Size::new(width as u32, height as u32)
    }

    fn pixel_format(&self) -> &'static str {
        match self.gop.current_mode_info().pixel_format() {
            PixelFormat::Rgb => "RGB 8:8:8:8",
            PixelFormat::Bgr => "BGR 8:8:8:8",
            PixelFormat::Bitmask => "Bitmask",
            PixelFormat::BltOnly => "Blt only",
        }
    }

    /// The protocol does not expose the current mode number, so it is found by
    /// matching the current mode's geometry against the mode list.
    fn mode(&self) -> Option<(u32, u32)> {
        let current = self.gop.current_mode_info();
        let mut index = None;
        let mut count = 0u32;
        for mode in self.gop.modes() {
            let info = mode.info();
            let matches = info.resolution() == current.resolution()
                && info.pixel_format() == current.pixel_format()
                && info.stride() == current.stride();
            if index.is_none() && matches {
                index = Some(count);
            }
            count += 1;
        }
        index.map(|index| (index, count))
    }

    fn fill_rect(
        &mut self,
        color: Rgb888,
        area: Rectangle,
    ) -> Result<(), Self::Error> {
        self.gop.blt(BltOp::VideoFill {
            color: BltPixel::new(color.r(), color.g(), color.b()),
            dest: coords(area.top_left),
            dims: dims(area.size),
        })
    }

    fn blit_buffer(
        &mut self,
        pixels: &[BgrxPixel],
        stride: usize,
        src: Rectangle,
        dest: Point,
    ) -> Result<(), Self::Error> {
        self.gop.blt(BltOp::BufferToVideo {
            buffer: as_blt(pixels),
            src: BltRegion::SubRectangle {
                coords: coords(src.top_left),
                px_stride: stride,
            },
            dest: coords(dest),
            dims: dims(src.size),
        })
    }

    fn blit_row(
        &mut self,
        pixels: &[BgrxPixel],
        dest: Point,
    ) -> Result<(), Self::Error> {
        self.gop.blt(BltOp::BufferToVideo {
            buffer: as_blt(pixels),
            src: BltRegion::Full,
            dest: coords(dest),
            dims: (pixels.len(), 1),
        })
    }
}
