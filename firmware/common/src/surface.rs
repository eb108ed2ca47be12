//! Display surface abstraction.
//!
//! The renderer talks to the boot-time display only through [`TargetSurface`]:
//! a solid fill, a bulk blit from a pixel buffer, and a single-row blit. Each
//! surface declares its native pixel type, so the renderer can build buffers
//! that the device copies without further conversion.
//!
//! - The UEFI Graphics Output Protocol uses [`BgrxPixel`] (same layout as the
//!   firmware's blit pixel).
//! - Any `embedded-graphics` [`DrawTarget`] becomes a surface through
//!   [`DrawTargetSurface`] (used by the simulator and tests).

use core::fmt::Debug;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

// =============================================================================
// Native pixel formats
// =============================================================================

/// A pixel type a surface stores natively.
pub trait SurfacePixel: Copy {
    /// Name shown in boot info.
    const FORMAT: &'static str;

    /// Convert from the decoder's RGB representation.
    fn from_rgb(color: Rgb888) -> Self;
}

impl SurfacePixel for Rgb888 {
    const FORMAT: &'static str = "RGB 8:8:8";

    #[inline]
    fn from_rgb(color: Rgb888) -> Self { color }
}

/// 32-bit blue/green/red/reserved pixel.
///
/// Layout-compatible with `EFI_GRAPHICS_OUTPUT_BLT_PIXEL`, so a slice of these
/// can be handed to the firmware blit routine as-is.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BgrxPixel {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

impl SurfacePixel for BgrxPixel {
    const FORMAT: &'static str = "BGR 8:8:8:8";

    #[inline]
    fn from_rgb(color: Rgb888) -> Self {
        Self {
            blue: color.b(),
            green: color.g(),
            red: color.r(),
            reserved: 0,
        }
    }
}

// =============================================================================
// Surface trait
// =============================================================================

/// The boot-time output device.
///
/// Implementations may assume exclusive access for the duration of a render
/// call. Each `blit_*` call is one surface transfer.
pub trait TargetSurface {
    /// Native pixel format of the device.
    type Pixel: SurfacePixel;
    /// Device-level failure.
    type Error: Debug;

    /// Visible resolution in pixels.
    fn resolution(&self) -> Size;

    /// Pixel layout of the current mode.
    fn pixel_format(&self) -> &'static str { <Self::Pixel as SurfacePixel>::FORMAT }

    /// Current mode number and the number of modes, when the device has modes.
    fn mode(&self) -> Option<(u32, u32)> { None }

    /// Fill `area` with a solid color.
    fn fill_rect(
        &mut self,
        color: Rgb888,
        area: Rectangle,
    ) -> Result<(), Self::Error>;

    /// Copy the `src` sub-rectangle of `pixels` (rows `stride` pixels apart)
    /// to the surface with its top-left corner at `dest`.
    fn blit_buffer(
        &mut self,
        pixels: &[Self::Pixel],
        stride: usize,
        src: Rectangle,
        dest: Point,
    ) -> Result<(), Self::Error>;

    /// Copy one row of pixels to the surface starting at `dest`.
    fn blit_row(
        &mut self,
        pixels: &[Self::Pixel],
        dest: Point,
    ) -> Result<(), Self::Error>;
}

// =============================================================================
// embedded-graphics adapter
// =============================================================================

/// Adapts any [`DrawTarget`] with a supported color type into a [`TargetSurface`].
pub struct DrawTargetSurface<D> {
    target: D,
}

impl<D> DrawTargetSurface<D> {
    /// Wrap a draw target.
    pub const fn new(target: D) -> Self { Self { target } }

    /// Borrow the wrapped target.
    #[inline]
    pub const fn inner(&self) -> &D { &self.target }

    /// Borrow the wrapped target mutably (e.g. to draw overlays).
    #[inline]
    pub fn inner_mut(&mut self) -> &mut D { &mut self.target }
}

impl<D> TargetSurface for DrawTargetSurface<D>
where
    D: DrawTarget,
    D::Color: SurfacePixel,
    D::Error: Debug,
{
    type Error = D::Error;
    type Pixel = D::Color;

    fn resolution(&self) -> Size { self.target.bounding_box().size }

    fn fill_rect(
        &mut self,
        color: Rgb888,
        area: Rectangle,
    ) -> Result<(), Self::Error> {
        self.target.fill_solid(&area, D::Color::from_rgb(color))
    }

    fn blit_buffer(
        &mut self,
        pixels: &[Self::Pixel],
        stride: usize,
        src: Rectangle,
        dest: Point,
    ) -> Result<(), Self::Error> {
        let x0 = src.top_left.x.max(0) as usize;
        let y0 = src.top_left.y.max(0) as usize;
        let width = src.size.width as usize;
        let height = src.size.height as usize;
        let row = move |n: usize| {
            let start = (y0 + n) * stride + x0;
            pixels.get(start..start + width)
        };

        // Whole rows only: a short buffer stops at its last complete row
        let rows = (0..height).take_while(|&n| row(n).is_some()).count();
        if rows < height {
            log::warn!("blit source holds {} of {} rows (stride {}, {} pixels)", rows, height, stride, pixels.len());
        }

        let colors = (0..rows).flat_map(move |n| row(n).unwrap_or_default().iter().copied());
        self.target.fill_contiguous(&Rectangle::new(dest, Size::new(src.size.width, rows as u32)), colors)
    }

    fn blit_row(
        &mut self,
        pixels: &[Self::Pixel],
        dest: Point,
    ) -> Result<(), Self::Error> {
        let area = Rectangle::new(dest, Size::new(pixels.len() as u32, 1));
        self.target.fill_contiguous(&area, pixels.iter().copied())
    }
}

// =============================================================================
// Tests
// =============================================================================
