//! Splash renderer: decoded bitmap to display surface.
//!
//! # Strategy
//!
//! | Path | Buffer | Transfers |
//! |------|--------|-----------|
//! | Full-frame (preferred) | `width * height` native pixels | 1 |
//! | Row-streaming (fallback) | one row, reused | 1 per row |
//!
//! The fallback is chosen automatically when the full-frame buffer cannot be
//! allocated. Both paths drive the same row conversion through a `RowSink`,
//! so bounds checks and the bottom-up/top-down mapping exist exactly once and
//! the two paths produce identical output.
//!
//! # Placement
//!
//! The image is centered; when it is larger than the surface on an axis the
//! origin clamps to 0 and the image is clipped on the right/bottom. Only the
//! visible rectangle is converted and transferred.
//!
//! The whole surface is filled with [`BACKGROUND`] first, then the declared
//! pixel extent is checked against the buffer length before any image pixel is
//! transferred, so a truncated file never leaves a partial image on screen.

use alloc::vec::Vec;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use thiserror::Error;

use crate::bmp::{self, DecodeError, DecodedImage, OutOfBounds};
use crate::colors::BACKGROUND;
use crate::error::ErrorKind;
use crate::surface::{SurfacePixel, TargetSurface};

// =============================================================================
// Buffer allocation
// =============================================================================

/// Source of pixel buffers for the renderer.
///
/// Returning `None` signals resource exhaustion and triggers the fallback path.
pub trait FrameAllocator {
    /// Allocate `len` pixels initialized to `fill`.
    fn try_alloc<P: Copy>(
        &mut self,
        len: usize,
        fill: P,
    ) -> Option<Vec<P>>;
}

/// Global-heap allocator that reports failure instead of aborting.
#[derive(Clone, Copy, Default, Debug)]
pub struct HeapAllocator;

impl FrameAllocator for HeapAllocator {
    fn try_alloc<P: Copy>(
        &mut self,
        len: usize,
        fill: P,
    ) -> Option<Vec<P>> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).ok()?;
        buffer.resize(len, fill);
        Some(buffer)
    }
}

// =============================================================================
// Results
// =============================================================================

/// Why a render did not complete.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderError {
    #[error("surface has no visible area")]
    InvalidParameter,

    #[error("splash image rejected: {0}")]
    Decode(#[from] DecodeError),

    #[error("splash image truncated: {0}")]
    Truncated(#[from] OutOfBounds),

    #[error("no memory for a {frame}-pixel frame or a {row}-pixel row")]
    OutOfResources { frame: usize, row: usize },

    #[error("surface transfer failed")]
    Device,
}

impl RenderError {
    /// Map onto the shared taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter => ErrorKind::InvalidParameter,
            Self::Decode(err) => err.kind(),
            Self::Truncated(_) => ErrorKind::Truncated,
            Self::OutOfResources { .. } => ErrorKind::OutOfResources,
            Self::Device => ErrorKind::DeviceError,
        }
    }
}

/// Which strategy produced the image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderPath {
    FullFrame,
    RowStreaming,
}

/// Summary of a completed render.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderReport {
    /// Top-left corner of the image on the surface.
    pub origin: Point,
    /// Part of the image that fits on the surface.
    pub visible: Size,
    /// Strategy used.
    pub path: RenderPath,
    /// Number of image transfers issued (background fill excluded).
    pub transfers: u32,
}

// =============================================================================
// Placement
// =============================================================================

/// Destination origin that centers `image` on `surface`, clamped to (0, 0).
pub fn centered_origin(
    surface: Size,
    image: Size,
) -> Point {
    let axis = |surface: u32, image: u32| ((i64::from(surface) - i64::from(image)) / 2).max(0) as i32;
    Point::new(axis(surface.width, image.width), axis(surface.height, image.height))
}

/// Portion of `image` that lands on `surface` when drawn at `origin`.
pub fn visible_size(
    surface: Size,
    origin: Point,
    image: Size,
) -> Size {
    Size::new(
        image.width.min(surface.width.saturating_sub(origin.x as u32)),
        image.height.min(surface.height.saturating_sub(origin.y as u32)),
    )
}

// =============================================================================
// Row conversion (shared by both paths)
// =============================================================================

/// Destination for converted rows.
trait RowSink<P> {
    /// Buffer to convert display row `y` into.
    fn row_mut(
        &mut self,
        y: u32,
    ) -> &mut [P];

    /// Row `y` is complete.
    fn emit(
        &mut self,
        y: u32,
    ) -> Result<(), RenderError>;
}

/// Convert display row `y` into native pixels. Every fetch is bounds-checked.
fn convert_row<P: SurfacePixel>(
    image: &DecodedImage<'_>,
    y: u32,
    out: &mut [P],
) -> Result<(), OutOfBounds> {
    for (x, pixel) in out.iter_mut().enumerate() {
        *pixel = P::from_rgb(image.pixel(x as u32, y)?);
    }
    Ok(())
}

fn draw_rows<P: SurfacePixel>(
    image: &DecodedImage<'_>,
    visible: Size,
    sink: &mut impl RowSink<P>,
) -> Result<(), RenderError> {
    for y in 0..visible.height {
        convert_row(image, y, sink.row_mut(y))?;
        sink.emit(y)?;
    }
    Ok(())
}

/// Whole visible image in one buffer, transferred once at the end.
struct FullFrame<P> {
    buffer: Vec<P>,
    width: usize,
}

impl<P> RowSink<P> for FullFrame<P> {
    fn row_mut(
        &mut self,
        y: u32,
    ) -> &mut [P] {
        let start = y as usize * self.width;
        &mut self.buffer[start..start + self.width]
    }

    fn emit(
        &mut self,
        _y: u32,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Single reusable row, transferred as soon as it is converted.
struct RowStream<'s, S: TargetSurface> {
    surface: &'s mut S,
    row: Vec<S::Pixel>,
    origin: Point,
    transfers: u32,
}

impl<S: TargetSurface> RowSink<S::Pixel> for RowStream<'_, S> {
    fn row_mut(
        &mut self,
        _y: u32,
    ) -> &mut [S::Pixel] {
        &mut self.row
    }

    fn emit(
        &mut self,
        y: u32,
    ) -> Result<(), RenderError> {
        let dest = self.origin + Point::new(0, y as i32);
        self.surface.blit_row(&self.row, dest).map_err(device_error)?;
        self.transfers += 1;
        Ok(())
    }
}

fn device_error<E: core::fmt::Debug>(err: E) -> RenderError {
    log::warn!("surface transfer failed: {:?}", err);
    RenderError::Device
}

// =============================================================================
// Entry points
// =============================================================================

/// Draw `image` centered on `surface` over a black background.
pub fn render<S, A>(
    surface: &mut S,
    image: &DecodedImage<'_>,
    alloc: &mut A,
) -> Result<RenderReport, RenderError>
where
    S: TargetSurface,
    A: FrameAllocator,
{
    let screen = surface.resolution();
    if screen.width == 0 || screen.height == 0 {
        return Err(RenderError::InvalidParameter);
    }

    let origin = centered_origin(screen, image.size());
    let visible = visible_size(screen, origin, image.size());

    surface
        .fill_rect(BACKGROUND, Rectangle::new(Point::zero(), screen))
        .map_err(device_error)?;
    image.check_extent()?;

    let width = visible.width as usize;
    let frame_len = width * visible.height as usize;
    let fill = S::Pixel::from_rgb(BACKGROUND);

    if let Some(buffer) = alloc.try_alloc(frame_len, fill) {
        let mut frame = FullFrame { buffer, width };
        draw_rows(image, visible, &mut frame)?;
        surface
            .blit_buffer(&frame.buffer, width, Rectangle::new(Point::zero(), visible), origin)
            .map_err(device_error)?;

        log::debug!("splash drawn full-frame at ({}, {})", origin.x, origin.y);
        return Ok(RenderReport {
            origin,
            visible,
            path: RenderPath::FullFrame,
            transfers: 1,
        });
    }

    log::warn!(
        "no memory for {}x{} frame buffer, streaming rows",
        visible.width,
        visible.height
    );
    let row = alloc.try_alloc(width, fill).ok_or(RenderError::OutOfResources {
        frame: frame_len,
        row: width,
    })?;
    let mut stream = RowStream {
        surface,
        row,
        origin,
        transfers: 0,
    };
    draw_rows(image, visible, &mut stream)?;

    Ok(RenderReport {
        origin,
        visible,
        path: RenderPath::RowStreaming,
        transfers: stream.transfers,
    })
}

/// Decode `bytes` and render the result.
pub fn render_bitmap<S, A>(
    surface: &mut S,
    bytes: &[u8],
    alloc: &mut A,
) -> Result<RenderReport, RenderError>
where
    S: TargetSurface,
    A: FrameAllocator,
{
    let image = bmp::decode(bytes)?;
    render(surface, &image, alloc)
}

// =============================================================================
// Tests
// =============================================================================
