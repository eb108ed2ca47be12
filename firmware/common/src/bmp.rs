//! Zero-copy decoder for 24-bit uncompressed bitmaps.
//!
//! The decoder only validates the two fixed headers and records where the scan
//! rows start. Pixel bytes are never copied: [`DecodedImage`] borrows the raw
//! buffer and every fetch goes through the bounds-checked [`PixelData`] view,
//! because width, height and the pixel offset all come from the (untrusted)
//! header.
//!
//! # Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 2 | Signature `"BM"` |
//! | 2 | 4 | File size (informational) |
//! | 10 | 4 | Pixel data offset |
//! | 14 | 4 | Info header size |
//! | 18 | 4 | Width (signed) |
//! | 22 | 4 | Height (signed, negative = top-down) |
//! | 26 | 2 | Planes |
//! | 28 | 2 | Bits per pixel |
//! | 30 | 4 | Compression |
//!
//! All fields are little-endian. Scan rows are padded to 4 bytes and each
//! pixel is stored as (blue, green, red).

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb888;
use thiserror::Error;

use crate::error::ErrorKind;

/// Size of the fixed file header.
pub const FILE_HEADER_LEN: usize = 14;

/// Size of the fixed info header.
pub const INFO_HEADER_LEN: usize = 40;

/// Minimum buffer length that can hold both headers.
pub const HEADER_LEN: usize = FILE_HEADER_LEN + INFO_HEADER_LEN;

/// `"BM"` read as a little-endian u16.
pub const SIGNATURE: u16 = 0x4D42;

/// The only supported bit depth.
pub const SUPPORTED_BIT_DEPTH: u16 = 24;

/// Compression code for uncompressed (`BI_RGB`) data.
pub const COMPRESSION_NONE: u32 = 0;

/// Sanity bound on either dimension.
pub const MAX_DIMENSION: u32 = 8192;

/// Bytes per stored pixel at 24 bits per pixel.
pub const BYTES_PER_PIXEL: usize = 3;

// Header field offsets
const SIGNATURE_AT: usize = 0;
const PIXEL_OFFSET_AT: usize = 10;
const WIDTH_AT: usize = 18;
const HEIGHT_AT: usize = 22;
const BIT_COUNT_AT: usize = 28;
const COMPRESSION_AT: usize = 30;

// =============================================================================
// Errors
// =============================================================================

/// Reasons a buffer is rejected as a splash image.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecodeError {
    #[error("buffer holds {len} bytes, bitmap headers need 54")]
    TooShort { len: usize },

    #[error("bad bitmap signature 0x{0:04x}")]
    BadSignature(u16),

    #[error("{0} bits per pixel is not supported")]
    UnsupportedBitDepth(u16),

    #[error("compression type {0} is not supported")]
    UnsupportedCompression(u32),

    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
}

impl DecodeError {
    /// Map onto the shared taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TooShort { .. } | Self::InvalidDimensions { .. } => ErrorKind::Truncated,
            Self::BadSignature(_) | Self::UnsupportedBitDepth(_) | Self::UnsupportedCompression(_) => {
                ErrorKind::Unsupported
            }
        }
    }
}

/// A pixel fetch that would read past the end of the buffer.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
#[error("pixel at byte {offset} lies outside the {len}-byte buffer")]
pub struct OutOfBounds {
    /// Byte offset of the rejected pixel (saturated on overflow).
    pub offset: usize,
    /// Actual buffer length.
    pub len: usize,
}

// =============================================================================
// Bounds-checked buffer view
// =============================================================================

/// Read-only view over the raw file bytes where every access is checked.
#[derive(Clone, Copy, Debug)]
pub struct PixelData<'a> {
    bytes: &'a [u8],
}

impl<'a> PixelData<'a> {
    /// Wrap a raw buffer.
    pub const fn new(bytes: &'a [u8]) -> Self { Self { bytes } }

    /// Length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize { self.bytes.len() }

    /// Whether the underlying buffer is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool { self.bytes.is_empty() }

    /// Fetch the (blue, green, red) triple starting at `offset`.
    ///
    /// Succeeds only when `offset + 2 < len`.
    #[inline]
    pub fn bgr(
        &self,
        offset: usize,
    ) -> Result<[u8; 3], OutOfBounds> {
        let end = offset.checked_add(BYTES_PER_PIXEL);
        match end.and_then(|end| self.bytes.get(offset..end)) {
            Some(&[b, g, r]) => Ok([b, g, r]),
            _ => Err(OutOfBounds {
                offset,
                len: self.bytes.len(),
            }),
        }
    }
}

// =============================================================================
// Decoded image
// =============================================================================

/// Storage order of scan rows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Orientation {
    /// First stored row is the top of the picture (negative height).
    TopDown,
    /// First stored row is the bottom of the picture (the common case).
    BottomUp,
}

/// Validated header metadata plus a borrowed view of the pixel bytes.
#[derive(Clone, Copy, Debug)]
pub struct DecodedImage<'a> {
    data: PixelData<'a>,
    width: u32,
    height: u32,
    orientation: Orientation,
    row_stride: usize,
    pixel_data_offset: usize,
}

impl<'a> DecodedImage<'a> {
    /// Image width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 { self.width }

    /// Effective (absolute) image height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 { self.height }

    /// Image dimensions.
    #[inline]
    pub const fn size(&self) -> Size { Size::new(self.width, self.height) }

    /// Row storage order.
    #[inline]
    pub const fn orientation(&self) -> Orientation { self.orientation }

    /// Bytes per stored scan row, including padding.
    #[inline]
    pub const fn row_stride(&self) -> usize { self.row_stride }

    /// Byte offset of the first stored scan row.
    #[inline]
    pub const fn pixel_data_offset(&self) -> usize { self.pixel_data_offset }

    /// The bounds-checked view over the raw buffer.
    #[inline]
    pub const fn data(&self) -> PixelData<'a> { self.data }

    /// Stored row index that appears at display row `dest_y`.
    #[inline]
    pub const fn source_row(
        &self,
        dest_y: u32,
    ) -> u32 {
        match self.orientation {
            Orientation::TopDown => dest_y,
            Orientation::BottomUp => self.height - 1 - dest_y,
        }
    }

    /// Byte offset of the pixel shown at (`x`, `dest_y`), if it fits in `usize`.
    pub fn pixel_offset(
        &self,
        x: u32,
        dest_y: u32,
    ) -> Option<usize> {
        let row = (self.source_row(dest_y) as usize).checked_mul(self.row_stride)?;
        let col = (x as usize).checked_mul(BYTES_PER_PIXEL)?;
        self.pixel_data_offset.checked_add(row)?.checked_add(col)
    }

    /// Fetch the pixel shown at (`x`, `dest_y`).
    pub fn pixel(
        &self,
        x: u32,
        dest_y: u32,
    ) -> Result<Rgb888, OutOfBounds> {
        let offset = self.pixel_offset(x, dest_y).ok_or(OutOfBounds {
            offset: usize::MAX,
            len: self.data.len(),
        })?;
        let [b, g, r] = self.data.bgr(offset)?;
        Ok(Rgb888::new(r, g, b))
    }

    /// Buffer length needed to hold every declared pixel (padding of the
    /// last row excluded).
    pub fn required_len(&self) -> Option<usize> {
        let last_row = (self.height as usize - 1).checked_mul(self.row_stride)?;
        let row_bytes = (self.width as usize).checked_mul(BYTES_PER_PIXEL)?;
        self.pixel_data_offset.checked_add(last_row)?.checked_add(row_bytes)
    }

    /// Verify that the farthest declared pixel lies inside the buffer.
    pub fn check_extent(&self) -> Result<(), OutOfBounds> {
        let len = self.data.len();
        match self.required_len() {
            Some(required) if required <= len => Ok(()),
            Some(required) => Err(OutOfBounds {
                offset: required - BYTES_PER_PIXEL,
                len,
            }),
            None => Err(OutOfBounds { offset: usize::MAX, len }),
        }
    }
}

// =============================================================================
// Decoding
// =============================================================================

#[inline]
fn read_u16(
    bytes: &[u8],
    at: usize,
) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

#[inline]
fn read_u32(
    bytes: &[u8],
    at: usize,
) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

#[inline]
fn read_i32(
    bytes: &[u8],
    at: usize,
) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Bytes per scan row for `width` pixels, padded to a multiple of 4.
#[inline]
pub const fn row_stride(width: u32) -> usize { (width as usize * BYTES_PER_PIXEL).div_ceil(4) * 4 }

/// Parse and validate `buffer` as a 24-bit uncompressed bitmap.
///
/// Rules are checked in order: header length, signature, bit depth,
/// compression, dimensions. Pixel bytes are not touched here.
pub fn decode(buffer: &[u8]) -> Result<DecodedImage<'_>, DecodeError> {
    if buffer.len() < HEADER_LEN {
        return Err(DecodeError::TooShort { len: buffer.len() });
    }

    let signature = read_u16(buffer, SIGNATURE_AT);
    if signature != SIGNATURE {
        return Err(DecodeError::BadSignature(signature));
    }

    let bit_count = read_u16(buffer, BIT_COUNT_AT);
    if bit_count != SUPPORTED_BIT_DEPTH {
        return Err(DecodeError::UnsupportedBitDepth(bit_count));
    }

    let compression = read_u32(buffer, COMPRESSION_AT);
    if compression != COMPRESSION_NONE {
        return Err(DecodeError::UnsupportedCompression(compression));
    }

    let width = read_i32(buffer, WIDTH_AT);
    let height = read_i32(buffer, HEIGHT_AT);
    if width <= 0 || height == 0 || width.unsigned_abs() > MAX_DIMENSION || height.unsigned_abs() > MAX_DIMENSION {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    let orientation = if height < 0 {
        Orientation::TopDown
    } else {
        Orientation::BottomUp
    };
    let width = width.unsigned_abs();

    Ok(DecodedImage {
        data: PixelData::new(buffer),
        width,
        height: height.unsigned_abs(),
        orientation,
        row_stride: row_stride(width),
        pixel_data_offset: read_u32(buffer, PIXEL_OFFSET_AT) as usize,
    })
}

/// Whether `buffer` passes every decode rule.
#[inline]
pub fn validate(buffer: &[u8]) -> bool { decode(buffer).is_ok() }

// =============================================================================
// Tests
// =============================================================================
