//! Color constants for the boot screen.
//!
//! The renderer works in [`Rgb888`] and converts to each surface's native
//! format at the last step, so every constant here is 24-bit.

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

// =============================================================================
// Splash
// =============================================================================

/// Fill color for the whole surface before the image is drawn.
pub const BACKGROUND: Rgb888 = Rgb888::BLACK;

// =============================================================================
// Status banners
// =============================================================================

/// Error banner text (console "light red").
pub const ERROR_TEXT: Rgb888 = Rgb888::new(255, 85, 85);

/// Warning text (console "yellow").
pub const WARNING_TEXT: Rgb888 = Rgb888::new(255, 255, 85);

/// Informational text (console "light cyan").
pub const INFO_TEXT: Rgb888 = Rgb888::new(85, 255, 255);

/// Plain text.
pub const TEXT: Rgb888 = Rgb888::WHITE;
