//! Core of the bootsplash firmware application.
//!
//! This crate contains the platform-agnostic code shared between the UEFI
//! binary and the desktop simulator:
//!
//! - [`bmp`]: zero-copy 24-bit bitmap decoder
//! - [`surface`]: display surface trait and native pixel formats
//! - [`render`]: centered splash renderer (full-frame / row-streaming)
//! - [`input`]: key press vs. timer race
//! - [`sequencer`]: boot candidate state machine
//! - [`attempts`]: ring buffer of failed boot attempts
//! - [`config`]: compile-time defaults and the optional config file
//! - [`files`]: whole-file reads from the boot volume
//! - [`status`]: operator-facing status reporting
//! - [`orchestrator`]: splash, linger, boot
//! - [`error`]: shared error taxonomy
//!
//! # no_std Compatibility
//!
//! This crate is `no_std` and only needs `alloc` (for the splash file and the
//! frame buffer). Every firmware service is reached through a trait, so the
//! whole flow runs on the host under test.

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

extern crate alloc;

pub mod attempts;
pub mod bmp;
pub mod colors;
pub mod config;
pub mod error;
pub mod files;
pub mod input;
pub mod orchestrator;
pub mod render;
pub mod sequencer;
pub mod status;
pub mod surface;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use error::{ErrorKind, StatusCode};
pub use orchestrator::{BootOutcome, Platform};
pub use surface::{BgrxPixel, DrawTargetSurface, SurfacePixel, TargetSurface};
