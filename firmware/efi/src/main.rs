//! Bootsplash UEFI application.
//!
//! Shows a bitmap splash on the Graphics Output Protocol, lingers until a
//! timeout or key press, then chainloads the OS loader from the same volume.
//!
//! # Flow
//!
//! 1. Read `\EFI\bootsplash\splash.cfg` (optional) on top of built-in defaults
//! 2. Draw `\EFI\bootsplash\splash.bmp` centered on a black screen
//! 3. Wait for the timeout or any key
//! 4. Try each boot candidate, then the last-resort one
//!
//! Everything but step 4 degrades silently: a missing GOP, file or memory only
//! means no splash.
//!
//! On non-UEFI targets this builds to a stub so the workspace stays buildable
//! on the host.

#![cfg_attr(target_os = "uefi", no_std)]
#![cfg_attr(target_os = "uefi", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]

#[cfg(target_os = "uefi")]
extern crate alloc;

// Modules only used in the firmware binary
#[cfg(target_os = "uefi")]
mod console;
#[cfg(target_os = "uefi")]
mod fs;
#[cfg(target_os = "uefi")]
mod gop;
#[cfg(target_os = "uefi")]
mod input;
#[cfg(target_os = "uefi")]
mod loader;
#[cfg(target_os = "uefi")]
mod status;

#[cfg(target_os = "uefi")]
use bootsplash_common::input::TimedInput;
#[cfg(target_os = "uefi")]
use bootsplash_common::orchestrator::{self, BootOutcome, Platform};
#[cfg(target_os = "uefi")]
use bootsplash_common::render::HeapAllocator;
#[cfg(target_os = "uefi")]
use bootsplash_common::status::StatusReporter;
#[cfg(target_os = "uefi")]
use uefi::prelude::*;

#[cfg(target_os = "uefi")]
use crate::console::ConsoleReporter;
#[cfg(target_os = "uefi")]
use crate::fs::EspFiles;
#[cfg(target_os = "uefi")]
use crate::gop::GopSurface;
#[cfg(target_os = "uefi")]
use crate::input::ConsoleInput;
#[cfg(target_os = "uefi")]
use crate::loader::ChainLoader;

#[cfg(target_os = "uefi")]
#[entry]
fn main() -> Status {
    if let Err(err) = uefi::helpers::init() {
        return err.status();
    }
    // Console text draws over the splash, keep it quiet unless asked
    log::set_max_level(log::LevelFilter::Warn);

    let mut files = EspFiles;
    let mut reporter = ConsoleReporter;

    let config = match orchestrator::load_config(&mut files, &mut reporter) {
        Ok(config) => config,
        Err(err) => {
            reporter.report_error("Configuration", format_args!("{}", err), err.kind(), None);
            return Status::INVALID_PARAMETER;
        }
    };
    if config.show_boot_info {
        log::set_max_level(log::LevelFilter::Info);
        log::info!("bootsplash {}", env!("CARGO_PKG_VERSION"));
    }

    let surface = match GopSurface::open() {
        Ok(surface) => Some(surface),
        Err(err) => {
            log::warn!("graphics output unavailable: {:?}", err.status());
            None
        }
    };

    let mut platform = Platform {
        surface,
        files,
        input: TimedInput::new(ConsoleInput),
        loader: ChainLoader,
        reporter,
    };

    match orchestrator::run(&mut platform, &config, &mut HeapAllocator) {
        BootOutcome::Started { .. } => Status::SUCCESS,
        BootOutcome::Failed { status: code, .. } => code.map_or(Status::LOAD_ERROR, status::to_status),
    }
}

#[cfg(not(target_os = "uefi"))]
fn main() {
    eprintln!("bootsplash runs as a UEFI application: build with --target x86_64-unknown-uefi");
    eprintln!("use bootsplash-simulator to preview a splash on this machine");
}
