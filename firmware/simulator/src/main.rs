//! Boot splash simulator for the desktop.
//!
//! Runs the firmware's boot flow against a host directory laid out like the
//! EFI system partition, an in-memory display and a virtual clock, then writes
//! the final screen to a PNG.
//!
//! ```text
//! simulator --esp ./esp --width 1024 --height 768 --key-at 500 -o screen.png
//! ```
//!
//! Exit status is success only when a boot candidate would have started.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod banner;
mod budget;
mod clock;
mod host;
mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bootsplash_common::input::TimedInput;
use bootsplash_common::orchestrator::{self, BootOutcome, Platform};
use bootsplash_common::surface::DrawTargetSurface;
use clap::Parser;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};

use crate::banner::BannerReporter;
use crate::budget::FrameBudget;
use crate::clock::{KeyScript, SimClock};
use crate::host::HostFiles;
use crate::loader::DryRunLoader;

/// Simulate the boot splash and candidate sequence.
#[derive(Parser, Debug)]
#[command(name = "simulator", version, about, long_about = None)]
struct Cli {
    /// Directory standing in for the EFI system partition.
    #[arg(long, default_value = "esp")]
    esp: PathBuf,

    /// Display width in pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Display height in pixels.
    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Run without a graphics output.
    #[arg(long)]
    headless: bool,

    /// Press a key this many virtual ms after start (repeatable).
    #[arg(long = "key-at", value_name = "MS")]
    key_at: Vec<u32>,

    /// Candidate that fails to start even when present (repeatable).
    #[arg(long, value_name = "PATH")]
    refuse: Vec<String>,

    /// Largest pixel buffer the renderer may allocate, in bytes.
    #[arg(long, value_name = "BYTES")]
    frame_budget: Option<usize>,

    /// Where to write the final screen.
    #[arg(short, long, default_value = "screen.png")]
    output: PathBuf,

    /// Output pixel scale.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=8))]
    scale: u32,
}

type SimDisplay = DrawTargetSurface<SimulatorDisplay<Rgb888>>;
type SimPlatform = Platform<SimDisplay, HostFiles, SimClock, DryRunLoader, BannerReporter>;

/// Result of one simulated boot, with the platform state it left behind.
struct Session {
    outcome: BootOutcome,
    platform: SimPlatform,
    budget: FrameBudget,
}

fn simulate(cli: &Cli) -> Result<Session> {
    let files = HostFiles::new(&cli.esp);
    let mut reporter = BannerReporter::default();

    let config = orchestrator::load_config(&mut files.clone(), &mut reporter)
        .context("built-in boot configuration is invalid")?;
    log::debug!("{:?}", config);

    let surface = (!cli.headless)
        .then(|| DrawTargetSurface::new(SimulatorDisplay::<Rgb888>::new(Size::new(cli.width, cli.height))));
    let mut platform = Platform {
        surface,
        files: files.clone(),
        input: TimedInput::new(SimClock::new(KeyScript::at(&cli.key_at))),
        loader: DryRunLoader::new(files, cli.refuse.iter().cloned()),
        reporter,
    };

    let mut budget = FrameBudget::new(cli.frame_budget);
    let outcome = orchestrator::run(&mut platform, &config, &mut budget);

    Ok(Session {
        outcome,
        platform,
        budget,
    })
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut session = simulate(&cli)?;
    let elapsed = session.platform.input.events().now_ms();

    match &session.outcome {
        BootOutcome::Started { candidate, attempts } => {
            log::info!("{} would start after {} attempt(s), {} ms virtual", candidate, attempts, elapsed);
        }
        BootOutcome::Failed { attempts, status } => {
            log::error!("boot failed after {} attempt(s), last status {:?}, {} ms virtual", attempts, status, elapsed);
        }
    }
    if session.budget.refused() > 0 {
        log::info!("frame budget refused {} allocation(s)", session.budget.refused());
    }

    let platform = &mut session.platform;
    if let Some(surface) = platform.surface.as_mut() {
        platform.reporter.draw(surface.inner_mut()).ok();

        let settings = OutputSettingsBuilder::new().scale(cli.scale).build();
        surface
            .inner()
            .to_rgb_output_image(&settings)
            .save_png(&cli.output)
            .with_context(|| format!("cannot write {}", cli.output.display()))?;
        log::info!("screen written to {}", cli.output.display());
    }

    Ok(if session.outcome.is_started() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// =============================================================================
// Tests
// =============================================================================
