//! Boot flow: splash, linger, boot.
//!
//! ```text
//! load_config ──▶ show_splash ──▶ linger ──▶ boot
//!                   │ (no surface, no file,     │
//!                   │  bad image, no memory)    ├─▶ Started
//!                   └──── skip linger ──────────┘
//!                                               └─▶ Failed (report + pause)
//! ```
//!
//! Every step before `boot` degrades instead of failing: whatever goes wrong
//! with the splash, the boot candidates are still tried. Only exhausting the
//! candidates is reported as fatal.

use core::str;

use crate::config::{BootConfig, CONFIG_PATH, ConfigError, FATAL_PAUSE_MS};
use crate::error::{ErrorKind, StatusCode};
use crate::files::{FileError, FileReader};
use crate::input::{InputEvents, RaceOutcome, TimedInput};
use crate::render::{self, FrameAllocator, RenderReport};
use crate::sequencer::{BootCandidate, BootCandidates, BootSequencer, ImageLoader, SequenceState};
use crate::status::StatusReporter;
use crate::surface::TargetSurface;

// =============================================================================
// Types
// =============================================================================

/// Every platform service the boot flow uses.
pub struct Platform<S, F, I, L, R> {
    /// Display, if the firmware exposes one.
    pub surface: Option<S>,
    /// Boot volume.
    pub files: F,
    /// Console keys and timers.
    pub input: TimedInput<I>,
    /// Image loader.
    pub loader: L,
    /// Operator messages.
    pub reporter: R,
}

/// What happened after the splash.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Linger {
    /// No splash on screen, nothing to wait for.
    Skipped,
    /// Raced the timeout against a key press.
    Raced(RaceOutcome),
    /// Fixed delay (key skipping disabled).
    Stalled,
}

/// Final result of the boot flow.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum BootOutcome {
    /// A candidate started and returned success.
    Started { candidate: BootCandidate, attempts: u32 },
    /// Every candidate failed, including the final retry.
    Failed { attempts: u32, status: Option<StatusCode> },
}

impl BootOutcome {
    /// Whether a candidate started.
    #[inline]
    pub const fn is_started(&self) -> bool { matches!(self, Self::Started { .. }) }
}

// =============================================================================
// Steps
// =============================================================================

/// Built-in defaults, overridden by the config file when it parses.
///
/// Only a broken built-in default is an error; a missing or rejected file
/// leaves the defaults in force.
pub fn load_config<F, R>(
    files: &mut F,
    reporter: &mut R,
) -> Result<BootConfig, ConfigError>
where
    F: FileReader,
    R: StatusReporter,
{
    let defaults = BootConfig::new()?;

    let bytes = match files.read_whole(CONFIG_PATH) {
        Ok(bytes) => bytes,
        Err(FileError::NotFound) => {
            log::debug!("no {}, using built-in defaults", CONFIG_PATH);
            return Ok(defaults);
        }
        Err(err) => {
            log::warn!("cannot read {}: {}", CONFIG_PATH, err);
            return Ok(defaults);
        }
    };

    let parsed = str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Encoding)
        .and_then(|text| defaults.with_overrides(text));
    match parsed {
        Ok(config) => {
            log::info!("configuration loaded from {}", CONFIG_PATH);
            Ok(config)
        }
        Err(err) => {
            reporter.report_warning("Configuration ignored", format_args!("{}: {}", CONFIG_PATH, err));
            Ok(defaults)
        }
    }
}

/// Read, decode and draw the splash image.
///
/// Returns `None` when nothing was drawn. The file buffer lives only for the
/// duration of this call.
pub fn show_splash<S, F, R, A>(
    surface: Option<&mut S>,
    files: &mut F,
    reporter: &mut R,
    config: &BootConfig,
    alloc: &mut A,
) -> Option<RenderReport>
where
    S: TargetSurface,
    F: FileReader,
    R: StatusReporter,
    A: FrameAllocator,
{
    let Some(surface) = surface else {
        log::warn!("no graphics output, skipping splash");
        if config.show_boot_info {
            reporter.report_info(format_args!("No graphics output available"));
        }
        return None;
    };

    if config.show_boot_info {
        let size = surface.resolution();
        reporter.report_info(format_args!("Display: {}x{}", size.width, size.height));
        reporter.report_info(format_args!("Pixel format: {}", surface.pixel_format()));
        if let Some((current, count)) = surface.mode() {
            reporter.report_info(format_args!("Mode: {} of {}", current, count));
        }
    }

    let bytes = match files.read_whole(&config.splash_path) {
        Ok(bytes) => bytes,
        Err(FileError::NotFound) => {
            log::info!("no splash image at {}", config.splash_path);
            return None;
        }
        Err(err) => {
            reporter.report_warning("Splash image unavailable", format_args!("{}: {}", config.splash_path, err));
            return None;
        }
    };

    match render::render_bitmap(surface, &bytes, alloc) {
        Ok(report) => {
            log::info!(
                "splash {}x{} shown at ({}, {}) via {:?}",
                report.visible.width,
                report.visible.height,
                report.origin.x,
                report.origin.y,
                report.path
            );
            Some(report)
        }
        Err(err) => {
            reporter.report_warning("Splash image not shown", format_args!("{} ({})", err, err.kind()));
            None
        }
    }
}

/// Keep the splash on screen for the configured time.
pub fn linger<I: InputEvents>(
    input: &mut TimedInput<I>,
    config: &BootConfig,
    shown: bool,
) -> Linger {
    if !shown {
        return Linger::Skipped;
    }
    if !config.skip_on_keypress {
        input.stall(config.timeout_ms);
        return Linger::Stalled;
    }

    let outcome = input.race_key_or_timeout(config.timeout_ms);
    if outcome.key_pressed() {
        log::info!("key pressed, skipping splash delay");
    }
    Linger::Raced(outcome)
}

/// Try every candidate. On total failure, report it and pause.
pub fn boot<L, I, R>(
    candidates: &BootCandidates,
    loader: &mut L,
    input: &mut TimedInput<I>,
    reporter: &mut R,
) -> BootOutcome
where
    L: ImageLoader,
    I: InputEvents,
    R: StatusReporter,
{
    let mut sequencer = BootSequencer::new(candidates);
    let state = sequencer.run(loader);

    if let (SequenceState::Succeeded, Some(candidate)) = (state, sequencer.started()) {
        log::info!("{} returned success", candidate);
        return BootOutcome::Started {
            candidate: candidate.clone(),
            attempts: sequencer.attempts(),
        };
    }

    let failures = sequencer.failures();
    let status = failures.last().map(|record| record.error.status);
    reporter.report_error(
        "Boot Failed",
        format_args!("None of {} boot images could be started", sequencer.attempts()),
        ErrorKind::Failed,
        status,
    );
    for (n, record) in failures.iter().enumerate() {
        reporter.report_info(format_args!("{}. {}: {}", n + 1, record.candidate, record.error));
    }
    reporter.report_info(format_args!(
        "Returning to firmware in {} seconds, press any key to continue now.",
        FATAL_PAUSE_MS / 1000
    ));
    input.race_key_or_timeout(FATAL_PAUSE_MS);

    BootOutcome::Failed {
        attempts: sequencer.attempts(),
        status,
    }
}

/// The whole boot flow.
pub fn run<S, F, I, L, R, A>(
    platform: &mut Platform<S, F, I, L, R>,
    config: &BootConfig,
    alloc: &mut A,
) -> BootOutcome
where
    S: TargetSurface,
    F: FileReader,
    I: InputEvents,
    L: ImageLoader,
    R: StatusReporter,
    A: FrameAllocator,
{
    let shown = show_splash(
        platform.surface.as_mut(),
        &mut platform.files,
        &mut platform.reporter,
        config,
        alloc,
    );
    linger(&mut platform.input, config, shown.is_some());
    boot(&config.candidates, &mut platform.loader, &mut platform.input, &mut platform.reporter)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;

    use super::*;
    use crate::config::SPLASH_PATH;
    use crate::input::Key;
    use crate::render::HeapAllocator;
    use crate::testing::{
        BitmapBuilder, LimitedAllocator, MemoryFiles, RecordingReporter, RecordingSurface, Report, ScriptedInput,
        ScriptedLoader,
    };

    type TestPlatform = Platform<RecordingSurface, MemoryFiles, ScriptedInput, ScriptedLoader, RecordingReporter>;

    fn splash() -> alloc::vec::Vec<u8> { BitmapBuilder::new(4, 2).build(|_, _| Rgb888::WHITE) }

    fn platform(
        files: MemoryFiles,
        input: ScriptedInput,
        loader: ScriptedLoader,
    ) -> TestPlatform {
        Platform {
            surface: Some(RecordingSurface::new(8, 6)),
            files,
            input: TimedInput::new(input),
            loader,
            reporter: RecordingReporter::default(),
        }
    }

    fn defaults() -> BootConfig { BootConfig::new().unwrap() }

    #[test]
    fn test_splash_then_boot() {
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\BOOTX64.EFI"]),
        );
        let outcome = run(&mut platform, &defaults(), &mut HeapAllocator);

        match outcome {
            BootOutcome::Started { candidate, attempts } => {
                assert_eq!(candidate.path(), "\\EFI\\BOOT\\BOOTX64.EFI");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        let surface = platform.surface.as_ref().unwrap();
        assert_eq!(surface.pixel(2, 2), Rgb888::WHITE);
        assert_eq!(surface.pixel(0, 0), Rgb888::BLACK);
        assert_eq!(platform.loader.attempted(), ["\\EFI\\BOOT\\loader.efi", "\\EFI\\BOOT\\BOOTX64.EFI"]);
        // Full splash timeout elapsed before booting
        assert_eq!(platform.input.events().now_ms, 2000);
        assert!(platform.reporter.reports.is_empty());
    }

    #[test]
    fn test_key_press_cuts_linger_short() {
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new().key_at(300, Key::Printable(' ')),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        assert!(run(&mut platform, &defaults(), &mut HeapAllocator).is_started());
        assert_eq!(platform.input.events().now_ms, 300);
        assert_eq!(platform.input.events().pending_keys(), 0);
    }

    #[test]
    fn test_fixed_stall_ignores_keys() {
        let mut config = defaults();
        config.skip_on_keypress = false;
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new().key_at(300, Key::Printable(' ')),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        assert!(run(&mut platform, &config, &mut HeapAllocator).is_started());
        assert_eq!(platform.input.events().now_ms, 2000);
        assert_eq!(platform.input.events().armed, 0);
        assert_eq!(platform.input.events().pending_keys(), 1);
    }

    #[test]
    fn test_missing_splash_boots_immediately() {
        let mut platform = platform(
            MemoryFiles::new(),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        assert!(run(&mut platform, &defaults(), &mut HeapAllocator).is_started());
        assert_eq!(platform.input.events().now_ms, 0);
        assert!(platform.reporter.reports.is_empty());
    }

    #[test]
    fn test_unreadable_splash_warns() {
        let mut platform = platform(
            MemoryFiles::new().failing(SPLASH_PATH, StatusCode(7)),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        assert!(run(&mut platform, &defaults(), &mut HeapAllocator).is_started());
        assert!(matches!(
            platform.reporter.reports.as_slice(),
            [Report::Warning { title, .. }] if title == "Splash image unavailable"
        ));
    }

    #[test]
    fn test_corrupt_splash_degrades() {
        let bytes = BitmapBuilder::new(4, 4).bit_depth(32).header_only();
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, bytes),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        assert!(run(&mut platform, &defaults(), &mut HeapAllocator).is_started());
        assert_eq!(platform.input.events().now_ms, 0);
        assert!(matches!(
            platform.reporter.reports.as_slice(),
            [Report::Warning { message, .. }] if message.contains("Unsupported")
        ));
    }

    #[test]
    fn test_out_of_memory_degrades() {
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        let outcome = run(&mut platform, &defaults(), &mut LimitedAllocator::new(0));
        assert!(outcome.is_started());
        assert_eq!(platform.input.events().now_ms, 0);
        assert_eq!(platform.surface.as_ref().unwrap().image_transfers(), 0);
    }

    #[test]
    fn test_no_surface_still_boots() {
        let mut config = defaults();
        config.show_boot_info = true;
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        platform.surface = None;

        assert!(run(&mut platform, &config, &mut HeapAllocator).is_started());
        assert_eq!(platform.reporter.reports, [Report::Info("No graphics output available".into())]);
    }

    #[test]
    fn test_boot_info_reports_resolution() {
        let mut config = defaults();
        config.show_boot_info = true;
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        run(&mut platform, &config, &mut HeapAllocator);
        assert_eq!(platform.reporter.reports, [
            Report::Info("Display: 8x6".into()),
            Report::Info("Pixel format: RGB 8:8:8".into()),
        ]);
    }

    #[test]
    fn test_boot_info_reports_mode() {
        let mut config = defaults();
        config.show_boot_info = true;
        let mut platform = platform(
            MemoryFiles::new().with(SPLASH_PATH, splash()),
            ScriptedInput::new(),
            ScriptedLoader::succeeding(&["\\EFI\\BOOT\\loader.efi"]),
        );
        if let Some(surface) = platform.surface.as_mut() {
            surface.mode = Some((2, 5));
        }
        run(&mut platform, &config, &mut HeapAllocator);
        assert_eq!(platform.reporter.reports[2], Report::Info("Mode: 2 of 5".into()));
    }

    #[test]
    fn test_total_failure_reports_and_pauses() {
        let mut platform = platform(MemoryFiles::new(), ScriptedInput::new(), ScriptedLoader::succeeding(&[]));
        let outcome = run(&mut platform, &defaults(), &mut HeapAllocator);

        assert_eq!(
            outcome,
            BootOutcome::Failed {
                attempts: 3,
                status: Some(ScriptedLoader::FAILURE_STATUS),
            }
        );
        let reports = &platform.reporter.reports;
        assert!(matches!(
            &reports[0],
            Report::Error { kind: ErrorKind::Failed, status: Some(_), .. }
        ));
        // One line per attempt plus the countdown notice
        assert_eq!(reports.len(), 1 + 3 + 1);
        assert_eq!(reports[3], Report::Info("3. \\EFI\\BOOT\\BOOTX64.EFI: Not Found (0x800000000000000e)".into()));
        assert_eq!(platform.input.events().now_ms, u64::from(FATAL_PAUSE_MS));
    }

    #[test]
    fn test_fatal_pause_ends_on_key() {
        let mut platform = platform(
            MemoryFiles::new(),
            ScriptedInput::new().key_at(1234, Key::Printable('r')),
            ScriptedLoader::succeeding(&[]),
        );
        assert!(!run(&mut platform, &defaults(), &mut HeapAllocator).is_started());
        assert_eq!(platform.input.events().now_ms, 1234);
    }

    #[test]
    fn test_linger_skipped_without_splash() {
        let mut input = TimedInput::new(ScriptedInput::new());
        assert_eq!(linger(&mut input, &defaults(), false), Linger::Skipped);
        assert_eq!(
            linger(&mut input, &defaults(), true),
            Linger::Raced(RaceOutcome::TimedOut)
        );
    }

    #[test]
    fn test_load_config_from_file() {
        let mut files = MemoryFiles::new().with(CONFIG_PATH, b"timeout_ms = 750\n".to_vec());
        let mut reporter = RecordingReporter::default();
        let config = load_config(&mut files, &mut reporter).unwrap();
        assert_eq!(config.timeout_ms, 750);
        assert!(reporter.reports.is_empty());
    }

    #[test]
    fn test_load_config_rejects_bad_file() {
        let mut files = MemoryFiles::new().with(CONFIG_PATH, b"timeout_ms = 750\nbogus = 1\n".to_vec());
        let mut reporter = RecordingReporter::default();
        let config = load_config(&mut files, &mut reporter).unwrap();
        assert_eq!(config, defaults());
        assert!(matches!(
            reporter.reports.as_slice(),
            [Report::Warning { message, .. }] if message.ends_with("line 2: unknown key")
        ));
    }

    #[test]
    fn test_load_config_rejects_binary() {
        let mut files = MemoryFiles::new().with(CONFIG_PATH, alloc::vec![0xff, 0xfe, 0x00]);
        let mut reporter = RecordingReporter::default();
        assert_eq!(load_config(&mut files, &mut reporter), Ok(defaults()));
        assert_eq!(reporter.reports.len(), 1);
    }

    #[test]
    fn test_load_config_absent() {
        let mut reporter = RecordingReporter::default();
        assert_eq!(load_config(&mut MemoryFiles::new(), &mut reporter), Ok(defaults()));
        assert!(reporter.reports.is_empty());
    }

    #[test]
    fn test_splash_origin_centered() {
        let mut surface = RecordingSurface::new(8, 6);
        let mut files = MemoryFiles::new().with(SPLASH_PATH, splash());
        let report = show_splash(
            Some(&mut surface),
            &mut files,
            &mut RecordingReporter::default(),
            &defaults(),
            &mut HeapAllocator,
        )
        .unwrap();
        assert_eq!(report.origin, Point::new(2, 2));
    }
}
