//! Boot configuration.
//!
//! Compile-time defaults live here as constants. At boot they can be
//! overridden by an optional text file on the EFI system partition:
//!
//! ```text
//! # \EFI\bootsplash\splash.cfg
//! splash = \EFI\bootsplash\splash.bmp
//! candidate = \EFI\FreeBSD\loader.efi
//! candidate = \EFI\BOOT\BOOTX64.EFI
//! fallback = \EFI\BOOT\BOOTX64.EFI
//! timeout_ms = 3000
//! skip_on_keypress = true
//! show_boot_info = false
//! ```
//!
//! A `#` starts a comment at the beginning of a line or after whitespace, so
//! paths may contain `#`.
//!
//! The file is all-or-nothing: one unknown key or bad value rejects it and
//! the defaults stay in force.

use heapless::String;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::sequencer::{BootCandidate, BootCandidates};

// =============================================================================
// Limits
// =============================================================================

/// Maximum length of any firmware path, in bytes.
pub const PATH_LEN: usize = 128;

/// Maximum number of primary boot candidates.
pub const MAX_CANDIDATES: usize = 8;

// =============================================================================
// Defaults
// =============================================================================

/// Location of the optional configuration file.
pub const CONFIG_PATH: &str = "\\EFI\\bootsplash\\splash.cfg";

/// Default splash image.
pub const SPLASH_PATH: &str = "\\EFI\\bootsplash\\splash.bmp";

/// Default primary candidates, in priority order.
pub const DEFAULT_CANDIDATES: &[&str] = &["\\EFI\\BOOT\\loader.efi", "\\EFI\\BOOT\\BOOTX64.EFI"];

/// Default last-resort candidate.
pub const FALLBACK_PATH: &str = "\\EFI\\BOOT\\BOOTX64.EFI";

/// How long the splash stays up (ms).
pub const SPLASH_TIMEOUT_MS: u32 = 2000;

/// How long the fatal report stays up before returning to firmware (ms).
pub const FATAL_PAUSE_MS: u32 = 10_000;

// =============================================================================
// Errors
// =============================================================================

/// Why a configuration could not be built or parsed.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigError {
    #[error("boot candidate list is empty")]
    NoCandidates,

    #[error("more than {MAX_CANDIDATES} boot candidates")]
    TooManyCandidates,

    #[error("path longer than {PATH_LEN} bytes")]
    PathTooLong,

    #[error("line {line}: expected `key = value`")]
    Syntax { line: usize },

    #[error("line {line}: unknown key")]
    UnknownKey { line: usize },

    #[error("line {line}: invalid value")]
    BadValue { line: usize },

    #[error("file is not valid UTF-8")]
    Encoding,
}

impl ConfigError {
    /// Map onto the shared taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCandidates | Self::TooManyCandidates | Self::PathTooLong => ErrorKind::InvalidParameter,
            Self::Syntax { .. } | Self::UnknownKey { .. } | Self::BadValue { .. } | Self::Encoding => {
                ErrorKind::Unsupported
            }
        }
    }
}

/// Copy `path` into a bounded string.
pub fn bounded_path(path: &str) -> Result<String<PATH_LEN>, ConfigError> {
    String::try_from(path).map_err(|_| ConfigError::PathTooLong)
}

// =============================================================================
// Configuration value
// =============================================================================

/// Everything the orchestrator needs to know, passed in explicitly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BootConfig {
    /// Splash image path.
    pub splash_path: String<PATH_LEN>,
    /// Primary candidates plus the last-resort candidate.
    pub candidates: BootCandidates,
    /// Splash display time in ms (always positive).
    pub timeout_ms: u32,
    /// Race the timeout against a key press (`false` = fixed stall).
    pub skip_on_keypress: bool,
    /// Report the display mode before rendering.
    pub show_boot_info: bool,
}

impl BootConfig {
    /// Built-in defaults.
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            splash_path: bounded_path(SPLASH_PATH)?,
            candidates: BootCandidates::new(DEFAULT_CANDIDATES, FALLBACK_PATH)?,
            timeout_ms: SPLASH_TIMEOUT_MS,
            skip_on_keypress: true,
            show_boot_info: false,
        })
    }

    /// Parse a configuration file on top of `self`.
    ///
    /// Returns the merged configuration. `self` is untouched on error, so the
    /// caller keeps the previous values.
    pub fn with_overrides(
        &self,
        text: &str,
    ) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        let mut primary: Option<heapless::Vec<BootCandidate, MAX_CANDIDATES>> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = strip_comment(raw).trim();
            if content.is_empty() {
                continue;
            }

            let (key, value) = content.split_once('=').ok_or(ConfigError::Syntax { line })?;
            let (key, value) = (key.trim(), value.trim());
            if value.is_empty() {
                return Err(ConfigError::BadValue { line });
            }

            match key {
                "splash" => next.splash_path = bounded_path(value)?,
                "candidate" => {
                    // First occurrence replaces the built-in list
                    let list = primary.get_or_insert_with(heapless::Vec::new);
                    let candidate = BootCandidate::new(value, list.len())?;
                    list.push(candidate).map_err(|_| ConfigError::TooManyCandidates)?;
                }
                "fallback" => next.candidates.set_fallback(value)?,
                "timeout_ms" => {
                    next.timeout_ms = value
                        .parse::<u32>()
                        .ok()
                        .filter(|&ms| ms > 0)
                        .ok_or(ConfigError::BadValue { line })?;
                }
                "skip_on_keypress" => next.skip_on_keypress = parse_bool(value).ok_or(ConfigError::BadValue { line })?,
                "show_boot_info" => next.show_boot_info = parse_bool(value).ok_or(ConfigError::BadValue { line })?,
                _ => return Err(ConfigError::UnknownKey { line }),
            }
        }

        if let Some(list) = primary {
            next.candidates.set_primary(list)?;
        }
        Ok(next)
    }
}

/// Cut a trailing `# comment` from a line.
fn strip_comment(line: &str) -> &str {
    let mut prev = None;
    for (index, ch) in line.char_indices() {
        if ch == '#' && prev.is_none_or(char::is_whitespace) {
            return &line[..index];
        }
        prev = Some(ch);
    }
    line
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
