//! Error taxonomy shared by every boot stage.
//!
//! Each stage has its own error type (`DecodeError`, `RenderError`, `FileError`,
//! `LoadError`, `ConfigError`), and each of them maps onto one [`ErrorKind`].
//! The kind decides the recovery policy:
//!
//! | Kind | Policy |
//! |------|--------|
//! | `InvalidParameter` | Programmer error, surfaced immediately |
//! | `Unsupported` | Skip the feature (no splash) |
//! | `Truncated` | Skip the feature, buffer never read past the check |
//! | `OutOfResources` | Degraded path where one exists, otherwise skip |
//! | `NotFound` / `DeviceError` | Feature unavailable |
//! | `Failed` | Boot sequence exhausted, fatal |

use core::fmt;

/// Coarse classification of every error the core can produce.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Bad call-time arguments.
    InvalidParameter,
    /// Well-formed input in an encoding we do not handle.
    Unsupported,
    /// Corrupt or hostile buffer (short header, offsets past the end).
    Truncated,
    /// Allocation failure.
    OutOfResources,
    /// File or image does not exist.
    NotFound,
    /// I/O or device failure.
    DeviceError,
    /// Boot sequence exhausted every candidate.
    Failed,
}

impl ErrorKind {
    /// Human-readable name for console reports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidParameter => "Invalid Parameter",
            Self::Unsupported => "Unsupported",
            Self::Truncated => "Bad Buffer Size",
            Self::OutOfResources => "Out of Resources",
            Self::NotFound => "Not Found",
            Self::DeviceError => "Device Error",
            Self::Failed => "Load Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw firmware status code attached to platform errors.
///
/// Formatted as a zero-padded 64-bit hex value, matching what firmware
/// setup screens print.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StatusCode(pub usize);

/// High bit of a firmware status marks an error.
const ERROR_BIT: usize = 1 << (usize::BITS - 1);

impl StatusCode {
    pub const SUCCESS: Self = Self(0);
    pub const LOAD_ERROR: Self = Self(ERROR_BIT | 1);
    pub const INVALID_PARAMETER: Self = Self(ERROR_BIT | 2);
    pub const UNSUPPORTED: Self = Self(ERROR_BIT | 3);
    pub const BAD_BUFFER_SIZE: Self = Self(ERROR_BIT | 4);
    pub const BUFFER_TOO_SMALL: Self = Self(ERROR_BIT | 5);
    pub const NOT_READY: Self = Self(ERROR_BIT | 6);
    pub const DEVICE_ERROR: Self = Self(ERROR_BIT | 7);
    pub const WRITE_PROTECTED: Self = Self(ERROR_BIT | 8);
    pub const OUT_OF_RESOURCES: Self = Self(ERROR_BIT | 9);
    pub const NOT_FOUND: Self = Self(ERROR_BIT | 14);
    pub const ACCESS_DENIED: Self = Self(ERROR_BIT | 15);
    pub const TIMEOUT: Self = Self(ERROR_BIT | 18);
    pub const ABORTED: Self = Self(ERROR_BIT | 21);
    pub const SECURITY_VIOLATION: Self = Self(ERROR_BIT | 26);

    /// Console name of the status, `"Unknown Error"` for anything unlisted.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SUCCESS => "Success",
            Self::LOAD_ERROR => "Load Error",
            Self::INVALID_PARAMETER => "Invalid Parameter",
            Self::UNSUPPORTED => "Unsupported",
            Self::BAD_BUFFER_SIZE => "Bad Buffer Size",
            Self::BUFFER_TOO_SMALL => "Buffer Too Small",
            Self::NOT_READY => "Not Ready",
            Self::DEVICE_ERROR => "Device Error",
            Self::WRITE_PROTECTED => "Write Protected",
            Self::OUT_OF_RESOURCES => "Out of Resources",
            Self::NOT_FOUND => "Not Found",
            Self::ACCESS_DENIED => "Access Denied",
            Self::TIMEOUT => "Timeout",
            Self::ABORTED => "Aborted",
            Self::SECURITY_VIOLATION => "Security Violation",
            _ => "Unknown Error",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
