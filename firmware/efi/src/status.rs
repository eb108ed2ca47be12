//! Firmware status codes to the shared error taxonomy.

use bootsplash_common::error::{ErrorKind, StatusCode};
use bootsplash_common::files::FileError;
use bootsplash_common::sequencer::LoadError;
use uefi::Status;

/// Classify a firmware status.
pub fn classify(status: Status) -> ErrorKind {
    match status {
        Status::INVALID_PARAMETER => ErrorKind::InvalidParameter,
        Status::UNSUPPORTED | Status::INCOMPATIBLE_VERSION => ErrorKind::Unsupported,
        Status::BAD_BUFFER_SIZE | Status::BUFFER_TOO_SMALL | Status::VOLUME_CORRUPTED => ErrorKind::Truncated,
        Status::OUT_OF_RESOURCES | Status::VOLUME_FULL => ErrorKind::OutOfResources,
        Status::NOT_FOUND | Status::NO_MEDIA => ErrorKind::NotFound,
        Status::DEVICE_ERROR | Status::NOT_READY | Status::TIMEOUT => ErrorKind::DeviceError,
        _ => ErrorKind::Failed,
    }
}

/// Raw status for reports.
#[inline]
pub const fn code(status: Status) -> StatusCode { StatusCode(status.0) }

/// Raw status back to a firmware status.
#[inline]
pub const fn to_status(code: StatusCode) -> Status { Status(code.0) }

/// Loader failure from a firmware error.
pub fn load_error(err: &uefi::Error<impl core::fmt::Debug>) -> LoadError {
    LoadError {
        kind: classify(err.status()),
        status: code(err.status()),
    }
}

/// File failure from a firmware status.
pub fn file_error(status: Status) -> FileError {
    match classify(status) {
        ErrorKind::NotFound => FileError::NotFound,
        ErrorKind::OutOfResources => FileError::OutOfResources,
        _ => FileError::Device(code(status)),
    }
}
