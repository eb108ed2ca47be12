//! Whole-file reads from the boot volume.

use alloc::vec::Vec;

use thiserror::Error;

use crate::error::{ErrorKind, StatusCode};

/// Why a file could not be read.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum FileError {
    #[error("file not found")]
    NotFound,

    #[error("read failed with status {0}")]
    Device(StatusCode),

    #[error("no memory for file contents")]
    OutOfResources,
}

impl FileError {
    /// Map onto the shared taxonomy.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Device(_) => ErrorKind::DeviceError,
            Self::OutOfResources => ErrorKind::OutOfResources,
        }
    }

    /// Raw status, when the platform supplied one.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Device(status) => Some(*status),
            _ => None,
        }
    }
}

/// Read access to the volume the application was loaded from.
pub trait FileReader {
    /// Read the whole file at `path` (backslash-separated, volume-absolute).
    fn read_whole(
        &mut self,
        path: &str,
    ) -> Result<Vec<u8>, FileError>;
}
