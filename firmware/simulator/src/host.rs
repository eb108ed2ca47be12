//! Host directory standing in for the EFI system partition.
//!
//! Volume paths use backslashes (`\EFI\BOOT\BOOTX64.EFI`); each component is
//! joined under the root directory, so the same configuration works on the
//! real partition and in the simulator.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use bootsplash_common::files::{FileError, FileReader};
use bootsplash_common::StatusCode;

/// Map a volume path onto the host file system.
///
/// Returns `None` for paths that would escape the root (`..`, drive prefixes).
pub fn host_path(
    root: &Path,
    volume_path: &str,
) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for part in volume_path.split(['\\', '/']).filter(|part| !part.is_empty()) {
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) => path.push(part),
            Some(Component::CurDir) => {}
            _ => return None,
        }
    }
    Some(path)
}

/// Classify a host I/O error the way the firmware would report it.
pub fn io_status(err: &io::Error) -> StatusCode {
    match err.kind() {
        io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        io::ErrorKind::PermissionDenied => StatusCode::ACCESS_DENIED,
        _ => StatusCode::DEVICE_ERROR,
    }
}

/// Reads files below a host directory.
#[derive(Clone, Debug)]
pub struct HostFiles {
    root: PathBuf,
}

impl HostFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl FileReader for HostFiles {
    fn read_whole(
        &mut self,
        path: &str,
    ) -> Result<Vec<u8>, FileError> {
        let host = host_path(&self.root, path).ok_or(FileError::NotFound)?;
        log::debug!("read {} -> {}", path, host.display());

        match fs::read(&host) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FileError::NotFound),
            Err(err) if err.kind() == io::ErrorKind::OutOfMemory => Err(FileError::OutOfResources),
            Err(err) => {
                log::warn!("{}: {}", host.display(), err);
                Err(FileError::Device(io_status(&err)))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
