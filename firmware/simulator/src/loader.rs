//! Dry-run image loader.
//!
//! A candidate "starts" when its file exists under the simulated partition
//! and carries a PE/COFF `MZ` signature. Nothing is executed.

use std::collections::HashSet;

use bootsplash_common::{ErrorKind, StatusCode};
use bootsplash_common::files::{FileError, FileReader};
use bootsplash_common::sequencer::{BootCandidate, ImageLoader, LoadError};

use crate::host::HostFiles;

/// DOS header magic at the start of every EFI executable.
const PE_SIGNATURE: &[u8] = b"MZ";

/// Checks candidates on the host without running them.
#[derive(Debug)]
pub struct DryRunLoader {
    files: HostFiles,
    refused: HashSet<String>,
    attempted: Vec<String>,
}

impl DryRunLoader {
    /// Loader over `files`; candidates in `refused` fail to start even when valid.
    pub fn new(
        files: HostFiles,
        refused: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            files,
            refused: refused.into_iter().map(|path| path.to_ascii_uppercase()).collect(),
            attempted: Vec::new(),
        }
    }

    /// Candidate paths in the order they were tried.
    pub fn attempted(&self) -> &[String] { &self.attempted }
}

impl ImageLoader for DryRunLoader {
    fn load_and_start(
        &mut self,
        candidate: &BootCandidate,
    ) -> Result<(), LoadError> {
        let path = candidate.path();
        self.attempted.push(path.to_owned());

        let image = self.files.read_whole(path).map_err(|err| match err {
            FileError::NotFound => LoadError {
                kind: ErrorKind::NotFound,
                status: StatusCode::NOT_FOUND,
            },
            other => LoadError {
                kind: other.kind(),
                status: other.status().unwrap_or(StatusCode::DEVICE_ERROR),
            },
        })?;

        if !image.starts_with(PE_SIGNATURE) {
            return Err(LoadError {
                kind: ErrorKind::Unsupported,
                status: StatusCode::UNSUPPORTED,
            });
        }

        // FAT lookups are case-insensitive
        if self.refused.contains(&path.to_ascii_uppercase()) {
            return Err(LoadError {
                kind: ErrorKind::Failed,
                status: StatusCode::LOAD_ERROR,
            });
        }

        log::info!("would start {} ({} bytes)", candidate, image.len());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
