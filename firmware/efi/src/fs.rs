//! Files on the volume the application was loaded from.
//!
//! The volume is opened per read and closed again, so no file system
//! protocol stays open while a boot image is being loaded from it.

use alloc::vec::Vec;

use bootsplash_common::files::{FileError, FileReader};
use uefi::fs::{self, FileSystem, PathBuf};
use uefi::{CString16, Status, boot};

use crate::status;

/// EFI system partition reader.
pub struct EspFiles;

impl FileReader for EspFiles {
    fn read_whole(
        &mut self,
        path: &str,
    ) -> Result<Vec<u8>, FileError> {
        let path = CString16::try_from(path).map_err(|_| status::file_error(Status::INVALID_PARAMETER))?;
        let volume = boot::get_image_file_system(boot::image_handle())
            .map_err(|err| status::file_error(err.status()))?;

        FileSystem::new(volume).read(PathBuf::from(path)).map_err(|err| match err {
            fs::Error::Io(io) => status::file_error(io.uefi_error.status()),
            other => {
                log::warn!("file system error: {:?}", other);
                status::file_error(Status::INVALID_PARAMETER)
            }
        })
    }
}
