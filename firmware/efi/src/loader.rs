//! Chainloading boot images from the application's own volume.

use core::mem::MaybeUninit;

use bootsplash_common::sequencer::{BootCandidate, ImageLoader, LoadError};
use uefi::boot::{self, LoadImageSource, OpenProtocolAttributes, OpenProtocolParams};
use uefi::proto::BootPolicy;
use uefi::proto::device_path::build::{self, DevicePathBuilder};
use uefi::proto::device_path::DevicePath;
use uefi::proto::loaded_image::LoadedImage;
use uefi::{CString16, Status};

use crate::status;

/// Scratch space for the candidate's device path.
const DEVICE_PATH_LEN: usize = 1024;

/// Loads candidates by device path: this image's device plus the file path.
pub struct ChainLoader;

fn invalid(status: Status) -> LoadError { status::load_error(&uefi::Error::from(status)) }

impl ImageLoader for ChainLoader {
    fn load_and_start(
        &mut self,
        candidate: &BootCandidate,
    ) -> Result<(), LoadError> {
        let path = CString16::try_from(candidate.path()).map_err(|_| invalid(Status::INVALID_PARAMETER))?;

        let device = boot::open_protocol_exclusive::<LoadedImage>(boot::image_handle())
            .map_err(|err| status::load_error(&err))?
            .device()
            .ok_or_else(|| invalid(Status::NOT_FOUND))?;

        // SAFETY: the device path is only read, and the handle outlives this call.
        let device_path = unsafe {
            boot::open_protocol::<DevicePath>(
                OpenProtocolParams {
                    handle: device,
                    agent: boot::image_handle(),
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
        }
        .map_err(|err| status::load_error(&err))?;

        let mut buf = [MaybeUninit::uninit(); DEVICE_PATH_LEN];
        let mut builder = DevicePathBuilder::with_buf(&mut buf);
        for node in device_path.node_iter() {
            builder = builder.push(&node).map_err(|_| invalid(Status::BUFFER_TOO_SMALL))?;
        }
        let full_path = builder
            .push(&build::media::FilePath { path_name: &path })
            .and_then(DevicePathBuilder::finalize)
            .map_err(|_| invalid(Status::BUFFER_TOO_SMALL))?;

        let image = boot::load_image(
            boot::image_handle(),
            LoadImageSource::FromDevicePath {
                device_path: full_path,
                boot_policy: BootPolicy::ExactMatch,
            },
        )
        .map_err(|err| status::load_error(&err))?;

        log::info!("starting {}", candidate);
        if let Err(err) = boot::start_image(image) {
            if let Err(unload) = boot::unload_image(image) {
                log::warn!("unload of {} failed: {:?}", candidate, unload.status());
            }
            return Err(status::load_error(&err));
        }
        Ok(())
    }
}
