//! Capability broker backed by the host audio stack.
//!
//! Desktop hosts have no microphone prompt; access means the configured input
//! device can be opened and queried. On Linux a `/dev/snd` the user may not
//! read is reported as a permanent denial, since asking again cannot help
//! until group membership changes.

use super::device::{find_input_device, suppress_alsa_warnings};
use crate::flow::{CapabilityBroker, MicrophoneAccess, WhistleError};
use anyhow::anyhow;
use cpal::traits::DeviceTrait;

pub struct CpalBroker {
    device_name: String,
}

impl CpalBroker {
    pub fn new(device_name: String) -> Self {
        Self { device_name }
    }
}

impl CapabilityBroker for CpalBroker {
    fn activate(&self) -> Result<(), WhistleError> {
        let host = cpal::default_host();
        tracing::debug!("Audio host: {}", host.id().name());
        Ok(())
    }

    fn request_microphone_access(&self) -> Result<MicrophoneAccess, WhistleError> {
        if sound_devices_forbidden() {
            return Ok(MicrophoneAccess::PermanentlyDenied);
        }

        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            find_input_device(&host, &self.device_name)
        })
        .map_err(WhistleError::SessionSetupFailed)?;

        let Some(device) = device else {
            tracing::warn!("No input device matches '{}'", self.device_name);
            return Ok(MicrophoneAccess::Denied);
        };

        device
            .default_input_config()
            .map_err(|e| WhistleError::SessionSetupFailed(anyhow!("Failed to query input device: {e}")))?;

        Ok(MicrophoneAccess::Granted)
    }

    fn deactivate(&self) {
        tracing::debug!("Audio session released");
    }
}

#[cfg(target_os = "linux")]
fn sound_devices_forbidden() -> bool {
    matches!(
        std::fs::read_dir("/dev/snd"),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied
    )
}

#[cfg(not(target_os = "linux"))]
fn sound_devices_forbidden() -> bool {
    false
}
