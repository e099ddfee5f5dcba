//! Input device lookup shared by capture, the capability broker, and `list-devices`.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Resolves an input device from a spec: "default", a numeric index, or a device name.
///
/// Returns `Ok(None)` when no matching device exists.
///
/// # Errors
/// - If the host cannot enumerate its input devices
pub fn find_input_device(host: &cpal::Host, device_spec: &str) -> Result<Option<cpal::Device>> {
    if device_spec == "default" {
        return Ok(host.default_input_device());
    }

    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        if index >= devices.len() {
            tracing::warn!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            );
        }
        return Ok(devices.into_iter().nth(index));
    }

    Ok(devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|name| name == device_spec)))
}

/// Like [`find_input_device`], but a missing device is an error.
pub fn require_input_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    find_input_device(host, device_spec)?.ok_or_else(|| {
        anyhow!(
            "Audio input device '{device_spec}' not found. Use 'whistle list-devices' to see available devices."
        )
    })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
