//! Device selection for inference.

use candle_core::Device;
use tracing::info;

/// Probes for an attachable accelerator device.
///
/// Returns `None` when no accelerator feature is compiled in or the
/// runtime attach fails — the caller then stays on CPU. A failed probe is
/// an expected outcome on unsupported hosts, not an error.
#[must_use]
pub fn accelerator_device() -> Option<Device> {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Metal accelerator attached");
            return Some(device);
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("CUDA accelerator attached");
            return Some(device);
        }
    }

    None
}

/// Whether the runtime compatibility check reports an accelerator.
#[must_use]
pub fn accelerator_available() -> bool {
    accelerator_device().is_some()
}

/// Best available device: accelerator when present, CPU otherwise.
#[must_use]
pub fn best_device() -> Device {
    accelerator_device().unwrap_or_else(|| {
        info!("Using CPU for inference");
        Device::Cpu
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_device_never_panics() {
        let _device = best_device();
    }

    #[test]
    fn test_probe_matches_availability() {
        assert_eq!(accelerator_device().is_some(), accelerator_available());
    }
}
