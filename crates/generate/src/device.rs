use bench_core::DeviceKind;
use std::path::Path;

/// Answers which compute devices the current host can use.
pub trait ComputeProbe {
    fn is_available(&self, device: DeviceKind) -> bool;
}

/// Pick the first preferred device the probe reports. CPU is always usable and
/// is the fallback when nothing in the list is available.
pub fn select_device(preferences: &[DeviceKind], probe: &impl ComputeProbe) -> DeviceKind {
    preferences
        .iter()
        .copied()
        .find(|&device| device == DeviceKind::Cpu || probe.is_available(device))
        .unwrap_or(DeviceKind::Cpu)
}

/// Probe backed by the running host.
pub struct SystemProbe;

impl ComputeProbe for SystemProbe {
    fn is_available(&self, device: DeviceKind) -> bool {
        match device {
            DeviceKind::Cuda => cuda_visible(),
            DeviceKind::Mps => cfg!(all(target_os = "macos", target_arch = "aarch64")),
            DeviceKind::Cpu => true,
        }
    }
}

fn cuda_visible() -> bool {
    // An explicit empty or -1 mask hides every GPU from the pipeline.
    if let Ok(mask) = std::env::var("CUDA_VISIBLE_DEVICES") {
        let mask = mask.trim();
        if mask.is_empty() || mask == "-1" {
            return false;
        }
    }
    Path::new("/dev/nvidiactl").exists() || Path::new("/dev/nvidia0").exists()
}
