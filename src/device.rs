//! Compute-device selection.

use clap::ValueEnum;
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider, ExecutionProviderDispatch,
};
use serde::Serialize;

/// Device selection as requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceRequest {
    Auto,
    Cpu,
    Cuda,
    Mps,
}

/// The concrete device a run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    Mps,
}

/// Accelerator availability, injectable so selection stays testable off the
/// actual hardware.
pub trait AcceleratorProbe {
    fn cuda_available(&self) -> bool;
    fn mps_available(&self) -> bool;
}

/// Probe backed by the ONNX Runtime execution providers.
pub struct OrtAcceleratorProbe;

impl AcceleratorProbe for OrtAcceleratorProbe {
    fn cuda_available(&self) -> bool {
        CUDAExecutionProvider::default()
            .is_available()
            .unwrap_or(false)
    }

    fn mps_available(&self) -> bool {
        CoreMLExecutionProvider::default()
            .is_available()
            .unwrap_or(false)
    }
}

/// Resolve a device request. Explicit choices pass through unmodified; `auto`
/// picks the first available of CUDA, Apple-silicon (CoreML), CPU.
pub fn resolve(requested: DeviceRequest, probe: &dyn AcceleratorProbe) -> Device {
    match requested {
        DeviceRequest::Cpu => Device::Cpu,
        DeviceRequest::Cuda => Device::Cuda,
        DeviceRequest::Mps => Device::Mps,
        DeviceRequest::Auto => {
            if probe.cuda_available() {
                Device::Cuda
            } else if probe.mps_available() {
                Device::Mps
            } else {
                Device::Cpu
            }
        }
    }
}

impl Device {
    /// Execution providers to register on the session for this device. CPU
    /// needs none; ort always keeps the CPU provider as the fallback.
    pub fn execution_providers(self) -> Vec<ExecutionProviderDispatch> {
        match self {
            Device::Cpu => Vec::new(),
            Device::Cuda => vec![CUDAExecutionProvider::default().build()],
            Device::Mps => vec![CoreMLExecutionProvider::default().build()],
        }
    }
}
