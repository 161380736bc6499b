pub(crate) const DEFAULT_SEQUENCE_LENGTH: usize = 256;
pub(crate) const DEFAULT_TOP_K: usize = 24;

#[cfg(feature = "online")]
const ONNX_FILE: &str = "model.onnx";
#[cfg(feature = "online")]
const ONNX_FALLBACK_FILE: &str = "model_optimized.onnx";

mod init;
pub use init::*;

mod r#impl;

pub mod reduce;
