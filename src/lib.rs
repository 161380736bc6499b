//! splade-golden - generator for SPLADE sparse-vector golden fixtures.
//!
//! The crate runs a SPLADE-style masked-language-model (as an ONNX graph) over
//! a corpus of texts, reduces the dense logits to pruned top-k sparse rows,
//! and persists the rows as newline-delimited JSON together with a metadata
//! descriptor carrying the generation settings and a SHA-256 digest of the
//! output. The resulting files are meant to be checked in as regression
//! fixtures for a sparse-embedding inference endpoint.
//!
//! ### Generating fixtures
//! ```
//! use std::path::Path;
//! use splade_golden::{corpus, golden, OnnxSpladeEncoder, SpladeInitOptions};
//!
//! # fn generate_demo() -> anyhow::Result<()> {
//! let texts = corpus::load_texts(&["the cat sat".to_string()], None)?;
//!
//! let encoder = OnnxSpladeEncoder::try_new(
//!     SpladeInitOptions::new("Qdrant/Splade_PP_en_v1")
//!         .with_top_k(24)
//!         .with_labels(true),
//! )?;
//!
//! let rows = golden::generate_rows(&encoder, &texts, 8)?;
//! golden::writer::write_jsonl(Path::new("fixtures/golden.jsonl"), &rows)?;
//! # Ok(())
//! # }
//! ```
//!
//! The dense-to-sparse reduction is pure and sits behind the
//! [`BatchTokenizer`] and [`MaskedLm`] seams, so the whole pipeline can be
//! exercised in tests with stub implementations and no model weights.

pub mod common;
pub mod corpus;
pub mod device;
pub mod encoder;
pub mod golden;
pub mod inference;

pub use common::{SparseVector, TokenizerFiles, DEFAULT_CACHE_DIR};
pub use device::{AcceleratorProbe, Device, DeviceRequest, OrtAcceleratorProbe};
pub use encoder::{OnnxSpladeEncoder, SpladeEncoder, SpladeInitOptions};
pub use golden::{GenerationSettings, GoldenRow, RunMetadata};
pub use inference::{BatchTokenizer, HfBatchTokenizer, MaskedLm, OrtMaskedLm, TokenizedBatch};
