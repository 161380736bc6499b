use ort::execution_providers::ExecutionProviderDispatch;
use std::path::{Path, PathBuf};

use crate::common::DEFAULT_CACHE_DIR;
use crate::inference::{HfBatchTokenizer, OrtMaskedLm};

use super::{DEFAULT_SEQUENCE_LENGTH, DEFAULT_TOP_K};

/// Options for initializing a [`SpladeEncoder`] from a hub model repo.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SpladeInitOptions {
    pub model_name: String,
    pub execution_providers: Vec<ExecutionProviderDispatch>,
    pub cache_dir: PathBuf,
    pub show_download_progress: bool,
    pub hf_token: Option<String>,
    pub sequence_length: usize,
    pub top_k: usize,
    pub prune_threshold: f32,
    pub with_labels: bool,
}

impl SpladeInitOptions {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            execution_providers: Default::default(),
            cache_dir: Path::new(DEFAULT_CACHE_DIR).to_path_buf(),
            show_download_progress: true,
            hf_token: None,
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            top_k: DEFAULT_TOP_K,
            prune_threshold: 0.0,
            with_labels: false,
        }
    }

    /// Set the execution providers registered on the session.
    pub fn with_execution_providers(
        mut self,
        execution_providers: Vec<ExecutionProviderDispatch>,
    ) -> Self {
        self.execution_providers = execution_providers;
        self
    }

    /// Set the cache directory for the model files.
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Set whether to show download progress.
    pub fn with_show_download_progress(mut self, show_download_progress: bool) -> Self {
        self.show_download_progress = show_download_progress;
        self
    }

    /// Set the hub access token for private model repos.
    pub fn with_hf_token(mut self, hf_token: Option<String>) -> Self {
        self.hf_token = hf_token;
        self
    }

    /// Set the tokenizer truncation/padding length.
    pub fn with_sequence_length(mut self, sequence_length: usize) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    /// Set the maximum sparse dimensions kept per row; 0 means unbounded.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the pruning cutoff; dimensions with values <= threshold are dropped.
    pub fn with_prune_threshold(mut self, prune_threshold: f32) -> Self {
        self.prune_threshold = prune_threshold;
        self
    }

    /// Set whether rows carry human-readable token labels.
    pub fn with_labels(mut self, with_labels: bool) -> Self {
        self.with_labels = with_labels;
        self
    }
}

/// Converts batches of texts into one [`SparseVector`](crate::SparseVector)
/// per text, via the masked-language-model behind the [`MaskedLm`] seam.
///
/// [`MaskedLm`]: crate::MaskedLm
pub struct SpladeEncoder<T, M> {
    pub(crate) tokenizer: T,
    pub(crate) model: M,
    pub(crate) top_k: usize,
    pub(crate) prune_threshold: f32,
    pub(crate) with_labels: bool,
}

/// The encoder as the binary runs it: Hugging Face tokenizer, ONNX session.
pub type OnnxSpladeEncoder = SpladeEncoder<HfBatchTokenizer, OrtMaskedLm>;
