#[cfg(feature = "online")]
use anyhow::Context;
use anyhow::Result;
#[cfg(feature = "online")]
use hf_hub::{
    api::sync::{ApiBuilder, ApiRepo},
    Cache,
};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
#[cfg(feature = "online")]
use std::path::PathBuf;
#[cfg(feature = "online")]
use std::thread::available_parallelism;

#[cfg(feature = "online")]
use crate::common::load_tokenizer_hf_hub;
use crate::common::SparseVector;
use crate::inference::{BatchTokenizer, MaskedLm};

use super::reduce;
use super::SpladeEncoder;
#[cfg(feature = "online")]
use super::{OnnxSpladeEncoder, SpladeInitOptions, ONNX_FALLBACK_FILE, ONNX_FILE};

#[cfg(feature = "online")]
impl OnnxSpladeEncoder {
    /// Try to build an encoder from a hub model repo.
    ///
    /// Uses the highest level of graph optimization and the total number of
    /// CPUs available as the number of intra-threads.
    pub fn try_new(options: SpladeInitOptions) -> Result<Self> {
        use crate::inference::{HfBatchTokenizer, OrtMaskedLm};
        use ort::session::{builder::GraphOptimizationLevel, Session};

        let SpladeInitOptions {
            model_name,
            execution_providers,
            cache_dir,
            show_download_progress,
            hf_token,
            sequence_length,
            top_k,
            prune_threshold,
            with_labels,
        } = options;

        let threads = available_parallelism()?.get();

        let model_repo =
            Self::retrieve_model(&model_name, cache_dir, show_download_progress, hf_token)?;

        let model_file = model_repo
            .get(ONNX_FILE)
            .or_else(|_| model_repo.get(ONNX_FALLBACK_FILE))
            .with_context(|| format!("Failed to retrieve an ONNX export from {model_name}"))?;

        let session = Session::builder()?
            .with_execution_providers(execution_providers)?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(model_file)?;

        let tokenizer = load_tokenizer_hf_hub(model_repo, sequence_length)?;
        Ok(SpladeEncoder::from_parts(
            HfBatchTokenizer::new(tokenizer),
            OrtMaskedLm::new(session),
            top_k,
            prune_threshold,
            with_labels,
        ))
    }

    /// Return the model's hub repo, from cache or remote retrieval.
    fn retrieve_model(
        model_name: &str,
        cache_dir: PathBuf,
        show_download_progress: bool,
        hf_token: Option<String>,
    ) -> Result<ApiRepo> {
        let cache = Cache::new(cache_dir);
        let api = ApiBuilder::from_cache(cache)
            .with_progress(show_download_progress)
            .with_token(hf_token)
            .build()?;

        Ok(api.model(model_name.to_string()))
    }
}

impl<T, M> SpladeEncoder<T, M>
where
    T: BatchTokenizer + Sync,
    M: MaskedLm,
{
    /// Build an encoder from pre-constructed parts. This is also the seam
    /// tests use to inject stub tokenizer/model implementations.
    pub fn from_parts(
        tokenizer: T,
        model: M,
        top_k: usize,
        prune_threshold: f32,
        with_labels: bool,
    ) -> Self {
        Self {
            tokenizer,
            model,
            top_k,
            prune_threshold,
            with_labels,
        }
    }

    /// Encode one batch of texts into sparse vectors, in input order.
    // Generic type to accept String, &str
    pub fn encode<S: AsRef<str>>(&self, batch: &[S]) -> Result<Vec<SparseVector>> {
        let inputs: Vec<&str> = batch.iter().map(|text| text.as_ref()).collect();
        let encoded = self.tokenizer.encode(&inputs)?;
        let logits = self.model.forward(&encoded)?;
        let scores = reduce::dense_scores(&logits, &encoded.attention_mask);

        let tokenizer = &self.tokenizer;
        let (top_k, prune_threshold, with_labels) =
            (self.top_k, self.prune_threshold, self.with_labels);

        // Indexed fan-out keeps the output aligned with the input order.
        let vectors = (0..scores.nrows())
            .into_par_iter()
            .map(|doc| {
                let (indices, values) = reduce::prune_row(scores.row(doc), top_k, prune_threshold);
                let labels = if with_labels && !indices.is_empty() {
                    indices
                        .iter()
                        .map(|&index| tokenizer.token_label(index))
                        .collect()
                } else {
                    Vec::new()
                };
                SparseVector {
                    indices,
                    values,
                    labels,
                }
            })
            .collect();

        Ok(vectors)
    }
}
