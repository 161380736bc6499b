//! Golden row assembly, run metadata, and the batch pipeline driver.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::common::SparseVector;
use crate::corpus;
use crate::device::Device;
use crate::encoder::SpladeEncoder;
use crate::inference::{BatchTokenizer, MaskedLm};

pub mod writer;

/// Fixed identity string recorded in the metadata descriptor.
pub const GENERATOR: &str = "local:splade-golden";

const SOURCE_TYPE: &str = "local_onnx";
const RESPONSE_SHAPE: &str = "vectors[{indices,values,labels}]";

/// One persisted fixture row; the JSONL unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoldenRow {
    pub id: String,
    pub text: String,
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
    pub labels: Vec<String>,
}

/// The settings a run was generated with, persisted in the metadata
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationSettings {
    pub sequence_length: usize,
    pub batch_size: usize,
    pub top_k: usize,
    pub prune_threshold: f32,
    pub with_labels: bool,
    pub device: Device,
}

/// Provenance record written once per run, after all rows.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub generated_at_utc: String,
    pub generator: String,
    pub source_type: String,
    pub model_repo: String,
    pub row_count: usize,
    pub dataset_digest_sha256: String,
    pub settings: GenerationSettings,
    pub request_payload: serde_json::Value,
    pub response_shape: String,
}

impl RunMetadata {
    pub fn new(
        model_repo: impl Into<String>,
        row_count: usize,
        dataset_digest_sha256: impl Into<String>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            generated_at_utc: Utc::now().to_rfc3339(),
            generator: GENERATOR.to_string(),
            source_type: SOURCE_TYPE.to_string(),
            model_repo: model_repo.into(),
            row_count,
            dataset_digest_sha256: dataset_digest_sha256.into(),
            settings,
            request_payload: serde_json::json!({ "texts": "batch_of_strings" }),
            response_shape: RESPONSE_SHAPE.to_string(),
        }
    }
}

/// Attach sequential ids and the original texts to one batch of sparse
/// vectors. Ids are `s{n}`, 1-based and global across the run;
/// `assigned_so_far` is the number of rows assembled by earlier batches.
pub fn assemble_rows(
    batch: &[String],
    vectors: Vec<SparseVector>,
    assigned_so_far: usize,
) -> Vec<GoldenRow> {
    batch
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(offset, (text, vector))| GoldenRow {
            id: format!("s{}", assigned_so_far + offset + 1),
            text: text.clone(),
            indices: vector.indices,
            values: vector.values,
            labels: vector.labels,
        })
        .collect()
}

/// Run the whole corpus through the encoder, one batch at a time, and
/// assemble the ordered golden rows. Progress goes to stderr.
pub fn generate_rows<T, M>(
    encoder: &SpladeEncoder<T, M>,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<GoldenRow>>
where
    T: BatchTokenizer + Sync,
    M: MaskedLm,
{
    let mut rows: Vec<GoldenRow> = Vec::with_capacity(texts.len());
    for (batch_no, batch) in corpus::batched(texts, batch_size).enumerate() {
        eprintln!("Encoding batch {} ({} docs)", batch_no + 1, batch.len());
        let vectors = encoder.encode(batch)?;
        for vector in &vectors {
            vector.validate()?;
        }
        rows.extend(assemble_rows(batch, vectors, rows.len()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(indices: Vec<usize>) -> SparseVector {
        let values = indices.iter().map(|&i| i as f32 * 0.1).collect();
        SparseVector {
            indices,
            values,
            labels: Vec::new(),
        }
    }

    #[test]
    fn ids_continue_across_batches() {
        let batch = vec!["a".to_string(), "b".to_string()];
        let rows = assemble_rows(&batch, vec![vector(vec![1]), vector(vec![2])], 3);
        assert_eq!(rows[0].id, "s4");
        assert_eq!(rows[1].id, "s5");
        assert_eq!(rows[0].text, "a");
        assert_eq!(rows[1].text, "b");
    }

    #[test]
    fn first_row_of_a_run_is_s1() {
        let batch = vec!["doc".to_string()];
        let rows = assemble_rows(&batch, vec![vector(vec![7, 9])], 0);
        assert_eq!(rows[0].id, "s1");
        assert_eq!(rows[0].indices, vec![7, 9]);
    }

    #[test]
    fn metadata_carries_identity_and_settings() {
        let settings = GenerationSettings {
            sequence_length: 256,
            batch_size: 8,
            top_k: 24,
            prune_threshold: 0.0,
            with_labels: false,
            device: Device::Cpu,
        };
        let metadata = RunMetadata::new("Qdrant/Splade_PP_en_v1", 3, "abc123", settings);
        assert_eq!(metadata.generator, GENERATOR);
        assert_eq!(metadata.row_count, 3);
        assert_eq!(metadata.dataset_digest_sha256, "abc123");
        assert_eq!(metadata.settings, settings);
        // RFC 3339 timestamps keep their UTC offset.
        assert!(metadata.generated_at_utc.contains('T'));
    }
}
