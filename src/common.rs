use anyhow::{Context, Result};
#[cfg(feature = "online")]
use hf_hub::api::sync::ApiRepo;
use std::io::Read;
use std::{fs::File, path::PathBuf};
use tokenizers::{AddedToken, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

pub const DEFAULT_CACHE_DIR: &str = ".splade_golden_cache";

/// Sparse representation of one document embedding: parallel index/value
/// slices, plus token labels when label output was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
    pub labels: Vec<String>,
}

impl SparseVector {
    /// Check the parallel-slice invariants.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.indices.len() == self.values.len(),
            "sparse vector has mismatched indices/values lengths: indices={} values={}",
            self.indices.len(),
            self.values.len()
        );
        anyhow::ensure!(
            self.labels.is_empty() || self.labels.len() == self.indices.len(),
            "sparse vector has mismatched labels/indices lengths: labels={} indices={}",
            self.labels.len(),
            self.indices.len()
        );
        Ok(())
    }
}

/// Tokenizer files as raw bytes, from the hub or any other source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerFiles {
    pub tokenizer_file: Vec<u8>,
    pub config_file: Vec<u8>,
    pub special_tokens_map_file: Vec<u8>,
    pub tokenizer_config_file: Vec<u8>,
}

/// Fetch the tokenizer files from a hub repo and build the tokenizer.
#[cfg(feature = "online")]
pub fn load_tokenizer_hf_hub(model_repo: ApiRepo, sequence_length: usize) -> Result<Tokenizer> {
    let tokenizer_files = TokenizerFiles {
        tokenizer_file: read_file_to_bytes(&model_repo.get("tokenizer.json")?)?,
        config_file: read_file_to_bytes(&model_repo.get("config.json")?)?,
        special_tokens_map_file: read_file_to_bytes(&model_repo.get("special_tokens_map.json")?)?,
        tokenizer_config_file: read_file_to_bytes(&model_repo.get("tokenizer_config.json")?)?,
    };

    load_tokenizer(tokenizer_files, sequence_length)
}

/// Build a tokenizer that pads and truncates every encoding to exactly
/// `sequence_length`, so each batch comes out with a fixed shape.
pub fn load_tokenizer(tokenizer_files: TokenizerFiles, sequence_length: usize) -> Result<Tokenizer> {
    let config: serde_json::Value = serde_json::from_slice(&tokenizer_files.config_file)
        .context("Could not parse config.json")?;
    let special_tokens_map: serde_json::Value =
        serde_json::from_slice(&tokenizer_files.special_tokens_map_file)
            .context("Could not parse special_tokens_map.json")?;
    let tokenizer_config: serde_json::Value =
        serde_json::from_slice(&tokenizer_files.tokenizer_config_file)
            .context("Could not parse tokenizer_config.json")?;
    let mut tokenizer: tokenizers::Tokenizer =
        tokenizers::Tokenizer::from_bytes(tokenizer_files.tokenizer_file)
            .map_err(anyhow::Error::msg)?;

    // Some configs store a huge sentinel in model_max_length; it still fits in an f64.
    let model_max_length = tokenizer_config["model_max_length"]
        .as_f64()
        .context("Error reading model_max_length from tokenizer_config.json")?;
    let sequence_length = sequence_length.min(model_max_length as usize);
    let pad_id = config["pad_token_id"].as_u64().unwrap_or(0) as u32;
    let pad_token = tokenizer_config["pad_token"]
        .as_str()
        .context("Error reading pad_token from tokenizer_config.json")?
        .into();

    let mut tokenizer = tokenizer
        .with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(sequence_length),
            pad_token,
            pad_id,
            ..Default::default()
        }))
        .with_truncation(Some(TruncationParams {
            max_length: sequence_length,
            ..Default::default()
        }))
        .map_err(anyhow::Error::msg)?
        .clone();
    if let serde_json::Value::Object(root_object) = special_tokens_map {
        for (_, value) in root_object.iter() {
            if value.is_string() {
                tokenizer.add_special_tokens(&[AddedToken {
                    content: value.as_str().unwrap().into(),
                    special: true,
                    ..Default::default()
                }]);
            } else if value.is_object() {
                tokenizer.add_special_tokens(&[AddedToken {
                    content: value["content"].as_str().unwrap_or_default().into(),
                    special: true,
                    single_word: value["single_word"].as_bool().unwrap_or(false),
                    lstrip: value["lstrip"].as_bool().unwrap_or(false),
                    rstrip: value["rstrip"].as_bool().unwrap_or(false),
                    normalized: value["normalized"].as_bool().unwrap_or(false),
                }]);
            }
        }
    }
    Ok(tokenizer.into())
}

/// Read a local file into memory.
pub fn read_file_to_bytes(file: &PathBuf) -> Result<Vec<u8>> {
    let mut file = File::open(file)?;
    let file_size = file.metadata()?.len() as usize;
    let mut buffer = Vec::with_capacity(file_size);
    file.read_to_end(&mut buffer)?;
    Ok(buffer)
}
