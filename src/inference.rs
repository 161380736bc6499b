//! The two seams the pipeline depends on: a batch tokenizer producing
//! fixed-shape id/mask tensors, and a masked-language-model producing
//! per-token vocabulary logits. Any compliant implementation (real model,
//! test stub) satisfies them.

use anyhow::Result;
use ndarray::{Array, Array2, Array3, Ix3};
use ort::{session::Session, value::Value};
use tokenizers::Tokenizer;

/// One tokenized batch, shaped `[batch, sequence_length]`.
#[derive(Debug, Clone)]
pub struct TokenizedBatch {
    pub input_ids: Array2<i64>,
    pub attention_mask: Array2<i64>,
    pub token_type_ids: Array2<i64>,
}

/// Tokenizes a batch of texts into fixed-shape tensors and maps vocabulary
/// indices back to human-readable token strings.
pub trait BatchTokenizer {
    fn encode(&self, texts: &[&str]) -> Result<TokenizedBatch>;

    /// Human-readable token for a vocabulary dimension.
    fn token_label(&self, index: usize) -> String;
}

/// Runs the model forward pass, yielding `[batch, sequence_length, vocab]`
/// logits.
pub trait MaskedLm {
    fn forward(&self, batch: &TokenizedBatch) -> Result<Array3<f32>>;
}

/// [`BatchTokenizer`] over a Hugging Face `tokenizers::Tokenizer` configured
/// with fixed-length padding and truncation.
pub struct HfBatchTokenizer {
    tokenizer: Tokenizer,
}

impl HfBatchTokenizer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }
}

impl BatchTokenizer for HfBatchTokenizer {
    fn encode(&self, texts: &[&str]) -> Result<TokenizedBatch> {
        anyhow::ensure!(!texts.is_empty(), "cannot tokenize an empty batch");
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(anyhow::Error::msg)?;

        // Fixed padding makes every encoding the same length.
        let encoding_length = encodings[0].len();
        let batch_size = encodings.len();
        let max_size = encoding_length * batch_size;

        let mut ids_array = Vec::with_capacity(max_size);
        let mut mask_array = Vec::with_capacity(max_size);
        let mut typeids_array = Vec::with_capacity(max_size);

        encodings.iter().for_each(|encoding| {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let typeids = encoding.get_type_ids();

            ids_array.extend(ids.iter().map(|x| *x as i64));
            mask_array.extend(mask.iter().map(|x| *x as i64));
            typeids_array.extend(typeids.iter().map(|x| *x as i64));
        });

        Ok(TokenizedBatch {
            input_ids: Array::from_shape_vec((batch_size, encoding_length), ids_array)?,
            attention_mask: Array::from_shape_vec((batch_size, encoding_length), mask_array)?,
            token_type_ids: Array::from_shape_vec((batch_size, encoding_length), typeids_array)?,
        })
    }

    fn token_label(&self, index: usize) -> String {
        self.tokenizer
            .id_to_token(index as u32)
            .unwrap_or_default()
    }
}

/// [`MaskedLm`] over an ONNX Runtime session.
pub struct OrtMaskedLm {
    session: Session,
    need_token_type_ids: bool,
}

impl OrtMaskedLm {
    pub fn new(session: Session) -> Self {
        let need_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");
        Self {
            session,
            need_token_type_ids,
        }
    }
}

impl MaskedLm for OrtMaskedLm {
    fn forward(&self, batch: &TokenizedBatch) -> Result<Array3<f32>> {
        let mut session_inputs = ort::inputs![
            "input_ids" => Value::from_array(batch.input_ids.clone())?,
            "attention_mask" => Value::from_array(batch.attention_mask.clone())?,
        ]?;

        if self.need_token_type_ids {
            session_inputs.push((
                "token_type_ids".into(),
                Value::from_array(batch.token_type_ids.clone())?.into(),
            ));
        }

        let outputs = self.session.run(session_inputs)?;

        // Single-output graphs use whatever name they carry; multi-output
        // MLM exports name the logits tensor "logits".
        let logits_key = match outputs.len() {
            1 => outputs.keys().next().unwrap(),
            _ => "logits",
        };

        let output_data = outputs[logits_key].try_extract_tensor::<f32>()?;
        Ok(output_data.to_owned().into_dimensionality::<Ix3>()?)
    }
}
