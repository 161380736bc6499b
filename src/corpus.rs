//! Corpus loading and batching.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Gather the input corpus: inline texts first, then the non-empty,
/// whitespace-trimmed lines of `texts_file` in file order.
pub fn load_texts(inline_texts: &[String], texts_file: Option<&Path>) -> Result<Vec<String>> {
    let mut texts: Vec<String> = inline_texts.to_vec();
    if let Some(path) = texts_file {
        let file = File::open(path)
            .with_context(|| format!("Failed to open texts file {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let text = line.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
    }
    Ok(texts)
}

/// Contiguous batches of at most `batch_size` items, in order, trailing
/// partial batch included. `batch_size` must be positive.
pub fn batched<T>(items: &[T], batch_size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(batch_size)
}
