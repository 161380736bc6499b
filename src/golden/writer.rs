//! Serialization of golden rows and the metadata descriptor.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::{GoldenRow, RunMetadata};

/// Write rows as newline-delimited JSON: one compact object per line, UTF-8,
/// trailing newline after the final line. Parent directories are created as
/// needed.
pub fn write_jsonl(path: &Path, rows: &[GoldenRow]) -> Result<()> {
    create_parent_dirs(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSONL file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// SHA-256 over the exact bytes of a file, streamed in 64 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the metadata descriptor as pretty-printed JSON with a trailing
/// newline.
pub fn write_metadata(path: &Path, metadata: &RunMetadata) -> Result<()> {
    create_parent_dirs(path)?;
    let mut document = serde_json::to_string_pretty(metadata)?;
    document.push('\n');
    fs::write(path, document)
        .with_context(|| format!("Failed to write metadata file {}", path.display()))?;
    Ok(())
}

fn create_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::golden::GenerationSettings;

    fn sample_rows() -> Vec<GoldenRow> {
        vec![
            GoldenRow {
                id: "s1".to_string(),
                text: "the cat sat".to_string(),
                indices: vec![1012, 2138],
                values: vec![0.91, 0.44],
                labels: vec!["cat".to_string(), "sat".to_string()],
            },
            GoldenRow {
                id: "s2".to_string(),
                text: "naïve café".to_string(),
                indices: vec![7],
                values: vec![0.5],
                labels: Vec::new(),
            },
        ]
    }

    fn sample_settings() -> GenerationSettings {
        GenerationSettings {
            sequence_length: 256,
            batch_size: 8,
            top_k: 24,
            prune_threshold: 0.0,
            with_labels: true,
            device: Device::Cpu,
        }
    }

    #[test]
    fn jsonl_is_one_compact_object_per_line_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("golden.jsonl");
        write_jsonl(&path, &sample_rows()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with('\n'));
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"id":"s1","text":"the cat sat","indices":[1012,2138],"values":[0.91,0.44],"labels":["cat","sat"]}"#
        );
        // Non-ASCII text is written as UTF-8, not escaped.
        assert!(lines[1].contains("naïve café"));
    }

    #[test]
    fn jsonl_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1").join("nested").join("golden.jsonl");
        write_jsonl(&path, &sample_rows()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn digest_matches_file_bytes_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jsonl");
        let second = dir.path().join("b.jsonl");
        write_jsonl(&first, &sample_rows()).unwrap();
        write_jsonl(&second, &sample_rows()).unwrap();

        let digest = sha256_file(&first).unwrap();
        assert_eq!(digest, sha256_file(&second).unwrap());
        assert_eq!(digest.len(), 64);

        let expected = format!("{:x}", Sha256::digest(fs::read(&first).unwrap()));
        assert_eq!(digest, expected);
    }

    #[test]
    fn metadata_is_pretty_printed_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.json");
        let metadata = RunMetadata::new("Qdrant/Splade_PP_en_v1", 2, "deadbeef", sample_settings());
        write_metadata(&path, &metadata).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("}\n"));
        assert!(contents.contains("  \"generator\": \"local:splade-golden\""));

        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["row_count"], 2);
        assert_eq!(parsed["dataset_digest_sha256"], "deadbeef");
        assert_eq!(parsed["model_repo"], "Qdrant/Splade_PP_en_v1");
        assert_eq!(parsed["settings"]["device"], "cpu");
        assert_eq!(parsed["settings"]["top_k"], 24);
        assert_eq!(parsed["response_shape"], "vectors[{indices,values,labels}]");
    }
}
