use std::env;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Result;
use clap::Parser;

use splade_golden::{
    corpus, device, golden,
    golden::writer,
    DeviceRequest, GenerationSettings, OnnxSpladeEncoder, OrtAcceleratorProbe, RunMetadata,
    SpladeInitOptions,
};

#[derive(Parser, Debug)]
#[command(name = "splade-golden")]
#[command(about = "Generate SPLADE sparse vectors locally and write golden JSONL output.")]
struct Args {
    /// Input text (can be passed multiple times).
    #[arg(long = "text")]
    text: Vec<String>,

    /// Path to a text file with one document per line.
    #[arg(long)]
    texts_file: Option<PathBuf>,

    /// Destination JSONL file for rows {id,text,indices,values,labels}.
    #[arg(long)]
    output_jsonl: PathBuf,

    /// Destination metadata.json path (default: alongside --output-jsonl).
    #[arg(long)]
    metadata_path: Option<PathBuf>,

    /// Hugging Face model repo id carrying a SPLADE ONNX export.
    #[arg(long, default_value = "Qdrant/Splade_PP_en_v1")]
    model_name: String,

    /// Tokenizer truncation/padding length.
    #[arg(long, default_value_t = 256)]
    sequence_length: usize,

    /// Batch size for local inference.
    #[arg(long, default_value_t = 8)]
    batch_size: usize,

    /// Max sparse dimensions per row (0 means unbounded).
    #[arg(long, default_value_t = 24)]
    top_k: usize,

    /// Drop dimensions where value <= threshold.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    prune_threshold: f32,

    /// Include token labels in JSONL rows.
    #[arg(long)]
    with_labels: bool,

    /// Compute device.
    #[arg(long, value_enum, default_value = "auto")]
    device: DeviceRequest,

    /// Environment variable containing the Hugging Face token.
    #[arg(long, default_value = "HF_TOKEN")]
    hf_token_env: String,
}

impl Args {
    fn validate(&self, texts: &[String]) -> Result<(), String> {
        if texts.is_empty() {
            return Err(
                "provide at least one --text or a --texts-file with non-empty lines".to_string(),
            );
        }
        if self.sequence_length == 0 {
            return Err("--sequence-length must be > 0".to_string());
        }
        if self.batch_size == 0 {
            return Err("--batch-size must be > 0".to_string());
        }
        if self.prune_threshold < 0.0 {
            return Err("--prune-threshold must be >= 0".to_string());
        }
        Ok(())
    }
}

fn main() {
    let args = Args::parse();

    let texts = match corpus::load_texts(&args.text, args.texts_file.as_deref()) {
        Ok(texts) => texts,
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    };

    if let Err(message) = args.validate(&texts) {
        eprintln!("error: {message}");
        process::exit(2);
    }

    if let Err(err) = run(args, texts) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run(args: Args, texts: Vec<String>) -> Result<()> {
    let device = device::resolve(args.device, &OrtAcceleratorProbe);
    let hf_token = env::var(&args.hf_token_env)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    eprintln!("Loading tokenizer/model: {}", args.model_name);
    let encoder = OnnxSpladeEncoder::try_new(
        SpladeInitOptions::new(args.model_name.clone())
            .with_sequence_length(args.sequence_length)
            .with_top_k(args.top_k)
            .with_prune_threshold(args.prune_threshold)
            .with_labels(args.with_labels)
            .with_hf_token(hf_token)
            .with_execution_providers(device.execution_providers()),
    )?;

    let rows = golden::generate_rows(&encoder, &texts, args.batch_size)?;

    writer::write_jsonl(&args.output_jsonl, &rows)?;
    let digest = writer::sha256_file(&args.output_jsonl)?;

    let metadata_path = args.metadata_path.clone().unwrap_or_else(|| {
        args.output_jsonl
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
            .join("metadata.json")
    });

    let settings = GenerationSettings {
        sequence_length: args.sequence_length,
        batch_size: args.batch_size,
        top_k: args.top_k,
        prune_threshold: args.prune_threshold,
        with_labels: args.with_labels,
        device,
    };
    let metadata = RunMetadata::new(args.model_name.as_str(), rows.len(), digest.clone(), settings);
    writer::write_metadata(&metadata_path, &metadata)?;

    eprintln!("Wrote JSONL: {}", args.output_jsonl.display());
    eprintln!("Wrote metadata: {}", metadata_path.display());
    eprintln!("Digest (SHA-256): {digest}");
    Ok(())
}
