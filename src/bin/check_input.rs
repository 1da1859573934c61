use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use std::fs;
use std::path::PathBuf;
use zkp_merkle_membership::{FieldElement, PoseidonHasher, WitnessInput};

/// Default maximum size for a witness input file (1MB).
const DEFAULT_MAX_INPUT_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable overriding the witness input size limit, in bytes.
const MAX_INPUT_FILE_SIZE_ENV: &str = "MERKLE_MAX_INPUT_FILE_SIZE";

fn get_max_input_file_size() -> u64 {
    std::env::var(MAX_INPUT_FILE_SIZE_ENV)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_INPUT_FILE_SIZE)
}

/// Check a witness input: the secret's leaf must hash up its path to rootExpected.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    input_file: PathBuf,

    /// Decimal root the input must commit to
    #[arg(short, long, conflicts_with = "root_file")]
    root: Option<String>,

    /// File holding the decimal root the input must commit to
    #[arg(long)]
    root_file: Option<PathBuf>,
}

fn expected_root(args: &Args) -> Result<Option<FieldElement>> {
    let raw = match (&args.root, &args.root_file) {
        (Some(root), _) => root.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read root file: {}", path.display()))?,
        (None, None) => return Ok(None),
    };

    FieldElement::from_decimal_str(&raw)
        .map(Some)
        .context("Expected root is not a canonical decimal field element")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Loading witness input from: {}", args.input_file.display());
    let metadata = fs::metadata(&args.input_file).with_context(|| {
        format!(
            "Failed to read input file metadata: {}",
            args.input_file.display()
        )
    })?;
    let max_size = get_max_input_file_size();
    if metadata.len() > max_size {
        return Err(anyhow::anyhow!(
            "Input file too large: {} bytes (max {} bytes)",
            metadata.len(),
            max_size
        ));
    }

    let content = fs::read_to_string(&args.input_file).context("Failed to read input file")?;
    let input: WitnessInput =
        serde_json::from_str(&content).context("Failed to parse witness input JSON")?;
    debug!(
        "Input: depth={}, rootExpected={}, context={}",
        input.path_elements.len(),
        input.root_expected,
        input.context
    );

    let hasher = PoseidonHasher::new().context("Failed to initialize Poseidon")?;

    if let Err(e) = input.validate(&hasher) {
        error!("Witness input check FAILED: {e:#}");
        println!("\n✗ Witness input check FAILED!");
        return Err(e.context("Witness input check failed"));
    }

    if let Some(expected) = expected_root(&args)? {
        let claimed = input.parse_root()?;
        if claimed != expected {
            error!("Root mismatch: input commits to {claimed}, expected {expected}");
            println!("\n✗ Witness input check FAILED!");
            return Err(anyhow::anyhow!(
                "Witness input commits to root {claimed}, but the expected root is {expected}"
            ));
        }
    }

    let proof = input.to_proof()?;
    info!("Witness input check PASSED");
    println!("\n✓ Witness input check PASSED!");
    println!("  Root: {}", input.root_expected);
    println!("  Depth: {}", proof.depth());
    println!("  Leaf index: {}", proof.leaf_index);
    println!("  Context: {}", input.context);

    Ok(())
}
