use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;
use zkp_merkle_membership::{
    config::Config,
    utils::{read_secrets_file, write_artifact},
    FieldElement, FieldHasher, MerkleTree, PoseidonHasher, WitnessInput,
};

/// Build the Merkle tree over a secrets file and write the witness input for one member.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File with one decimal secret per line
    #[arg(short, long)]
    secrets_file: PathBuf,

    /// Position of the proving member in the secrets file (0-based)
    #[arg(short, long)]
    member_index: usize,

    /// Tree depth (overrides config)
    #[arg(short, long)]
    depth: Option<usize>,

    /// Decimal context value bound into the nullifier (overrides config)
    #[arg(long)]
    context: Option<String>,

    /// Directory for input.json, root.txt and context.txt (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(depth) = args.depth {
        config.tree.depth = depth;
    }
    if let Some(context) = args.context {
        config.input.context = context;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    debug!("Effective config: {:?}", config);

    let context = FieldElement::from_decimal_str(&config.input.context)
        .context("Context must be a canonical decimal field element")?;

    info!("Loading secrets from: {}", args.secrets_file.display());
    let secrets = read_secrets_file(
        &args.secrets_file,
        config.tree.effective_max_secrets_file_size(),
    )?;
    println!(
        "Loaded {} secrets from {}",
        secrets.len(),
        args.secrets_file.display()
    );

    let secret = *secrets.get(args.member_index).with_context(|| {
        format!(
            "Member index {} not found: secrets file '{}' holds {} members",
            args.member_index,
            args.secrets_file.display(),
            secrets.len()
        )
    })?;

    let hasher = PoseidonHasher::new().context("Failed to initialize Poseidon")?;

    println!("Building Merkle tree (depth {})...", config.tree.depth);
    let tree = MerkleTree::build(&hasher, &secrets, config.tree.depth)
        .context("Failed to build Merkle tree")?;
    println!("Merkle root: {}", tree.root());

    println!("Extracting Merkle proof for member {}...", args.member_index);
    let proof = tree
        .generate_proof(args.member_index)
        .context("Failed to generate Merkle proof")?;
    debug!("{proof}");

    if !tree.verify_proof(&hasher, hasher.hash_leaf(secret), &proof) {
        return Err(anyhow::anyhow!(
            "Extracted proof does not verify against the tree root"
        ));
    }

    let input = WitnessInput::from_proof(secret, &proof, context);
    input
        .validate(&hasher)
        .context("Generated witness input failed validation")?;

    let input_path = config.output.input_path();
    let json = serde_json::to_string_pretty(&input).context("Failed to serialize witness input")?;
    write_artifact(&input_path, &json)?;
    write_artifact(&config.output.root_path(), &tree.root().to_decimal_string())?;
    write_artifact(&config.output.context_path(), &context.to_decimal_string())?;

    info!("Wrote witness input to {}", input_path.display());
    println!("Witness input written to: {}", input_path.display());
    println!("Root: {}", input.root_expected);
    println!("Context: {}", input.context);

    Ok(())
}
