//! Configuration file support for the witness-input tooling.
//!
//! Settings are read from TOML. Every section and key is optional; missing
//! values fall back to the defaults below, and command-line flags override
//! whatever the file says.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TREE_DEPTH: usize = 4;
const DEFAULT_MAX_SECRETS_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_CONTEXT: &str = "12345";

/// Environment variable overriding `tree.max_secrets_file_size`.
pub const MAX_SECRETS_FILE_SIZE_ENV: &str = "MERKLE_MAX_SECRETS_FILE_SIZE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_tree_depth")]
    pub depth: usize,
    #[serde(default = "default_max_secrets_file_size")]
    pub max_secrets_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Decimal context value bound into the circuit's nullifier.
    #[serde(default = "default_context")]
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_input_file")]
    pub input_file: String,
    #[serde(default = "default_root_file")]
    pub root_file: String,
    #[serde(default = "default_context_file")]
    pub context_file: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_TREE_DEPTH,
            max_secrets_file_size: DEFAULT_MAX_SECRETS_FILE_SIZE,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            context: default_context(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            input_file: default_input_file(),
            root_file: default_root_file(),
            context_file: default_context_file(),
        }
    }
}

fn default_tree_depth() -> usize {
    DEFAULT_TREE_DEPTH
}

fn default_max_secrets_file_size() -> u64 {
    DEFAULT_MAX_SECRETS_FILE_SIZE
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_input_file() -> String {
    "input.json".to_string()
}

fn default_root_file() -> String {
    "root.txt".to_string()
}

fn default_context_file() -> String {
    "context.txt".to_string()
}

impl TreeConfig {
    /// File size limit, honouring [`MAX_SECRETS_FILE_SIZE_ENV`] when set.
    pub fn effective_max_secrets_file_size(&self) -> u64 {
        std::env::var(MAX_SECRETS_FILE_SIZE_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.max_secrets_file_size)
    }
}

impl OutputConfig {
    pub fn input_path(&self) -> PathBuf {
        self.dir.join(&self.input_file)
    }

    pub fn root_path(&self) -> PathBuf {
        self.dir.join(&self.root_file)
    }

    pub fn context_path(&self) -> PathBuf {
        self.dir.join(&self.context_file)
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn load_from_file_or_default(path: &Path) -> Self {
        Self::load_from_file(path).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}
