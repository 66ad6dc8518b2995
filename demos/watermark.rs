// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Command-line front end: embed, extract and verify watermarks in image files.
//!
//! ```text
//! cargo run --example watermark -- embed photo.jpg marked.png --sender USR_0001 --receiver USR_0002
//! cargo run --example watermark -- extract marked.png
//! cargo run --example watermark -- verify marked.png --known chiara=USR_0001 --known marzia=USR_0002
//! ```
//!
//! Set `RUST_LOG=aegis_core=debug` for per-stage statistics.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aegis_core::{embed_bytes, extract_bytes, verify_image, IdentityResolver, Signature, WatermarkConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "watermark")]
#[command(author, version, about = "Robust DCT provenance watermarks", long_about = None)]
struct Cli {
    /// JSON file with watermark parameters (missing fields use defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a sender/receiver signature and write a PNG
    Embed {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[arg(long)]
        sender: String,

        #[arg(long)]
        receiver: String,
    },

    /// Print the recovered signature
    Extract {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },

    /// Extract and resolve the signature against known identities
    Verify {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Known identity as NAME=CODE (repeatable)
        #[arg(long, value_name = "NAME=CODE")]
        known: Vec<String>,

        /// JSON object mapping names to codes
        #[arg(long, value_name = "FILE")]
        registry: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<WatermarkConfig> {
    let config: WatermarkConfig = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))?
        }
        None => WatermarkConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn load_known(pairs: &[String], registry: Option<&Path>) -> Result<BTreeMap<String, String>> {
    let mut known: BTreeMap<String, String> = match registry {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read registry: {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid registry: {}", path.display()))?
        }
        None => BTreeMap::new(),
    };
    for pair in pairs {
        let Some((name, code)) = pair.split_once('=') else {
            bail!("expected NAME=CODE, got {pair:?}");
        };
        known.insert(name.to_string(), code.to_string());
    }
    Ok(known)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Embed { input, output, sender, receiver } => {
            let signature = Signature::new(sender, receiver)?;
            let cover = std::fs::read(&input)
                .with_context(|| format!("Failed to read image: {}", input.display()))?;
            let (png, report) = embed_bytes(&cover, &signature.to_string(), &config)?;
            std::fs::write(&output, &png)
                .with_context(|| format!("Failed to write image: {}", output.display()))?;
            info!(path = %output.display(), bytes = png.len(), "Wrote marked image");
            println!(
                "embedded {signature}: {} blocks, {} full copies, {} weak blocks",
                report.blocks, report.full_copies, report.weak_blocks
            );
        }
        Commands::Extract { image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read image: {}", image.display()))?;
            let extraction = extract_bytes(&bytes, &config)?;
            match extraction.signature() {
                Some(signature) => println!("{signature}"),
                None => {
                    if let Some(hint) = extraction.hint() {
                        eprintln!("raw preview: {hint:?}");
                    }
                    bail!("no signature found");
                }
            }
        }
        Commands::Verify { image, known, registry } => {
            let resolver = IdentityResolver::new(load_known(&known, registry.as_deref())?);
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read image: {}", image.display()))?;
            let decoded = aegis_core::raster::carrier::decode_image(&bytes)?;
            let verification = verify_image(&decoded, &resolver, &config)?;

            match (verification.extraction.signature(), &verification.resolution) {
                (Some(signature), Some(resolution)) => {
                    println!("signature: {signature}");
                    println!("sender:    {}", resolution.sender_display());
                    println!("receiver:  {}", resolution.receiver_display());
                }
                (None, Some(resolution)) if resolution.matched() => {
                    println!("no intact signature; raw preview suggests:");
                    println!("sender:    {}", resolution.sender_display());
                    println!("receiver:  {}", resolution.receiver_display());
                }
                _ => bail!("no signature found"),
            }
        }
    }
    Ok(())
}
