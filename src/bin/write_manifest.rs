//! Manifest writer for cardiorisk model artifacts.
//!
//! Records the SHA-256 digest of every artifact in a model directory into
//! `manifest.json`, which the loader verifies at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- <model_dir>
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use cardiorisk::adapters::artifacts::{load_model_dir, ArtifactManifest, MANIFEST_FILE};

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let Some(dir) = args.next() else {
        bail!("Usage: write_manifest <model_dir>");
    };
    if let Some(extra) = args.next() {
        bail!("Unexpected argument: {extra}");
    }
    Ok(PathBuf::from(dir))
}

fn main() -> Result<()> {
    let model_dir = parse_args()?;

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .context("Model path has no parent directory")?
            .to_path_buf()
    } else {
        model_dir
    };

    let manifest = ArtifactManifest::for_dir(&model_dir)
        .with_context(|| format!("Failed to hash artifacts in {model_dir:?}"))?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, format!("{json}\n"))
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    // Reload through the verifying loader so a bad artifact fails here.
    load_model_dir(&model_dir).context("Artifacts do not load with the new manifest")?;

    println!("Wrote {}", manifest_path.display());
    for (file, digest) in &manifest.files {
        println!("  {file}  sha256={digest}");
    }
    Ok(())
}
