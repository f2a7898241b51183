// ============================================================
// Layer 6 — Pretrained Models
// ============================================================
// Download links for ResNets trained on CIFAR-10 with the
// default hyperparameters. Each file name ends in the first
// eight hex digits of the file's SHA-256 digest:
//
//   resnet20-12fca82f.th  →  sha256(file) starts with 12fca82f
//
// A download is kept only if its digest matches, and an already
// present file whose digest matches is not fetched again.
//
// The .th files are PyTorch checkpoints; they are listed and
// fetched here but not loaded into Burn models.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::architecture::Architecture;

pub const BASE_URL: &str =
    "https://github.com/akamaster/pytorch_resnet_cifar10/raw/master/pretrained_models";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PretrainedModel {
    pub arch:       Architecture,
    /// Parameter count in millions, as reported
    pub params_m:   f64,
    /// Test error on CIFAR-10, percent
    pub test_error: f64,
    pub file_name:  &'static str,
}

pub const PRETRAINED: [PretrainedModel; 6] = [
    PretrainedModel { arch: Architecture::Resnet20,   params_m: 0.27, test_error: 8.27, file_name: "resnet20-12fca82f.th" },
    PretrainedModel { arch: Architecture::Resnet32,   params_m: 0.46, test_error: 7.37, file_name: "resnet32-d509ac18.th" },
    PretrainedModel { arch: Architecture::Resnet44,   params_m: 0.66, test_error: 6.90, file_name: "resnet44-014dd654.th" },
    PretrainedModel { arch: Architecture::Resnet56,   params_m: 0.85, test_error: 6.61, file_name: "resnet56-4bfd9763.th" },
    PretrainedModel { arch: Architecture::Resnet110,  params_m: 1.7,  test_error: 6.32, file_name: "resnet110-1d1ed7c2.th" },
    PretrainedModel { arch: Architecture::Resnet1202, params_m: 19.4, test_error: 6.18, file_name: "resnet1202-f3b1deed.th" },
];

impl PretrainedModel {
    pub fn url(&self) -> String {
        format!("{BASE_URL}/{}", self.file_name)
    }

    /// Digest prefix embedded in the file name.
    pub fn digest_prefix(&self) -> &'static str {
        self.file_name
            .rsplit_once('-')
            .and_then(|(_, tail)| tail.strip_suffix(".th"))
            .unwrap_or("")
    }
}

pub fn lookup(arch: Architecture) -> Result<&'static PretrainedModel> {
    match PRETRAINED.iter().find(|m| m.arch == arch) {
        Some(m) => Ok(m),
        None => bail!("no pretrained weights for {arch}"),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// True when the SHA-256 of `bytes` starts with `prefix`.
pub fn verify_digest(bytes: &[u8], prefix: &str) -> bool {
    !prefix.is_empty() && sha256_hex(bytes).starts_with(&prefix.to_lowercase())
}

/// Fetch one pretrained file into `dir` and return its path.
pub fn download(model: &PretrainedModel, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;
    let target = dir.join(model.file_name);

    if target.exists() {
        let existing = fs::read(&target)?;
        if verify_digest(&existing, model.digest_prefix()) {
            tracing::info!("{} already present, skipping download", model.file_name);
            return Ok(target);
        }
        tracing::warn!("{} exists but its digest does not match, downloading again", model.file_name);
    }

    let url = model.url();
    tracing::info!("Downloading {} from {}", model.arch, url);

    let bytes = reqwest::blocking::get(&url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .with_context(|| format!("Failed to download '{url}'"))?;

    if !verify_digest(&bytes, model.digest_prefix()) {
        bail!(
            "digest mismatch for {}: expected prefix {}, got {}",
            model.file_name,
            model.digest_prefix(),
            &sha256_hex(&bytes)[..8]
        );
    }

    fs::write(&target, &bytes)
        .with_context(|| format!("Cannot write '{}'", target.display()))?;
    tracing::info!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}
