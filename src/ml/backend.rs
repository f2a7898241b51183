use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Training backend, the device selector of the harness.
/// `wgpu` runs on the GPU through WebGPU; `ndarray` runs on the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Wgpu,
    NdArray,
}

pub type WgpuBackend    = burn::backend::Wgpu;
pub type NdArrayBackend = burn::backend::NdArray;

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Wgpu    => f.write_str("wgpu"),
            BackendKind::NdArray => f.write_str("ndarray"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wgpu" | "gpu"    => Ok(BackendKind::Wgpu),
            "ndarray" | "cpu" => Ok(BackendKind::NdArray),
            other => bail!("unknown backend '{other}', expected wgpu or ndarray"),
        }
    }
}
