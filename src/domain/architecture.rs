// ============================================================
// Layer 3 — Architecture
// ============================================================
// The set of networks the harness can build. ResNet variants
// follow the CIFAR layout: three stages of k basic blocks each,
// giving 6k+2 weighted layers.
//
//   name       | k   | layers
//   resnet20   | 3   | 20
//   resnet32   | 5   | 32
//   resnet44   | 7   | 44
//   resnet56   | 9   | 56
//   resnet110  | 18  | 110
//   resnet1202 | 200 | 1202

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Resnet20,
    Resnet32,
    Resnet44,
    Resnet56,
    Resnet110,
    Resnet1202,
    LeNet,
    Mlp,
}

impl Architecture {
    /// The ResNet family in ascending depth. Also the default sweep order.
    pub const RESNETS: [Architecture; 6] = [
        Architecture::Resnet20,
        Architecture::Resnet32,
        Architecture::Resnet44,
        Architecture::Resnet56,
        Architecture::Resnet110,
        Architecture::Resnet1202,
    ];

    /// Every architecture, ResNets first.
    pub const ALL: [Architecture; 8] = [
        Architecture::Resnet20,
        Architecture::Resnet32,
        Architecture::Resnet44,
        Architecture::Resnet56,
        Architecture::Resnet110,
        Architecture::Resnet1202,
        Architecture::LeNet,
        Architecture::Mlp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Architecture::Resnet20   => "resnet20",
            Architecture::Resnet32   => "resnet32",
            Architecture::Resnet44   => "resnet44",
            Architecture::Resnet56   => "resnet56",
            Architecture::Resnet110  => "resnet110",
            Architecture::Resnet1202 => "resnet1202",
            Architecture::LeNet      => "lenet",
            Architecture::Mlp        => "mlp",
        }
    }

    /// Number of basic blocks in each of the three stages,
    /// or None for the non-residual networks.
    pub fn blocks_per_stage(&self) -> Option<usize> {
        match self {
            Architecture::Resnet20   => Some(3),
            Architecture::Resnet32   => Some(5),
            Architecture::Resnet44   => Some(7),
            Architecture::Resnet56   => Some(9),
            Architecture::Resnet110  => Some(18),
            Architecture::Resnet1202 => Some(200),
            Architecture::LeNet | Architecture::Mlp => None,
        }
    }

    /// The two deepest ResNets start with one epoch at a tenth of the
    /// learning rate.
    pub fn needs_warmup(&self) -> bool {
        matches!(self, Architecture::Resnet110 | Architecture::Resnet1202)
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        match Architecture::ALL.iter().find(|a| a.name() == wanted) {
            Some(arch) => Ok(*arch),
            None => {
                let valid: Vec<&str> = Architecture::ALL.iter().map(|a| a.name()).collect();
                bail!("unknown architecture '{}', expected one of: {}", s, valid.join(", "))
            }
        }
    }
}

// ─── ShortcutKind ─────────────────────────────────────────────────────────────
/// Shortcut used where a block changes resolution or width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortcutKind {
    /// Parameter-free: stride subsampling plus zero channel padding
    A,
    /// 1×1 projection convolution plus batch norm
    B,
}

impl FromStr for ShortcutKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(ShortcutKind::A),
            "B" | "b" => Ok(ShortcutKind::B),
            other => bail!("unknown shortcut option '{other}', expected A or B"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for arch in Architecture::ALL {
            assert_eq!(arch.name().parse::<Architecture>().unwrap(), arch);
        }
        assert_eq!("ResNet56".parse::<Architecture>().unwrap(), Architecture::Resnet56);
    }

    #[test]
    fn test_unknown_name_lists_choices() {
        let err = "resnet18".parse::<Architecture>().unwrap_err().to_string();
        assert!(err.contains("resnet18"));
        assert!(err.contains("resnet1202"));
    }

    #[test]
    fn test_layer_count_is_6k_plus_2() {
        for arch in Architecture::RESNETS {
            let k = arch.blocks_per_stage().unwrap();
            let depth: usize = arch.name().trim_start_matches("resnet").parse().unwrap();
            assert_eq!(6 * k + 2, depth);
        }
        assert_eq!(Architecture::LeNet.blocks_per_stage(), None);
    }

    #[test]
    fn test_shortcut_parse() {
        assert_eq!("a".parse::<ShortcutKind>().unwrap(), ShortcutKind::A);
        assert_eq!("B".parse::<ShortcutKind>().unwrap(), ShortcutKind::B);
        assert!("C".parse::<ShortcutKind>().is_err());
    }

    #[test]
    fn test_warmup_only_for_deepest() {
        let warm: Vec<_> = Architecture::ALL.iter().filter(|a| a.needs_warmup()).collect();
        assert_eq!(warm, vec![&Architecture::Resnet110, &Architecture::Resnet1202]);
    }
}
