use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Built-in optimizer choices, selected by name on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
    AdaGrad,
    RmsProp,
}

impl OptimizerKind {
    pub const ALL: [OptimizerKind; 4] = [
        OptimizerKind::Sgd,
        OptimizerKind::Adam,
        OptimizerKind::AdaGrad,
        OptimizerKind::RmsProp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptimizerKind::Sgd     => "sgd",
            OptimizerKind::Adam    => "adam",
            OptimizerKind::AdaGrad => "adagrad",
            OptimizerKind::RmsProp => "rmsprop",
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OptimizerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        match OptimizerKind::ALL.iter().find(|o| o.name() == wanted) {
            Some(kind) => Ok(*kind),
            None => bail!("optimizer not supported: {s}"),
        }
    }
}

/// Hyperparameters shared by every optimizer. Fields that an
/// optimizer has no use for are ignored (Adam has no momentum knob).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub momentum:     f64,
    pub weight_decay: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self { momentum: 0.9, weight_decay: 1e-4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("SGD".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert_eq!("RMSprop".parse::<OptimizerKind>().unwrap(), OptimizerKind::RmsProp);
        assert_eq!("adagrad".parse::<OptimizerKind>().unwrap(), OptimizerKind::AdaGrad);
    }

    #[test]
    fn test_unknown_optimizer_is_rejected() {
        let err = "lbfgs".parse::<OptimizerKind>().unwrap_err();
        assert_eq!(err.to_string(), "optimizer not supported: lbfgs");
    }
}
