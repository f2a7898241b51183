// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags.
// Defaults reproduce the standard CIFAR-10 ResNet recipe:
// SGD, lr 0.1, momentum 0.9, weight decay 1e-4, batch 128,
// 200 epochs with the rate divided by 10 at epochs 100 and 150.
//
// clap parses Architecture, OptimizerKind, DatasetKind, etc.
// through their FromStr impls, so a typo gets the same error
// message everywhere.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    sweep_use_case::SweepConfig,
    train_use_case::TrainConfig,
};
use crate::domain::{
    architecture::{Architecture, ShortcutKind},
    image::DatasetKind,
    optimizer::OptimizerKind,
};
use crate::ml::backend::BackendKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one network
    Train(TrainArgs),

    /// Train a list of networks one after another, each in save_<arch>
    Sweep(SweepArgs),

    /// Score a finished run on the test split
    Evaluate(EvaluateArgs),

    /// Print parameter and layer counts
    Summary(SummaryArgs),

    /// List or download pretrained CIFAR-10 ResNets
    Pretrained(PretrainedArgs),
}

// ─── Shared hyperparameters ───────────────────────────────────────────────────
#[derive(Args, Debug, Clone)]
pub struct HyperArgs {
    /// cifar10 or mnist
    #[arg(long, default_value = "cifar10")]
    pub dataset: DatasetKind,

    /// Directory with the CIFAR-10 binary batches (unused for mnist)
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// wgpu (GPU) or ndarray (CPU)
    #[arg(long, default_value = "wgpu")]
    pub backend: BackendKind,

    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    #[arg(long = "wd", alias = "weight-decay", default_value_t = 1e-4)]
    pub weight_decay: f64,

    #[arg(short = 'b', long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 200)]
    pub epochs: usize,

    /// Epochs at which the learning rate is multiplied by --gamma
    #[arg(long, value_delimiter = ',', default_values_t = [100, 150])]
    pub milestones: Vec<usize>,

    #[arg(long, default_value_t = 0.1)]
    pub gamma: f64,

    /// Save a numbered checkpoint every N epochs
    #[arg(long, default_value_t = 10)]
    pub save_every: usize,

    /// Log the running loss every N steps (debug level)
    #[arg(short = 'p', long, default_value_t = 50)]
    pub print_every: usize,

    /// Data loading threads
    #[arg(short = 'j', long, default_value_t = 4)]
    pub workers: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Hold out this fraction of the training split for validation
    /// instead of validating on the test split
    #[arg(long, default_value_t = 0.0)]
    pub val_fraction: f64,

    /// Disable random crop + flip
    #[arg(long)]
    pub no_augment: bool,

    /// ResNet shortcut option: A (zero padding) or B (projection)
    #[arg(long, default_value = "A")]
    pub shortcut: ShortcutKind,

    /// Width of the MLP hidden layers
    #[arg(long, default_value_t = 100)]
    pub hidden_dim: usize,

    /// Number of MLP hidden layers
    #[arg(long, default_value_t = 1)]
    pub num_hidden_layers: usize,

    /// Record the flattened weights to optim_path.jsonl
    #[arg(long)]
    pub track_path: bool,

    /// Steps between recorded weight snapshots
    #[arg(long, default_value_t = 50)]
    pub track_every: usize,

    /// Continue from the latest checkpoint in the run directory
    #[arg(long)]
    pub resume: bool,
}

impl HyperArgs {
    fn into_config(
        self,
        arch:      Architecture,
        optimizer: OptimizerKind,
        lr:        f64,
        save_dir:  String,
    ) -> TrainConfig {
        TrainConfig {
            arch,
            dataset:           self.dataset,
            data_dir:          self.data_dir,
            save_dir,
            backend:           self.backend,
            optimizer,
            lr,
            momentum:          self.momentum,
            weight_decay:      self.weight_decay,
            batch_size:        self.batch_size,
            epochs:            self.epochs,
            milestones:        self.milestones,
            gamma:             self.gamma,
            save_every:        self.save_every,
            print_every:       self.print_every,
            num_workers:       self.workers,
            seed:              self.seed,
            val_fraction:      self.val_fraction,
            augment:           !self.no_augment,
            shortcut:          self.shortcut,
            hidden_dim:        self.hidden_dim,
            num_hidden_layers: self.num_hidden_layers,
            track_path:        self.track_path,
            track_every:       self.track_every,
            resume:            self.resume,
        }
    }
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// resnet20 … resnet1202, lenet, mlp
    #[arg(short = 'a', long, default_value = "resnet20")]
    pub arch: Architecture,

    /// sgd, adam, adagrad or rmsprop
    #[arg(long, default_value = "sgd")]
    pub optimizer: OptimizerKind,

    #[arg(long, default_value_t = 0.1)]
    pub lr: f64,

    /// Run directory (default: save_<arch>)
    #[arg(long)]
    pub save_dir: Option<String>,

    #[command(flatten)]
    pub hyper: HyperArgs,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let save_dir = a.save_dir.unwrap_or_else(|| format!("save_{}", a.arch));
        a.hyper.into_config(a.arch, a.optimizer, a.lr, save_dir)
    }
}

// ─── sweep ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Architectures to train, in order
    #[arg(long, value_delimiter = ',', default_values_t = Architecture::RESNETS)]
    pub archs: Vec<Architecture>,

    #[arg(long, value_delimiter = ',', default_value = "sgd")]
    pub optimizers: Vec<OptimizerKind>,

    #[arg(long, value_delimiter = ',', default_values_t = [0.1])]
    pub lrs: Vec<f64>,

    /// Directory that receives every save_<…> and log_<…>
    #[arg(long, default_value = ".")]
    pub root_dir: String,

    #[command(flatten)]
    pub hyper: HyperArgs,
}

impl From<SweepArgs> for SweepConfig {
    fn from(a: SweepArgs) -> Self {
        // Per-trial fields are filled in by SweepConfig::plan
        let base = a.hyper.into_config(
            Architecture::Resnet20,
            OptimizerKind::Sgd,
            0.1,
            String::new(),
        );
        SweepConfig {
            base,
            root_dir:   a.root_dir,
            archs:      a.archs,
            optimizers: a.optimizers,
            lrs:        a.lrs,
        }
    }
}

// ─── evaluate ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Run directory written by `train`
    pub run_dir: String,

    /// Use the newest numbered checkpoint instead of model_best
    #[arg(long)]
    pub latest: bool,

    /// Override the data directory saved with the run
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override the backend saved with the run
    #[arg(long)]
    pub backend: Option<BackendKind>,
}

// ─── summary ──────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Architecture to describe (default: all)
    #[arg(short = 'a', long)]
    pub arch: Option<Architecture>,

    #[arg(long, default_value = "cifar10")]
    pub dataset: DatasetKind,

    #[arg(long, default_value = "A")]
    pub shortcut: ShortcutKind,
}

// ─── pretrained ───────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PretrainedArgs {
    #[command(subcommand)]
    pub action: PretrainedAction,
}

#[derive(Subcommand, Debug)]
pub enum PretrainedAction {
    /// Print the table of pretrained models
    List,

    /// Download pretrained weights (all of them if none are named)
    Download(DownloadArgs),
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    pub archs: Vec<Architecture>,

    #[arg(long, default_value = "pretrained_models")]
    pub dir: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        let mut argv = vec!["resnet-cifar"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn test_train_defaults_match_recipe() {
        let Commands::Train(args) = parse(&["train"]) else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_train_flags() {
        let Commands::Train(args) = parse(&[
            "train", "-a", "resnet56", "--optimizer", "adam", "--lr", "0.001",
            "--milestones", "30,60,90", "--backend", "ndarray", "--no-augment",
        ]) else {
            panic!("expected train")
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.arch, Architecture::Resnet56);
        assert_eq!(cfg.save_dir, "save_resnet56");
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.milestones, vec![30, 60, 90]);
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert!(!cfg.augment);
    }

    #[test]
    fn test_bad_optimizer_is_rejected() {
        let argv = ["resnet-cifar", "train", "--optimizer", "lbfgs"];
        let err = Cli::try_parse_from(argv).unwrap_err().to_string();
        assert!(err.contains("optimizer not supported: lbfgs"));
    }

    #[test]
    fn test_sweep_defaults_to_every_resnet() {
        let Commands::Sweep(args) = parse(&["sweep"]) else { panic!("expected sweep") };
        let cfg: SweepConfig = args.into();
        assert_eq!(cfg.archs, Architecture::RESNETS.to_vec());
        assert_eq!(cfg.optimizers, vec![OptimizerKind::Sgd]);
        assert_eq!(cfg.lrs, vec![0.1]);
    }

    #[test]
    fn test_pretrained_download_names() {
        let Commands::Pretrained(PretrainedArgs { action: PretrainedAction::Download(args) }) =
            parse(&["pretrained", "download", "resnet20", "resnet56"])
        else {
            panic!("expected pretrained download")
        };
        assert_eq!(args.archs, vec![Architecture::Resnet20, Architecture::Resnet56]);
        assert_eq!(args.dir, "pretrained_models");
    }
}
