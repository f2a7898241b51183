// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with clap.
// All work is delegated to Layer 2 (application).
//
//   train       — one training run
//   sweep       — several runs, each in save_<arch>, log_<arch>
//   evaluate    — test-set score of a finished run
//   summary     — parameter / layer counts
//   pretrained  — list or download trained ResNets
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{
    Commands, DownloadArgs, EvaluateArgs, PretrainedAction, SummaryArgs, SweepArgs, TrainArgs,
};

use crate::domain::architecture::Architecture;

#[derive(Parser, Debug)]
#[command(
    name = "resnet-cifar",
    version,
    about = "Train and compare ResNet, LeNet and MLP classifiers on CIFAR-10 and MNIST."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)      => run_train(args),
            Commands::Sweep(args)      => run_sweep(args),
            Commands::Evaluate(args)   => run_evaluate(args),
            Commands::Summary(args)    => run_summary(args),
            Commands::Pretrained(args) => match args.action {
                PretrainedAction::List           => run_pretrained_list(),
                PretrainedAction::Download(args) => run_pretrained_download(args),
            },
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let use_case = TrainUseCase::new(args.into());
    let report = use_case.execute()?;

    println!(
        "Training complete. Best accuracy {:.2}% at epoch {}, checkpoints in '{}'.",
        report.best_accuracy * 100.0,
        report.best_epoch,
        use_case.config().save_dir
    );
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    use crate::application::sweep_use_case::{SweepUseCase, TrialStatus};

    let summary = SweepUseCase::new(args.into()).execute()?;

    for t in &summary.trials {
        match (t.status, &t.report) {
            (TrialStatus::Completed, Some(r)) => println!(
                "{:<12} {:<8} lr={:<8} best={:.2}% (epoch {})",
                t.arch.name(), t.optimizer.name(), t.lr, r.best_accuracy * 100.0, r.best_epoch
            ),
            _ => println!(
                "{:<12} {:<8} lr={:<8} FAILED: {}",
                t.arch.name(), t.optimizer.name(), t.lr, t.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::{CheckpointChoice, EvaluateUseCase};

    let choice = if args.latest { CheckpointChoice::Latest } else { CheckpointChoice::Best };
    EvaluateUseCase::new(args.run_dir)
        .with_checkpoint(choice)
        .with_data_dir(args.data_dir)
        .with_backend(args.backend)
        .execute()?;
    Ok(())
}

fn run_summary(args: SummaryArgs) -> Result<()> {
    use crate::ml::{classifier::ModelSpec, summary::summarize};

    let archs: Vec<Architecture> = match args.arch {
        Some(arch) => vec![arch],
        None => Architecture::ALL.to_vec(),
    };

    for arch in archs {
        let spec = ModelSpec {
            shortcut: args.shortcut,
            ..ModelSpec::new(arch, args.dataset.image_shape(), args.dataset.num_classes())
        };
        let s = summarize(&spec)?;
        println!("{arch}");
        if let Some(k) = arch.blocks_per_stage() {
            println!("Blocks per stage {k}");
        }
        println!("Total number of params {}", s.total_params);
        println!("Total layers {}", s.layers);
        println!();
    }
    Ok(())
}

fn run_pretrained_list() -> Result<()> {
    use crate::application::pretrained_use_case::PretrainedUseCase;

    for row in PretrainedUseCase::table() {
        println!("{row}");
    }
    Ok(())
}

fn run_pretrained_download(args: DownloadArgs) -> Result<()> {
    use crate::application::pretrained_use_case::PretrainedUseCase;

    for path in PretrainedUseCase::new(&args.dir).download(&args.archs)? {
        println!("{}", path.display());
    }
    Ok(())
}
