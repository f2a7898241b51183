// ============================================================
// Layer 2 — SweepUseCase
// ============================================================
// Trains every combination of architecture × optimizer × lr,
// one after another, each in its own run directory:
//
//   <root>/save_resnet20/           single optimizer and lr
//   <root>/log_resnet20
//
//   <root>/save_resnet20_adam_lr0.01/   grid over optimizer/lr
//   <root>/log_resnet20_adam_lr0.01
//
// A trial that fails is logged and marked failed; the sweep
// moves on to the next one. sweep_summary.json in the root lists
// every trial and the index of the best completed one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::{TrainConfig, TrainUseCase};
use crate::domain::{architecture::Architecture, optimizer::OptimizerKind};
use crate::infra::run_log::with_run_log;
use crate::ml::trainer::TrainReport;

pub const SUMMARY_FILE: &str = "sweep_summary.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Hyperparameters shared by every trial
    pub base:       TrainConfig,
    pub root_dir:   String,
    pub archs:      Vec<Architecture>,
    pub optimizers: Vec<OptimizerKind>,
    pub lrs:        Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepTrial {
    pub trial_number: usize,
    pub arch:         Architecture,
    pub optimizer:    OptimizerKind,
    pub lr:           f64,
    pub save_dir:     PathBuf,
    pub log_file:     PathBuf,
    pub status:       TrialStatus,
    pub report:       Option<TrainReport>,
    pub error:        Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub trials:     Vec<SweepTrial>,
    /// Index into `trials` of the completed trial with the best accuracy
    pub best_trial: Option<usize>,
}

impl SweepSummary {
    pub fn best(&self) -> Option<&SweepTrial> {
        self.best_trial.and_then(|i| self.trials.get(i))
    }

    pub fn failed(&self) -> usize {
        self.trials.iter().filter(|t| t.status == TrialStatus::Failed).count()
    }
}

/// One planned trial: its config and directory suffix.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub suffix: String,
    pub config: TrainConfig,
}

impl SweepConfig {
    /// Cartesian product of the grid, architectures outermost.
    pub fn plan(&self) -> Vec<TrialPlan> {
        let tagged = self.optimizers.len() > 1 || self.lrs.len() > 1;
        let root = Path::new(&self.root_dir);

        let mut plans = Vec::with_capacity(self.archs.len() * self.optimizers.len() * self.lrs.len());
        for &arch in &self.archs {
            for &optimizer in &self.optimizers {
                for &lr in &self.lrs {
                    let suffix = if tagged {
                        format!("{arch}_{optimizer}_lr{lr}")
                    } else {
                        arch.to_string()
                    };
                    let config = TrainConfig {
                        arch,
                        optimizer,
                        lr,
                        save_dir: root.join(format!("save_{suffix}")).to_string_lossy().into_owned(),
                        ..self.base.clone()
                    };
                    plans.push(TrialPlan { suffix, config });
                }
            }
        }
        plans
    }
}

pub struct SweepUseCase {
    config: SweepConfig,
}

impl SweepUseCase {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<SweepSummary> {
        self.execute_with(|cfg| TrainUseCase::new(cfg.clone()).execute())
    }

    /// Run every trial through `train`, each inside its own run log.
    pub fn execute_with<F>(&self, mut train: F) -> Result<SweepSummary>
    where
        F: FnMut(&TrainConfig) -> Result<TrainReport>,
    {
        let root = Path::new(&self.config.root_dir);
        fs::create_dir_all(root)
            .with_context(|| format!("Cannot create sweep root '{}'", root.display()))?;

        let plans = self.config.plan();
        tracing::info!("Sweep of {} trials in '{}'", plans.len(), root.display());

        let mut trials = Vec::with_capacity(plans.len());
        for (i, plan) in plans.into_iter().enumerate() {
            let log_name = format!("log_{}", plan.suffix);
            tracing::info!("Trial {}: {}", i + 1, plan.suffix);

            let outcome = with_run_log(root, &log_name, || train(&plan.config));

            let (status, report, error) = match outcome {
                Ok(report) => (TrialStatus::Completed, Some(report), None),
                Err(e) => {
                    tracing::error!("Trial {} ({}) failed: {:#}", i + 1, plan.suffix, e);
                    (TrialStatus::Failed, None, Some(format!("{e:#}")))
                }
            };

            trials.push(SweepTrial {
                trial_number: i + 1,
                arch:         plan.config.arch,
                optimizer:    plan.config.optimizer,
                lr:           plan.config.lr,
                save_dir:     PathBuf::from(&plan.config.save_dir),
                log_file:     root.join(log_name),
                status,
                report,
                error,
            });
        }

        let summary = SweepSummary { best_trial: best_trial(&trials), trials };

        let path = root.join(SUMMARY_FILE);
        fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        match summary.best() {
            Some(best) => tracing::info!(
                "Sweep done: {} failed, best {} {} lr={} ({:.2}%)",
                summary.failed(),
                best.arch,
                best.optimizer,
                best.lr,
                best.report.map_or(0.0, |r| r.best_accuracy) * 100.0
            ),
            None => tracing::warn!("Sweep done: no trial completed"),
        }
        Ok(summary)
    }
}

fn best_trial(trials: &[SweepTrial]) -> Option<usize> {
    trials
        .iter()
        .enumerate()
        .filter_map(|(i, t)| t.report.map(|r| (i, r.best_accuracy)))
        .fold(None, |best: Option<(usize, f64)>, (i, acc)| match best {
            Some((_, b)) if b >= acc => best,
            _ => Some((i, acc)),
        })
        .map(|(i, _)| i)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn report(acc: f64) -> TrainReport {
        TrainReport {
            best_accuracy:    acc,
            best_epoch:       1,
            epochs_run:       1,
            final_train_loss: 1.0,
            final_train_acc:  acc,
            final_val_loss:   1.0,
            final_val_acc:    acc,
        }
    }

    fn sweep(root: &Path, optimizers: Vec<OptimizerKind>, lrs: Vec<f64>) -> SweepConfig {
        SweepConfig {
            base:       TrainConfig::default(),
            root_dir:   root.to_string_lossy().into_owned(),
            archs:      vec![Architecture::Resnet20, Architecture::Resnet32],
            optimizers,
            lrs,
        }
    }

    #[test]
    fn test_plain_sweep_uses_arch_names() {
        let cfg = sweep(Path::new("runs"), vec![OptimizerKind::Sgd], vec![0.1]);
        let suffixes: Vec<String> = cfg.plan().into_iter().map(|p| p.suffix).collect();
        assert_eq!(suffixes, vec!["resnet20", "resnet32"]);
        assert!(cfg.plan()[1].config.save_dir.ends_with("save_resnet32"));
    }

    #[test]
    fn test_grid_sweep_tags_directories() {
        let cfg = sweep(
            Path::new("runs"),
            vec![OptimizerKind::Sgd, OptimizerKind::Adam],
            vec![0.1, 0.01],
        );
        let plans = cfg.plan();
        assert_eq!(plans.len(), 8);
        assert_eq!(plans[0].suffix, "resnet20_sgd_lr0.1");
        assert_eq!(plans[3].suffix, "resnet20_adam_lr0.01");
        assert_eq!(plans[3].config.optimizer, OptimizerKind::Adam);
        assert_eq!(plans[3].config.lr, 0.01);
    }

    #[test]
    fn test_failed_trial_does_not_stop_sweep() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = sweep(tmp.path(), vec![OptimizerKind::Sgd], vec![0.1]);

        let summary = SweepUseCase::new(cfg)
            .execute_with(|c| {
                if c.arch == Architecture::Resnet20 {
                    bail!("out of memory");
                }
                Ok(report(0.9))
            })
            .unwrap();

        assert_eq!(summary.trials.len(), 2);
        assert_eq!(summary.trials[0].status, TrialStatus::Failed);
        assert_eq!(summary.trials[0].error.as_deref(), Some("out of memory"));
        assert_eq!(summary.trials[1].status, TrialStatus::Completed);
        assert_eq!(summary.best().unwrap().arch, Architecture::Resnet32);
        assert_eq!(summary.failed(), 1);

        assert!(tmp.path().join(SUMMARY_FILE).exists());
        assert!(tmp.path().join("log_resnet20").exists());
        assert!(tmp.path().join("log_resnet32").exists());
    }

    #[test]
    fn test_best_trial_picks_highest_accuracy() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = sweep(tmp.path(), vec![OptimizerKind::Sgd], vec![0.1, 0.05]);
        let mut accs = vec![0.5, 0.8, 0.7, 0.6].into_iter();

        let summary = SweepUseCase::new(cfg)
            .execute_with(|_| Ok(report(accs.next().unwrap())))
            .unwrap();
        assert_eq!(summary.best_trial, Some(1));
    }
}
