// ============================================================
// Layer 3 — Learning-Rate Schedule
// ============================================================
// Multi-step decay: the base rate is multiplied by `gamma` each
// time a milestone epoch is reached. During the warm-up epochs
// the rate is held at a tenth of the base.
//
// Example (base 0.1, milestones [100, 150], gamma 0.1):
//   epochs   0..100 → 0.1
//   epochs 100..150 → 0.01
//   epochs 150..    → 0.001
//
// Epochs are 0-based here; the CLI prints them 1-based.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrSchedule {
    pub base_lr:       f64,
    pub milestones:    Vec<usize>,
    pub gamma:         f64,
    pub warmup_epochs: usize,
}

impl LrSchedule {
    pub fn new(base_lr: f64, milestones: Vec<usize>, gamma: f64) -> Self {
        Self { base_lr, milestones, gamma, warmup_epochs: 0 }
    }

    pub fn with_warmup(mut self, epochs: usize) -> Self {
        self.warmup_epochs = epochs;
        self
    }

    /// Learning rate to use for the given 0-based epoch.
    pub fn lr_at(&self, epoch: usize) -> f64 {
        if epoch < self.warmup_epochs {
            return self.base_lr * 0.1;
        }
        let passed = self.milestones.iter().filter(|&&m| m <= epoch).count();
        self.base_lr * self.gamma.powi(passed as i32)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_step_decay_at_milestones() {
        let s = LrSchedule::new(0.1, vec![100, 150], 0.1);
        assert!(close(s.lr_at(0), 0.1));
        assert!(close(s.lr_at(99), 0.1));
        assert!(close(s.lr_at(100), 0.01));
        assert!(close(s.lr_at(149), 0.01));
        assert!(close(s.lr_at(150), 0.001));
        assert!(close(s.lr_at(199), 0.001));
    }

    #[test]
    fn test_warmup_overrides_first_epoch_only() {
        let s = LrSchedule::new(0.1, vec![100, 150], 0.1).with_warmup(1);
        assert!(close(s.lr_at(0), 0.01));
        assert!(close(s.lr_at(1), 0.1));
    }

    #[test]
    fn test_no_milestones_is_constant() {
        let s = LrSchedule::new(0.05, Vec::new(), 0.5);
        assert!(close(s.lr_at(0), 0.05));
        assert!(close(s.lr_at(1000), 0.05));
    }

    #[test]
    fn test_unsorted_milestones_still_count() {
        let s = LrSchedule::new(1.0, vec![20, 10], 0.5);
        assert!(close(s.lr_at(15), 0.5));
        assert!(close(s.lr_at(25), 0.25));
    }
}
