// ============================================================
// Layer 2 — Pretrained Models
// ============================================================
// Lists the pretrained ResNet table and downloads entries from it.

use anyhow::Result;
use std::path::PathBuf;

use crate::domain::architecture::Architecture;
use crate::infra::pretrained::{download, lookup, PRETRAINED};

pub struct PretrainedUseCase {
    dir: PathBuf,
}

impl PretrainedUseCase {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Rows of the table, formatted for printing.
    pub fn table() -> Vec<String> {
        let mut rows = vec![format!("{:<12}{:>8}{:>10}  {}", "Name", "Params", "Error", "URL")];
        rows.extend(PRETRAINED.iter().map(|m| {
            format!("{:<12}{:>7}M{:>9.2}%  {}", m.arch.name(), m.params_m, m.test_error, m.url())
        }));
        rows
    }

    /// Download the given architectures, or the whole table if empty.
    /// Stops at the first failure.
    pub fn download(&self, archs: &[Architecture]) -> Result<Vec<PathBuf>> {
        let wanted: Vec<Architecture> = if archs.is_empty() {
            PRETRAINED.iter().map(|m| m.arch).collect()
        } else {
            archs.to_vec()
        };

        wanted
            .into_iter()
            .map(|arch| download(lookup(arch)?, &self.dir))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_header_and_six_rows() {
        let rows = PretrainedUseCase::table();
        assert_eq!(rows.len(), 7);
        assert!(rows[0].starts_with("Name"));
        assert!(rows[1].contains("resnet20"));
        assert!(rows[1].contains("8.27%"));
    }

    #[test]
    fn test_unknown_arch_fails_before_network() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PretrainedUseCase::new(tmp.path())
            .download(&[Architecture::Mlp])
            .unwrap_err();
        assert!(err.to_string().contains("no pretrained weights for mlp"));
    }
}
