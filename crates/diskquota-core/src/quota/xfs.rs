//! `xfs_quota` command runner.

use std::path::Path;
use std::process::Command;

use diskquota_common::constants::QUOTA_COMMAND;
use diskquota_common::error::{DiskQuotaError, Result};

use super::{QuotaCommand, QuotaCommandRunner};

/// Runs quota commands through `xfs_quota -x -c <command> <root>`.
#[derive(Debug, Clone)]
pub struct XfsQuotaRunner {
    program: String,
}

impl XfsQuotaRunner {
    /// Creates a runner invoking `program` in expert mode.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for XfsQuotaRunner {
    fn default() -> Self {
        Self::new(QUOTA_COMMAND)
    }
}

impl QuotaCommandRunner for XfsQuotaRunner {
    fn run(&self, quota_root: &Path, command: &QuotaCommand) -> Result<()> {
        let rendered = command.render();
        let output = Command::new(&self.program)
            .arg("-x")
            .arg("-c")
            .arg(&rendered)
            .arg(quota_root)
            .output()
            .map_err(|e| DiskQuotaError::Io {
                path: self.program.clone().into(),
                source: e,
            })?;

        if output.status.success() {
            return Ok(());
        }
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(DiskQuotaError::Command {
            command: rendered,
            output: format!("{} ({})", combined.trim(), output.status),
        })
    }
}
