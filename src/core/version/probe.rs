use std::process::Command;

use tracing::{debug, instrument};

use crate::core::error::{DevError, DevResult};

/// Source of the "running environment" version used when nothing else is
/// requested.
pub trait VersionProbe: Send + Sync {
    fn runtime_version(&self) -> DevResult<String>;
}

/// Asks the `node` binary on the PATH for its version.
#[derive(Debug, Clone)]
pub struct NodeBinaryProbe {
    program: String,
}

impl Default for NodeBinaryProbe {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
        }
    }
}

impl NodeBinaryProbe {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl VersionProbe for NodeBinaryProbe {
    #[instrument(skip(self), fields(program = %self.program))]
    fn runtime_version(&self) -> DevResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| DevError::RuntimeProbe(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(DevError::RuntimeProbe(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().next().unwrap_or("").trim().to_string();
        debug!("probed runtime version {:?}", version);
        if version.is_empty() {
            return Err(DevError::RuntimeProbe(format!(
                "{} --version printed nothing",
                self.program
            )));
        }
        Ok(version)
    }
}
