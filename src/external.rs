//! External build invocation.
//!
//! Some upstream trees regenerate their remapped sources with their own
//! build. [`ExternalCommand`] runs such a build synchronously, bounded by a
//! timeout, and plugs into the sync pass as a [`TreeRemapper`].

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::rewrite::{RemapReport, RewriteError, TreeRemapper};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExternalProcessFailure {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("`{program}` exited with {status}")]
    Exited { program: String, status: ExitStatus },
}

impl ExternalProcessFailure {
    pub fn transience(&self) -> Transience {
        match self {
            ExternalProcessFailure::TimedOut { .. } | ExternalProcessFailure::Wait { .. } => {
                Transience::Unknown
            }
            ExternalProcessFailure::Spawn { .. } | ExternalProcessFailure::Exited { .. } => {
                Transience::Permanent
            }
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ExternalProcessFailure::Spawn { .. } => Effect::None,
            // The process may have written part of its output.
            _ => Effect::Unknown,
        }
    }
}

/// A command that regenerates remapped sources. `{input}` and `{output}` in
/// arguments are replaced with the tree paths of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; the input tree when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    #[serde(default = "default_timeout", with = "secs")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs the command with inherited stdio and waits for it. The child is
    /// killed once the timeout passes.
    pub fn run(&self, input: &Path, output: &Path) -> Result<(), ExternalProcessFailure> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                a.replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy())
            })
            .collect();
        let cwd = self.cwd.as_deref().unwrap_or(input);
        tracing::info!(program = %self.program, ?args, cwd = %cwd.display(), "running external remap");

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(cwd)
            .spawn()
            .map_err(|source| ExternalProcessFailure::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let deadline = Instant::now() + self.timeout;
        let mut backoff = Duration::from_millis(50);
        loop {
            let polled = child.try_wait().map_err(|source| ExternalProcessFailure::Wait {
                program: self.program.clone(),
                source,
            })?;
            if let Some(status) = polled {
                if status.success() {
                    return Ok(());
                }
                return Err(ExternalProcessFailure::Exited {
                    program: self.program.clone(),
                    status,
                });
            }
            let now = Instant::now();
            if now >= deadline {
                if let Err(err) = child.kill() {
                    tracing::warn!(program = %self.program, error = %err, "failed to kill timed out process");
                }
                let _ = child.wait();
                return Err(ExternalProcessFailure::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(backoff.min(deadline - now));
            backoff = (backoff * 2).min(Duration::from_secs(1));
        }
    }
}

impl TreeRemapper for ExternalCommand {
    fn remap_tree(&self, input: &Path, output: &Path) -> Result<RemapReport, RewriteError> {
        self.run(input, output)?;
        Ok(RemapReport::default())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn success_and_placeholders() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        let cmd = ExternalCommand::new("sh").arg("-c").arg("echo remapped > {output}");
        cmd.run(dir.path(), &out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "remapped\n");
    }

    #[test]
    fn non_zero_exit_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ExternalCommand::new("sh")
            .arg("-c")
            .arg("exit 3")
            .run(dir.path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ExternalProcessFailure::Exited { ref status, .. } if status.code() == Some(3)));
        assert_eq!(err.transience(), Transience::Permanent);
    }

    #[test]
    fn timeout_kills_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let started = Instant::now();
        let err = ExternalCommand::new("sleep")
            .arg("30")
            .timeout(Duration::from_millis(200))
            .run(dir.path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ExternalProcessFailure::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn missing_program_is_a_spawn_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = ExternalCommand::new("definitely-not-a-real-program-4821")
            .run(dir.path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ExternalProcessFailure::Spawn { .. }));
        assert_eq!(err.effect(), Effect::None);
    }
}
