//! Running the platform script and capturing what it prints.

use std::{io, path::Path, process::Stdio};

use thiserror::Error;

/// Why a script produced no usable output.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to run {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: io::Error,
    },
    /// `None` when the process was killed by a signal
    #[error("{path} exited with code {code:?}")]
    ExitCode { path: String, code: Option<i32> },
    /// Anything on stderr is treated as a failure, warnings included
    #[error("{0}")]
    Stderr(String),
}

/// Something that can run an enumeration script and hand back its stdout.
pub trait OutputSource {
    fn run(&self, script: &Path) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Runs scripts as child processes. There is no timeout, a script that never exits leaves the
/// caller waiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptRunner;

impl OutputSource for ScriptRunner {
    async fn run(&self, script: &Path) -> Result<String, SourceError> {
        let path = script.display().to_string();

        let output = tokio::process::Command::new(script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                path: path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::ExitCode {
                path,
                code: output.status.code(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            return Err(SourceError::Stderr(stderr.into_owned()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
