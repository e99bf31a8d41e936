use std::path::{Path, PathBuf};

use crate::{DeviceDescriptor, Error, OutputSource, Platform, Result, ScriptRunner};

/// Runs the script for the host platform and decodes its output.
///
/// The platform, scripts root and script runner can all be replaced, which is mostly useful for
/// bundling and tests.
#[derive(Debug, Clone)]
pub struct Enumerator<S = ScriptRunner> {
    source: S,
    os: String,
    scripts_root: Option<PathBuf>,
}

impl Enumerator {
    pub fn new() -> Self {
        Self::with_source(ScriptRunner)
    }
}

impl Default for Enumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OutputSource> Enumerator<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            os: std::env::consts::OS.to_string(),
            scripts_root: None,
        }
    }

    /// Look up scripts in `path` instead of the process-wide root.
    pub fn scripts_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.scripts_root = Some(path.into());
        self
    }

    /// Pretend to run on another OS. Takes the same identifiers as [`std::env::consts::OS`].
    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = os.into();
        self
    }

    fn root(&self) -> &Path {
        match &self.scripts_root {
            Some(p) => p,
            None => crate::config::scripts_root_path(),
        }
    }

    /// List the drives attached to the host.
    ///
    /// Either every drive is returned or nothing is, there are no partial results.
    pub async fn list(&self) -> Result<Vec<DeviceDescriptor>> {
        let platform =
            Platform::from_os(&self.os).ok_or_else(|| Error::UnsupportedPlatform(self.os.clone()))?;
        let script = platform.script_path(self.root());

        tracing::debug!(%platform, script = %script.display(), "Enumerating drives");

        let output = self.source.run(&script).await?;
        let drives = platform.parse(&output)?;

        tracing::debug!(count = drives.len(), "Enumerated drives");

        Ok(drives)
    }
}
