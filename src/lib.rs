//! List the block devices attached to the host, in the spirit of
//! [Balena's drivelist](https://github.com/balena-io-modules/drivelist).
//!
//! Each platform has a small script that asks the OS for its disks and prints them in that
//! platform's own format. This crate runs the script and normalizes the output into
//! [`DeviceDescriptor`]s.
//!
//! - Windows: `win32.bat`, a wmic style fixed-width table
//! - Linux: `linux.sh`, `lsblk` json
//! - Macos: `darwin.sh`, blocks of `key: value` lines
//!
//! # Usage
//!
//! ```no_run
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     for drive in drivelist::list().await.unwrap() {
//!         println!("{} {} {}", drive.device, drive.description, drive.size);
//!     }
//! }
//! ```
//!
//! Scripts are looked up in [`scripts_root_path`], which can be overridden once at startup with
//! [`set_scripts_root_path`] or the `DRIVELIST_SCRIPTS_ROOT` environment variable.

mod config;
mod device;
mod enumerator;
mod pal;
mod platform;
mod source;

use thiserror::Error;

pub use config::{SCRIPTS_ROOT_ENV, scripts_root_path, set_scripts_root_path};
pub use device::{DeviceDescriptor, MountPoint};
pub use enumerator::Enumerator;
pub use platform::Platform;
pub use source::{OutputSource, ScriptRunner, SourceError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
/// Errors for this crate
pub enum Error {
    /// No script exists for this OS. Nothing was run.
    #[error("Your OS is not supported by this module: {0}")]
    UnsupportedPlatform(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Only returned by [`drive_list`]
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),
    /// [`drive_list`] was called from within an async runtime, use [`list`] there instead
    #[error("Cannot block on drive listing from within an async runtime")]
    InsideRuntime,
}

/// The script output could not be split into device records at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to parse {platform} drive list: {reason}")]
pub struct ParseError {
    platform: Platform,
    reason: String,
}

impl ParseError {
    pub(crate) fn new(platform: Platform, reason: impl Into<String>) -> Self {
        Self {
            platform,
            reason: reason.into(),
        }
    }

    pub const fn platform(&self) -> Platform {
        self.platform
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Get a list of all drives
pub async fn list() -> Result<Vec<DeviceDescriptor>> {
    Enumerator::new().list().await
}

/// Blocking version of [`list`].
///
/// Spins up its own runtime. Fails with [`Error::InsideRuntime`] when called from within an
/// async context.
pub fn drive_list() -> Result<Vec<DeviceDescriptor>> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::InsideRuntime);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    rt.block_on(list())
}
