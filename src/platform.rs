use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{DeviceDescriptor, ParseError};

/// Host platforms with a bundled enumeration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Macos,
    Linux,
}

impl Platform {
    /// Map an OS identifier, as found in [`std::env::consts::OS`], to a platform.
    pub fn from_os(os: &str) -> Option<Self> {
        match os {
            "windows" => Some(Self::Windows),
            "macos" => Some(Self::Macos),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Platform of the running host, if supported.
    pub fn current() -> Option<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub const fn script_name(self) -> &'static str {
        match self {
            Self::Windows => "win32.bat",
            Self::Macos => "darwin.sh",
            Self::Linux => "linux.sh",
        }
    }

    /// Location of the enumeration script under `root`.
    pub fn script_path(self, root: &Path) -> PathBuf {
        root.join(self.script_name())
    }

    /// Decode the stdout of this platform's script.
    pub fn parse(self, raw: &str) -> Result<Vec<DeviceDescriptor>, ParseError> {
        crate::pal::parse(self, raw)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        })
    }
}
