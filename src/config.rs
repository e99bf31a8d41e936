//! Process-wide location of the enumeration scripts.
//!
//! The root is write-once: it can be set before the first enumeration (for example when the
//! scripts are bundled next to an application binary) and is read-only afterwards.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Environment variable consulted when no root was set explicitly.
pub const SCRIPTS_ROOT_ENV: &str = "DRIVELIST_SCRIPTS_ROOT";

static SCRIPTS_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Override where platform scripts are looked up.
///
/// Fails with the rejected path if the root was already set, or already read by an enumeration.
pub fn set_scripts_root_path(path: impl Into<PathBuf>) -> Result<(), PathBuf> {
    SCRIPTS_ROOT.set(path.into())
}

/// Directory holding the platform scripts.
pub fn scripts_root_path() -> &'static Path {
    SCRIPTS_ROOT.get_or_init(default_scripts_root)
}

fn default_scripts_root() -> PathBuf {
    match std::env::var_os(SCRIPTS_ROOT_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join("scripts"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_once() {
        let first = scripts_root_path().to_path_buf();
        assert!(!first.as_os_str().is_empty());

        let rejected = set_scripts_root_path("/somewhere/else").unwrap_err();
        assert_eq!(rejected, PathBuf::from("/somewhere/else"));
        assert_eq!(scripts_root_path(), first);
    }
}
