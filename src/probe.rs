use std::{fs, path::Path};

/// Filesystem existence check used to detect which trust layout a host has.
pub trait PathProber {
    fn exists(&self, path: &Path) -> bool;
}

/// Probes the real filesystem. Any error while checking counts as "missing".
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProber;

impl PathProber for SystemProber {
    fn exists(&self, path: &Path) -> bool {
        fs::exists(path).unwrap_or(false)
    }
}
