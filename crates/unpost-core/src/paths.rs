use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const UNPOST_DIR: &str = ".unpost";
pub const CONFIG_FILE: &str = ".unpost/config.yaml";
pub const CHECKPOINT_FILE: &str = ".unpost/checkpoint.json";
pub const USAGE_FILE: &str = ".unpost/usage.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn unpost_dir(root: &Path) -> PathBuf {
    root.join(UNPOST_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn checkpoint_path(root: &Path) -> PathBuf {
    root.join(CHECKPOINT_FILE)
}

pub fn usage_path(root: &Path) -> PathBuf {
    root.join(USAGE_FILE)
}
