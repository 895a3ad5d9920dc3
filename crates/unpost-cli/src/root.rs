use std::path::{Path, PathBuf};
use unpost_core::paths::UNPOST_DIR;

/// Resolve the directory that holds `.unpost/`.
///
/// Priority:
/// 1. `--root` flag / `UNPOST_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.unpost/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd).unwrap_or(cwd)
}

fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(UNPOST_DIR).is_dir())
        .map(Path::to_path_buf)
}
