use std::path::{Path, PathBuf};

/// Renders `path` with `/` separators, whatever the platform.
///
/// Examples:
/// - `src/pages/home/home.js` → `"src/pages/home/home.js"`
/// - `src\pages\home\home.js` (Windows) → `"src/pages/home/home.js"`
pub fn to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// `path` relative to `base` in slash form, or `path` itself when it is not
/// under `base`.
pub fn relative_slash(path: &Path, base: &Path) -> String {
    to_slash(path.strip_prefix(base).unwrap_or(path))
}

/// Finds `program` on `PATH`.
///
/// On Windows the usual script and executable suffixes are tried as well.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    let suffixes: &[&str] = if cfg!(windows) {
        &["", ".exe", ".cmd", ".bat"]
    } else {
        &[""]
    };
    std::env::split_paths(&path).find_map(|dir| {
        suffixes
            .iter()
            .map(|s| dir.join(format!("{program}{s}")))
            .find(|candidate| candidate.is_file())
    })
}
