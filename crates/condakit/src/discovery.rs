//! Locating the conda executable.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Name of the executable searched for.
pub const EXECUTABLE_NAME: &str = "conda";

/// Well-known installation directory searched after `PATH`.
pub const FALLBACK_DIR: &str = "/opt/conda/bin";

/// Resolve the conda executable.
///
/// An explicit path is used as given. Otherwise `PATH` is searched,
/// followed by [`FALLBACK_DIR`].
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        log::debug!("Using conda executable from settings: {}", path.display());
        return Ok(path.to_path_buf());
    }
    find_in(std::env::var_os("PATH"), Path::new(FALLBACK_DIR))
}

/// Search `search_path` (a `PATH`-style list) and then `fallback_dir` for conda.
pub fn find_in(search_path: Option<OsString>, fallback_dir: &Path) -> Result<PathBuf> {
    let mut dirs: Vec<PathBuf> = search_path
        .as_deref()
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();
    dirs.push(fallback_dir.to_path_buf());

    let searched = std::env::join_paths(&dirs).map_err(|_| Error::ToolNotFound {
        searched: fallback_dir.display().to_string(),
    })?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));

    match which::which_in(EXECUTABLE_NAME, Some(&searched), cwd) {
        Ok(path) => {
            log::debug!("Found conda executable: {}", path.display());
            Ok(path)
        }
        Err(_) => Err(Error::ToolNotFound {
            searched: searched.to_string_lossy().to_string(),
        }),
    }
}
