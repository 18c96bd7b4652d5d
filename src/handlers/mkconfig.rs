use crate::config::{self, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

/// Write a default `.kube-score.toml` to `path`, or to the current
/// directory when no path is given.
pub fn handle_mkconfig(path: Option<&Path>, force: bool) -> crate::Result<()> {
    let target = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    config::write_default_config(&target, force)?;
    println!("Wrote default configuration to {}", target.display());
    Ok(())
}
