pub mod types;

use crate::analyzer::kubescore::ConfigError;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".kube-score.toml";

/// Get the local config file path (./.kube-score.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Pick the config file to use: an explicit path always wins, then the
/// file in `dir`, then the one in `home`.
pub fn find_config_file(explicit: Option<&Path>, dir: &Path, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = local_config_path(dir);
    if local.exists() {
        return Some(local);
    }

    home.map(|h| h.join(CONFIG_FILE_NAME)).filter(|global| global.exists())
}

/// Read and parse one config file.
pub fn read_config(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Load configuration from file or use defaults.
/// Checks the explicit path, then the current directory, then the home directory.
pub fn load_config(explicit: Option<&Path>) -> Result<types::Config> {
    let cwd = std::env::current_dir()?;
    let home = dirs::home_dir();
    match find_config_file(explicit, &cwd, home.as_deref()) {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            read_config(&path)
        }
        None => {
            log::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
            Ok(types::Config::default())
        }
    }
}

/// Write the default configuration to `path`.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()).into());
    }

    let content = toml::to_string_pretty(&types::Config::default())
        .map_err(|e| ConfigError::Serialize(e.to_string()))?;
    fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::KubernetesVersion;
    use tempfile::TempDir;

    #[test]
    fn test_read_kebab_case_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
enable-optional-test = ["container-ports-check"]
ignore-test = ["container-image-tag"]
ignore-container-cpu-limit = true
kubernetes-version = "v1.24"
"#,
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.enable_optional_test, vec!["container-ports-check"]);
        assert!(config.ignore_container_cpu_limit);
        assert_eq!(config.min_replicas_hpa, 2, "unset keys keep their defaults");

        let run = config.to_run_configuration();
        assert!(run.is_optional_enabled("container-ports-check"));
        assert!(run.is_ignored("container-image-tag"));
        assert_eq!(run.kubernetes_version, KubernetesVersion::new(1, 24));
        assert!(run.use_ignore_checks_annotation);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "kubernetes-version = \"latest\"\n").unwrap();
        assert!(read_config(&path).is_err());
        assert!(read_config(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_lookup_order() {
        let cwd = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let explicit = PathBuf::from("/etc/kube-score.toml");

        assert_eq!(find_config_file(None, cwd.path(), Some(home.path())), None);

        let global = home.path().join(CONFIG_FILE_NAME);
        fs::write(&global, "").unwrap();
        assert_eq!(find_config_file(None, cwd.path(), Some(home.path())), Some(global));

        let local = cwd.path().join(CONFIG_FILE_NAME);
        fs::write(&local, "").unwrap();
        assert_eq!(find_config_file(None, cwd.path(), Some(home.path())), Some(local));

        assert_eq!(
            find_config_file(Some(explicit.as_path()), cwd.path(), Some(home.path())),
            Some(explicit)
        );
    }

    #[test]
    fn test_write_default_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        write_default_config(&path, false).unwrap();
        let written = read_config(&path).unwrap();
        assert_eq!(written, types::Config::default());

        assert!(write_default_config(&path, false).is_err());
        assert!(write_default_config(&path, true).is_ok());
    }
}
