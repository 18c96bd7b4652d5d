//! Run configuration for a scoring pass.
//!
//! - Which optional checks are enabled and which checks are ignored
//! - Whether `kube-score/ignore` and `kube-score/enable` annotations apply
//! - Limits a user has chosen to waive
//! - The target Kubernetes version used by the stable-version check

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid Kubernetes version {0:?}, expected a version like v1.18")]
    InvalidKubernetesVersion(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("config file {0} already exists, use --force to overwrite it")]
    AlreadyExists(PathBuf),
}

/// A `major.minor` Kubernetes version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KubernetesVersion {
    pub major: u32,
    pub minor: u32,
}

impl KubernetesVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for KubernetesVersion {
    fn default() -> Self {
        Self::new(1, 18)
    }
}

impl FromStr for KubernetesVersion {
    type Err = ConfigError;

    /// Accepts `v1.18`, `1.18` and `v1.18.3` (the patch is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidKubernetesVersion(s.to_string());
        let trimmed = s.trim();
        let version = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = version.split('.');
        let major = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let minor = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        if let Some(patch) = parts.next() {
            patch.parse::<u32>().map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for KubernetesVersion {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KubernetesVersion> for String {
    fn from(version: KubernetesVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Settings for one scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfiguration {
    /// Honour `kube-score/ignore` annotations.
    pub use_ignore_checks_annotation: bool,
    /// Honour `kube-score/enable` annotations.
    pub use_optional_checks_annotation: bool,
    /// Optional check ids to run.
    pub enabled_optional_checks: BTreeSet<String>,
    /// Check ids removed from the run entirely.
    pub ignored_checks: BTreeSet<String>,
    pub ignore_container_cpu_limit: bool,
    pub ignore_container_memory_limit: bool,
    pub kubernetes_version: KubernetesVersion,
    /// Minimum `minReplicas` an HPA should declare.
    pub min_replicas_hpa: i32,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            use_ignore_checks_annotation: true,
            use_optional_checks_annotation: true,
            enabled_optional_checks: BTreeSet::new(),
            ignored_checks: BTreeSet::new(),
            ignore_container_cpu_limit: false,
            ignore_container_memory_limit: false,
            kubernetes_version: KubernetesVersion::default(),
            min_replicas_hpa: 2,
        }
    }
}

impl RunConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable an optional check by id.
    pub fn enable_optional(mut self, id: impl Into<String>) -> Self {
        self.enabled_optional_checks.insert(id.into());
        self
    }

    /// Remove a check from the run by id.
    pub fn ignore(mut self, id: impl Into<String>) -> Self {
        self.ignored_checks.insert(id.into());
        self
    }

    pub fn with_kubernetes_version(mut self, version: KubernetesVersion) -> Self {
        self.kubernetes_version = version;
        self
    }

    pub fn with_min_replicas_hpa(mut self, min_replicas: i32) -> Self {
        self.min_replicas_hpa = min_replicas;
        self
    }

    pub fn without_ignore_annotations(mut self) -> Self {
        self.use_ignore_checks_annotation = false;
        self
    }

    pub fn without_optional_annotations(mut self) -> Self {
        self.use_optional_checks_annotation = false;
        self
    }

    pub fn waive_cpu_limit(mut self) -> Self {
        self.ignore_container_cpu_limit = true;
        self
    }

    pub fn waive_memory_limit(mut self) -> Self {
        self.ignore_container_memory_limit = true;
        self
    }

    pub fn is_optional_enabled(&self, id: &str) -> bool {
        self.enabled_optional_checks.contains(id)
    }

    pub fn is_ignored(&self, id: &str) -> bool {
        self.ignored_checks.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kubernetes_version() {
        assert_eq!("v1.18".parse::<KubernetesVersion>().unwrap(), KubernetesVersion::new(1, 18));
        assert_eq!("1.23".parse::<KubernetesVersion>().unwrap(), KubernetesVersion::new(1, 23));
        assert_eq!("v1.21.4".parse::<KubernetesVersion>().unwrap(), KubernetesVersion::new(1, 21));
        assert!("v1".parse::<KubernetesVersion>().is_err());
        assert!("one.two".parse::<KubernetesVersion>().is_err());
        assert!("v1.2.3.4".parse::<KubernetesVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(KubernetesVersion::new(1, 18) < KubernetesVersion::new(1, 19));
        assert!(KubernetesVersion::new(1, 23) >= KubernetesVersion::new(1, 23));
        assert_eq!(KubernetesVersion::default().to_string(), "v1.18");
    }

    #[test]
    fn test_defaults() {
        let config = RunConfiguration::default();
        assert!(config.use_ignore_checks_annotation);
        assert!(config.use_optional_checks_annotation);
        assert_eq!(config.min_replicas_hpa, 2);
        assert!(config.enabled_optional_checks.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = RunConfiguration::new()
            .enable_optional("container-ports-check")
            .ignore("container-image-tag")
            .waive_cpu_limit();
        assert!(config.is_optional_enabled("container-ports-check"));
        assert!(config.is_ignored("container-image-tag"));
        assert!(config.ignore_container_cpu_limit);
        assert!(!config.ignore_container_memory_limit);
    }
}
