use crate::analyzer::kubescore::{KubernetesVersion, RunConfiguration};
use serde::{Deserialize, Serialize};

/// Contents of a `.kube-score.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Optional check ids to enable.
    pub enable_optional_test: Vec<String>,
    /// Check ids to remove from the run.
    pub ignore_test: Vec<String>,
    pub ignore_container_cpu_limit: bool,
    pub ignore_container_memory_limit: bool,
    pub disable_ignore_checks_annotations: bool,
    pub disable_optional_checks_annotations: bool,
    pub exit_one_on_warning: bool,
    pub kubernetes_version: KubernetesVersion,
    pub min_replicas_hpa: i32,
}

impl Default for Config {
    fn default() -> Self {
        let run = RunConfiguration::default();
        Self {
            enable_optional_test: Vec::new(),
            ignore_test: Vec::new(),
            ignore_container_cpu_limit: run.ignore_container_cpu_limit,
            ignore_container_memory_limit: run.ignore_container_memory_limit,
            disable_ignore_checks_annotations: !run.use_ignore_checks_annotation,
            disable_optional_checks_annotations: !run.use_optional_checks_annotation,
            exit_one_on_warning: false,
            kubernetes_version: run.kubernetes_version,
            min_replicas_hpa: run.min_replicas_hpa,
        }
    }
}

impl Config {
    /// The engine settings described by this file.
    pub fn to_run_configuration(&self) -> RunConfiguration {
        let mut run = RunConfiguration::new()
            .with_kubernetes_version(self.kubernetes_version)
            .with_min_replicas_hpa(self.min_replicas_hpa);
        run.enabled_optional_checks.extend(self.enable_optional_test.iter().cloned());
        run.ignored_checks.extend(self.ignore_test.iter().cloned());
        run.ignore_container_cpu_limit = self.ignore_container_cpu_limit;
        run.ignore_container_memory_limit = self.ignore_container_memory_limit;
        run.use_ignore_checks_annotation = !self.disable_ignore_checks_annotations;
        run.use_optional_checks_annotation = !self.disable_optional_checks_annotations;
        run
    }
}
