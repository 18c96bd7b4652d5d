//! Registration of every built-in check.
//!
//! Order matters: it is the order of `kube-score list` and of the checks
//! within each scored object.

use super::{CheckRegistry, CheckSpec, RegistryError, Rule};
use crate::analyzer::kubescore::context::{Deployment, StatefulSet};
use crate::analyzer::kubescore::rules::{
    container, cronjob, hpa, ingress, meta, networkpolicy, pdb, probes, security, service, stable, topology,
    workload,
};

const ANTI_AFFINITY_COMMENT: &str = "Makes sure that a podAntiAffinity has been set that prevents multiple pods from being scheduled on the same node. https://kubernetes.io/docs/concepts/configuration/assign-pod-node/";

/// Register the built-in catalogue into `registry`.
pub fn register_all(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    register_meta(registry)?;
    register_containers(registry)?;
    register_pods(registry)?;
    register_workloads(registry)?;
    register_networking(registry)?;
    register_scaling(registry)?;
    Ok(())
}

fn register_meta(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new("Stable version", "Checks if the object is using a deprecated apiVersion"),
        Rule::meta(stable::stable_version),
    )?;
    registry.register(
        CheckSpec::new("Label values", "Validates label values"),
        Rule::meta(meta::label_values),
    )
}

fn register_containers(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new(
            "Container Resources",
            "Makes sure that all pods have resource limits and requests set. The --ignore-container-cpu-limit flag can be used to disable the requirement of having a CPU limit",
        ),
        Rule::pod_template(container::container_resources),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Resource Requests Equal Limits",
            "Makes sure that all pods have the same requests as limits on resources set.",
        )
        .optional(),
        Rule::pod_template(container::resource_requests_equal_limits),
    )?;
    registry.register(
        CheckSpec::new(
            "Container CPU Requests Equal Limits",
            "Makes sure that all pods have the same CPU requests as limits set.",
        )
        .optional(),
        Rule::pod_template(container::cpu_requests_equal_limits),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Memory Requests Equal Limits",
            "Makes sure that all pods have the same memory requests as limits set.",
        )
        .optional(),
        Rule::pod_template(container::memory_requests_equal_limits),
    )?;
    registry.register(
        CheckSpec::new("Container Image Tag", "Makes sure that a explicit non-latest tag is used"),
        Rule::pod_template(container::image_tag),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Image Pull Policy",
            "Makes sure that the pullPolicy is set to Always. This makes sure that imagePullSecrets are always validated.",
        ),
        Rule::pod_template(container::image_pull_policy),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Ephemeral Storage Request and Limit",
            "Makes sure all pods have ephemeral-storage requests and limits set",
        ),
        Rule::pod_template(container::ephemeral_storage_request_and_limit),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Ephemeral Storage Request Equals Limit",
            "Make sure all pods have matching ephemeral-storage requests and limits",
        )
        .optional(),
        Rule::pod_template(container::ephemeral_storage_request_equals_limit),
    )?;
    registry.register(
        CheckSpec::new("Container Ports Check", "Container Ports Checks").optional(),
        Rule::pod_template(container::ports_check),
    )?;
    registry.register(
        CheckSpec::new(
            "Environment Variable Key Duplication",
            "Makes sure that duplicated environment variable keys are not duplicated",
        ),
        Rule::pod_template(container::environment_variable_key_duplication),
    )
}

fn register_pods(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new(
            "Pod Probes",
            "Makes sure that all Pods have safe probe configurations",
        ),
        Rule::pod_template(probes::pod_probes),
    )?;
    registry.register(
        CheckSpec::new(
            "Pod NetworkPolicy",
            "Makes sure that all Pods are targeted by a NetworkPolicy",
        ),
        Rule::pod_template(networkpolicy::pod_has_network_policy),
    )?;
    registry.register(
        CheckSpec::new(
            "Container Security Context",
            "Makes sure that all pods have good securityContexts configured",
        ),
        Rule::pod_template(security::container_security_context),
    )?;
    registry.register(
        CheckSpec::new("Pod Topology Spread Constraints", "Pod Topology Spread Constraints"),
        Rule::pod_template(topology::topology_spread_constraints),
    )
}

fn register_workloads(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new("Deployment has host PodAntiAffinity", ANTI_AFFINITY_COMMENT),
        Rule::deployment(workload::has_host_anti_affinity::<Deployment>),
    )?;
    registry.register(
        CheckSpec::new("StatefulSet has host PodAntiAffinity", ANTI_AFFINITY_COMMENT),
        Rule::statefulset(workload::has_host_anti_affinity::<StatefulSet>),
    )?;
    registry.register(
        CheckSpec::new(
            "Deployment has PodDisruptionBudget",
            "Makes sure that all Deployments are targeted by a PDB",
        ),
        Rule::deployment(pdb::workload_has_pdb::<Deployment>),
    )?;
    registry.register(
        CheckSpec::new(
            "StatefulSet has PodDisruptionBudget",
            "Makes sure that all StatefulSets are targeted by a PDB",
        ),
        Rule::statefulset(pdb::workload_has_pdb::<StatefulSet>),
    )?;
    registry.register(
        CheckSpec::new(
            "Deployment Strategy",
            "Makes sure that all Deployments targeted by service use RollingUpdate strategy",
        ),
        Rule::deployment(workload::deployment_strategy),
    )?;
    registry.register(
        CheckSpec::new("Deployment Replicas", "Makes sure that Deployment has multiple replicas"),
        Rule::deployment(workload::deployment_replicas),
    )?;
    registry.register(
        CheckSpec::new(
            "Deployment sets revisionHistoryLimit",
            "Makes sure that all Deployments set a limit",
        )
        .optional(),
        Rule::deployment(workload::revision_history_limit),
    )?;
    registry.register(
        CheckSpec::new("CronJob has deadline", "Makes sure that all CronJobs has a configured deadline"),
        Rule::cronjob(cronjob::cronjob_has_deadline),
    )
}

fn register_networking(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new("Service Targets Pod", "Makes sure that all Services targets a Pod"),
        Rule::service(service::service_targets_pod),
    )?;
    registry.register(
        CheckSpec::new("Service Type", "Makes sure that the Service type is not NodePort"),
        Rule::service(service::service_type),
    )?;
    registry.register(
        CheckSpec::new(
            "NetworkPolicy targets Pod",
            "Makes sure that all NetworkPolicies targets at least one Pod",
        ),
        Rule::network_policy(networkpolicy::network_policy_targets_pod),
    )?;
    registry.register(
        CheckSpec::new("Ingress targets Service", "Makes sure that the Ingress targets a Service"),
        Rule::ingress(ingress::ingress_targets_service),
    )
}

fn register_scaling(registry: &mut CheckRegistry) -> Result<(), RegistryError> {
    registry.register(
        CheckSpec::new(
            "HorizontalPodAutoscaler has target",
            "Makes sure that the HPA targets a valid object",
        ),
        Rule::hpa(hpa::hpa_has_target),
    )?;
    registry.register(
        CheckSpec::new(
            "HorizontalPodAutoscaler Replicas",
            "Makes sure that the HPA has multiple replicas",
        ),
        Rule::hpa(hpa::hpa_has_multiple_replicas),
    )?;
    registry.register(
        CheckSpec::new(
            "PodDisruptionBudget has policy",
            "Makes sure that PodDisruptionBudgets specify minAvailable or maxUnavailable",
        ),
        Rule::pdb(pdb::pdb_has_policy),
    )
}
