//! Per-container checks: resources, image tag and pull policy, ephemeral
//! storage, ports and environment variables.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::PodSpecer;
use crate::analyzer::kubescore::types::{Grade, TestScore};
use std::collections::HashSet;

const CPU: &str = "cpu";
const MEMORY: &str = "memory";
const EPHEMERAL_STORAGE: &str = "ephemeral-storage";

/// Limits and requests for cpu and memory. Limits can be waived through the
/// run configuration.
pub fn container_resources(pod: &dyn PodSpecer, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let require_cpu_limit = !ctx.config.ignore_container_cpu_limit;
    let require_memory_limit = !ctx.config.ignore_container_memory_limit;

    let mut score = TestScore::new(Grade::AllOk);
    let mut has_containers = false;
    let mut missing_limit = false;
    let mut missing_request = false;

    for container in pod.pod_spec().all_containers() {
        has_containers = true;
        let resources = &container.resources;

        if require_cpu_limit && !resources.has_limit(CPU) {
            score.add_comment(
                &container.name,
                "CPU limit is not set",
                "Resource limits are recommended to avoid resource DDOS. Set resources.limits.cpu",
            );
            missing_limit = true;
        }
        if require_memory_limit && !resources.has_limit(MEMORY) {
            score.add_comment(
                &container.name,
                "Memory limit is not set",
                "Resource limits are recommended to avoid resource DDOS. Set resources.limits.memory",
            );
            missing_limit = true;
        }
        if !resources.has_request(CPU) {
            score.add_comment(
                &container.name,
                "CPU request is not set",
                "Resource requests are recommended to make sure that the application can start and run without crashing. Set resources.requests.cpu",
            );
            missing_request = true;
        }
        if !resources.has_request(MEMORY) {
            score.add_comment(
                &container.name,
                "Memory request is not set",
                "Resource requests are recommended to make sure that the application can start and run without crashing. Set resources.requests.memory",
            );
            missing_request = true;
        }
    }

    if !has_containers {
        score.grade = Grade::Critical;
        score.add_comment("", "No containers defined", "");
    } else if missing_limit {
        score.grade = Grade::Critical;
    } else if missing_request {
        score.grade = Grade::Warning;
    }
    Ok(score)
}

fn requests_equal_limits(pod: &dyn PodSpecer, resource: &str, summary: &str, description: &str) -> TestScore {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        if !container.resources.request_equals_limit(resource) {
            score.add_comment(&container.name, summary, description);
            score.grade = Grade::Critical;
        }
    }
    score
}

pub fn cpu_requests_equal_limits(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    Ok(requests_equal_limits(
        pod,
        CPU,
        "CPU requests does not match limits",
        "Having equal requests and limits is recommended to avoid resource DDOS of the node during spikes. Set resources.requests.cpu == resources.limits.cpu",
    ))
}

pub fn memory_requests_equal_limits(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    Ok(requests_equal_limits(
        pod,
        MEMORY,
        "Memory requests does not match limits",
        "Having equal requests and limits is recommended to avoid resource DDOS of the node during spikes. Set resources.requests.memory == resources.limits.memory",
    ))
}

/// The cpu and memory variants combined into one score.
pub fn resource_requests_equal_limits(pod: &dyn PodSpecer, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for partial in [cpu_requests_equal_limits(pod, ctx)?, memory_requests_equal_limits(pod, ctx)?] {
        if partial.grade == Grade::Critical {
            score.grade = Grade::Critical;
            score.comments.extend(partial.comments);
        }
    }
    Ok(score)
}

pub fn image_tag(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        if is_latest(container.image_tag()) {
            score.add_comment(
                &container.name,
                "Image with latest tag",
                "Using a fixed tag is recommended to avoid accidental upgrades",
            );
            score.grade = Grade::Critical;
        }
    }
    Ok(score)
}

pub fn image_pull_policy(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        let policy = container.image_pull_policy.as_str();
        // Kubernetes defaults to Always for untagged and latest images.
        if policy.is_empty() && is_latest(container.image_tag()) {
            continue;
        }
        if policy != "Always" {
            score.add_comment(
                &container.name,
                "ImagePullPolicy is not set to Always",
                "It's recommended to always set the ImagePullPolicy to Always, to make sure that the imagePullSecrets are always correct, and to always get the image you want.",
            );
            score.grade = Grade::Critical;
        }
    }
    Ok(score)
}

fn is_latest(tag: &str) -> bool {
    tag.is_empty() || tag == "latest"
}

pub fn ephemeral_storage_request_and_limit(
    pod: &dyn PodSpecer,
    _ctx: &ScoreContext<'_>,
) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        let resources = &container.resources;
        if !resources.has_limit(EPHEMERAL_STORAGE) {
            score.add_comment(
                &container.name,
                "Ephemeral Storage limit is not set",
                "Resource limits are recommended to avoid resource DDOS. Set resources.limits.ephemeral-storage",
            );
            score.grade = Grade::Critical;
        } else if !resources.has_request(EPHEMERAL_STORAGE) {
            score.add_comment(
                &container.name,
                "Ephemeral Storage request is not set",
                "Resource requests are recommended to make sure the application can start and run without crashing. Set resource.requests.ephemeral-storage",
            );
            score.downgrade(Grade::Warning);
        }
    }
    Ok(score)
}

pub fn ephemeral_storage_request_equals_limit(
    pod: &dyn PodSpecer,
    _ctx: &ScoreContext<'_>,
) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        let resources = &container.resources;
        if resources.has_limit(EPHEMERAL_STORAGE)
            && resources.has_request(EPHEMERAL_STORAGE)
            && !resources.request_equals_limit(EPHEMERAL_STORAGE)
        {
            score.add_comment(
                &container.name,
                "Ephemeral Storage request does not match limit",
                "Having equal requests and limits is recommended to avoid node resource DDOS during spikes",
            );
            score.grade = Grade::Critical;
        }
    }
    Ok(score)
}

pub fn ports_check(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        let mut names = HashSet::new();
        for port in &container.ports {
            if !port.name.is_empty() && !names.insert(port.name.as_str()) {
                score.add_comment(
                    &container.name,
                    "Container Port Check",
                    "Container ports.containerPort named ports must be unique",
                );
                score.grade = Grade::Critical;
            }
            if port.container_port == 0 {
                score.add_comment(
                    &container.name,
                    "Container Port Check",
                    "Container ports.containerPort cannot be empty",
                );
                score.grade = Grade::Critical;
            }
        }
    }
    Ok(score)
}

pub fn environment_variable_key_duplication(
    pod: &dyn PodSpecer,
    _ctx: &ScoreContext<'_>,
) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for container in pod.pod_spec().all_containers() {
        let mut seen = HashSet::new();
        for env in &container.env {
            if !seen.insert(env.name.as_str()) {
                score.add_comment(
                    &container.name,
                    "Environment Variable Key Duplication",
                    format!("Container environment variable key '{}' is duplicated", env.name),
                );
                score.grade = Grade::Critical;
            }
        }
    }
    Ok(score)
}
