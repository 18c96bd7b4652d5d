//! Container security contexts.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::PodSpecer;
use crate::analyzer::kubescore::types::{Grade, TestScore};

/// User and group ids below this collide with host accounts.
const MIN_ID: i64 = 10000;

pub fn container_security_context(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let pod_context = pod.pod_spec().security_context.as_ref();
    let mut score = TestScore::new(Grade::AllOk);

    for container in pod.pod_spec().all_containers() {
        let Some(sec) = &container.security_context else {
            score.add_comment(
                &container.name,
                "Container has no configured security context",
                "Set securityContext to run the container is a more secure context.",
            );
            continue;
        };

        if sec.privileged == Some(true) {
            score.add_comment(
                &container.name,
                "The container is privileged",
                "Set securityContext.privileged to false",
            );
        }

        if sec.read_only_root_filesystem != Some(true) {
            score.add_comment(
                &container.name,
                "The pod has a container with a writable root filesystem",
                "Set securityContext.readOnlyRootFilesystem to true",
            );
        }

        let run_as_user = sec.run_as_user.or_else(|| pod_context.and_then(|p| p.run_as_user));
        if run_as_user.is_none_or(|uid| uid < MIN_ID) {
            score.add_comment(
                &container.name,
                "The container is running with a low user ID",
                "A userid above 10 000 is recommended to avoid conflicts with the host. Set securityContext.runAsUser to a value > 10000",
            );
        }

        let run_as_group = sec.run_as_group.or_else(|| pod_context.and_then(|p| p.run_as_group));
        if run_as_group.is_none_or(|gid| gid < MIN_ID) {
            score.add_comment(
                &container.name,
                "The container running with a low group ID",
                "A groupid above 10 000 is recommended to avoid conflicts with the host. Set securityContext.runAsGroup to a value > 10000",
            );
        }
    }

    if !score.comments.is_empty() {
        score.grade = Grade::Critical;
    }
    Ok(score)
}
