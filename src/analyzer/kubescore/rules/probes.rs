//! Readiness and liveness probes.
//!
//! Probes only matter for pods that receive traffic, so the check is skipped
//! for batch workloads and for pods no Service selects. One probe of each
//! kind anywhere in the pod is enough.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::PodSpecer;
use crate::analyzer::kubescore::types::{Grade, TestScore};

const MISSING_READINESS: (&str, &str) = (
    "Container is missing a readinessProbe",
    "Without a readinessProbe Services will start sending traffic to this pod before it's ready",
);
const MISSING_LIVENESS: (&str, &str) = (
    "Container is missing a livenessProbe",
    "Without a livenessProbe kubelet can not restart the Pod if it has crashed",
);

pub fn pod_probes(pod: &dyn PodSpecer, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let kind = pod.type_meta().kind.as_str();
    if kind == "Job" || kind == "CronJob" {
        return Ok(TestScore::skipped("Skipped as the Pod is run by a Job or CronJob"));
    }
    if !ctx.objects.is_targeted_by_service(pod) {
        return Ok(TestScore::skipped("Skipped as the Pod is not targeted by service"));
    }

    let mut has_readiness = false;
    let mut has_liveness = false;
    let mut identical = false;

    for container in pod.pod_spec().all_containers() {
        has_readiness |= container.readiness_probe.is_some();
        has_liveness |= container.liveness_probe.is_some();
        if let (Some(readiness), Some(liveness)) = (&container.readiness_probe, &container.liveness_probe) {
            identical |= readiness.handler.targets_same_as(&liveness.handler);
        }
    }

    let mut score = TestScore::new(Grade::AllOk);
    match (has_readiness, has_liveness) {
        (true, true) if identical => {
            score.grade = Grade::AlmostOk;
            score.add_comment(
                "",
                "Pod has the same readiness and liveness probe",
                "It's recommended to have different probes for the two different purposes.",
            );
        }
        (true, true) => {}
        (false, false) => {
            score.grade = Grade::Critical;
            score.add_comment("", MISSING_READINESS.0, MISSING_READINESS.1);
            score.add_comment("", MISSING_LIVENESS.0, MISSING_LIVENESS.1);
        }
        (false, true) => {
            score.grade = Grade::Critical;
            score.add_comment("", MISSING_READINESS.0, MISSING_READINESS.1);
        }
        (true, false) => {
            score.grade = Grade::Warning;
            score.add_comment("", "Pod is missing a livenessProbe", MISSING_LIVENESS.1);
        }
    }
    Ok(score)
}
