//! NetworkPolicy coverage, in both directions: every pod should be selected
//! by a policy, and every policy should select a pod.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{NetworkPolicy, PodSpecer};
use crate::analyzer::kubescore::types::{Grade, TestScore};

pub fn pod_has_network_policy(pod: &dyn PodSpecer, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let template = pod.pod_template();
    let mut has_ingress = false;
    let mut has_egress = false;

    for policy in ctx.objects.network_policies() {
        if policy.metadata.namespace != template.metadata.namespace {
            continue;
        }
        if !policy.spec.pod_selector.matches(&template.metadata.labels)? {
            continue;
        }
        for policy_type in policy.spec.effective_policy_types() {
            match policy_type {
                "Ingress" => has_ingress = true,
                "Egress" => has_egress = true,
                _ => {}
            }
        }
    }

    let mut score = TestScore::new(Grade::AllOk);
    match (has_ingress, has_egress) {
        (true, true) => {}
        (false, true) => {
            score.grade = Grade::Warning;
            score.add_comment(
                "",
                "The pod does not have a matching ingress network policy",
                "Add a ingress policy to the pods NetworkPolicy",
            );
        }
        (true, false) => {
            score.grade = Grade::Warning;
            score.add_comment(
                "",
                "The pod does not have a matching egress network policy",
                "Add a egress policy to the pods NetworkPolicy",
            );
        }
        (false, false) => {
            score.grade = Grade::Critical;
            score.add_comment(
                "",
                "The pod does not have a matching network policy",
                "Create a NetworkPolicy that targets this pod",
            );
        }
    }
    Ok(score)
}

pub fn network_policy_targets_pod(policy: &NetworkPolicy, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut matched = false;
    for pod in ctx.objects.pod_specers() {
        let template = pod.pod_template();
        if template.metadata.namespace == policy.metadata.namespace
            && policy.spec.pod_selector.matches(&template.metadata.labels)?
        {
            matched = true;
            break;
        }
    }

    let mut score = TestScore::new(Grade::AllOk);
    if !matched {
        score.grade = Grade::Critical;
        score.add_comment("", "The NetworkPolicys selector doesn't match any pods", "");
    }
    Ok(score)
}
