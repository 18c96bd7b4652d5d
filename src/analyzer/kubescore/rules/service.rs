//! Service checks.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{LabelSelector, Service};
use crate::analyzer::kubescore::types::{Grade, TestScore};

/// A Service without a selector in the same namespace as a pod selects it,
/// matching how an empty selector is treated elsewhere. ExternalName
/// services select nothing by design and always pass.
pub fn service_targets_pod(service: &Service, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    if service.spec.service_type == "ExternalName" {
        return Ok(TestScore::new(Grade::AllOk));
    }

    let selector = LabelSelector {
        match_labels: service.spec.selector.clone(),
        ..Default::default()
    };

    let mut matched = false;
    for pod in ctx.objects.pod_specers() {
        let template = pod.pod_template();
        if template.metadata.namespace == service.metadata.namespace
            && selector.matches(&template.metadata.labels)?
        {
            matched = true;
            break;
        }
    }

    let mut score = TestScore::new(Grade::AllOk);
    if !matched {
        score.grade = Grade::Critical;
        score.add_comment("", "The services selector does not match any pods", "");
    }
    Ok(score)
}

pub fn service_type(service: &Service, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    if service.spec.service_type == "NodePort" {
        score.grade = Grade::Warning;
        score.add_comment(
            "",
            "The service is of type NodePort",
            "NodePort services should be avoided as they are insecure, and can not be used together with NetworkPolicies. LoadBalancers or use of an Ingress is recommended over NodePorts.",
        );
    }
    Ok(score)
}
