//! Deprecated `apiVersion`s with a stable replacement.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::config::KubernetesVersion;
use crate::analyzer::kubescore::context::{Resource, TypeMeta};
use crate::analyzer::kubescore::types::{Grade, TestScore};

struct Replacement {
    api_version: &'static str,
    kind: &'static str,
    stable: &'static str,
    /// First Kubernetes version serving `stable`. `None` means it has
    /// always been available to any supported cluster.
    since: Option<KubernetesVersion>,
}

const fn always(api_version: &'static str, kind: &'static str, stable: &'static str) -> Replacement {
    Replacement {
        api_version,
        kind,
        stable,
        since: None,
    }
}

const fn since(
    api_version: &'static str,
    kind: &'static str,
    stable: &'static str,
    major: u32,
    minor: u32,
) -> Replacement {
    Replacement {
        api_version,
        kind,
        stable,
        since: Some(KubernetesVersion::new(major, minor)),
    }
}

const REPLACEMENTS: &[Replacement] = &[
    always("extensions/v1beta1", "Deployment", "apps/v1"),
    always("extensions/v1beta1", "DaemonSet", "apps/v1"),
    always("apps/v1beta1", "Deployment", "apps/v1"),
    always("apps/v1beta1", "StatefulSet", "apps/v1"),
    always("apps/v1beta2", "Deployment", "apps/v1"),
    always("apps/v1beta2", "StatefulSet", "apps/v1"),
    always("apps/v1beta2", "DaemonSet", "apps/v1"),
    since("extensions/v1beta1", "Ingress", "networking.k8s.io/v1", 1, 19),
    since("networking.k8s.io/v1beta1", "Ingress", "networking.k8s.io/v1", 1, 19),
    since("batch/v1beta1", "CronJob", "batch/v1", 1, 21),
    since("policy/v1beta1", "PodDisruptionBudget", "policy/v1", 1, 21),
    since("autoscaling/v2beta1", "HorizontalPodAutoscaler", "autoscaling/v2", 1, 23),
    since("autoscaling/v2beta2", "HorizontalPodAutoscaler", "autoscaling/v2", 1, 23),
];

/// The recommended replacement for `type_meta` on a cluster of `version`.
pub fn stable_replacement(type_meta: &TypeMeta, version: KubernetesVersion) -> Option<&'static str> {
    REPLACEMENTS
        .iter()
        .find(|r| {
            r.api_version == type_meta.api_version
                && r.kind == type_meta.kind
                && r.since.is_none_or(|since| version >= since)
        })
        .map(|r| r.stable)
}

pub fn stable_version(resource: &Resource, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let type_meta = resource.type_meta();
    let mut score = TestScore::new(Grade::AllOk);
    if let Some(stable) = stable_replacement(type_meta, ctx.config.kubernetes_version) {
        score.grade = Grade::Warning;
        score.add_comment(
            "",
            format!("The apiVersion and kind {} is deprecated", type_meta),
            format!("It's recommended to use {} instead", stable),
        );
    }
    Ok(score)
}
