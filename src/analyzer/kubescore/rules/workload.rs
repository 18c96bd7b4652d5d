//! Checks on replicated controllers: scheduling spread, rollout strategy,
//! replica counts and revision history.
//!
//! Rules generic over [`Workload`] are registered once per kind.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{Deployment, PodAntiAffinity, PodAffinityTerm, Workload};
use crate::analyzer::kubescore::types::{Grade, TestScore};
use std::collections::BTreeMap;

const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

/// Maximum revisionHistoryLimit before a Deployment is flagged.
const MAX_REVISION_HISTORY: i32 = 5;

// ============================================================================
// Anti-affinity
// ============================================================================

/// Replicas should not be packed onto one node. An unset replica count is
/// still checked since it often means an autoscaler owns the count.
pub fn has_host_anti_affinity<W: Workload>(workload: &W, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let kind_word = workload.kind_word();
    let mut score = TestScore::new(Grade::AllOk);

    if workload.replicas().is_some_and(|n| n < 2) {
        score.add_comment(
            "",
            "Skipped",
            format!("Skipped because the {} has less than 2 replicas", kind_word),
        );
        return Ok(score);
    }

    let template = workload.pod_template();
    let anti_affinity = template
        .spec
        .affinity
        .as_ref()
        .and_then(|a| a.pod_anti_affinity.as_ref());

    if !anti_affinity.is_some_and(|a| selects_own_pods_per_host(a, &template.metadata.labels)) {
        score.grade = Grade::Warning;
        score.add_comment(
            "",
            format!("{} does not have a host podAntiAffinity set", workload.type_meta().kind),
            format!(
                "It's recommended to set a podAntiAffinity that stops multiple pods from a {} from being scheduled on the same node. This increases availability in case the node becomes unavailable.",
                kind_word
            ),
        );
    }
    Ok(score)
}

fn selects_own_pods_per_host(anti_affinity: &PodAntiAffinity, labels: &BTreeMap<String, String>) -> bool {
    let preferred = anti_affinity
        .preferred_during_scheduling_ignored_during_execution
        .iter()
        .map(|w| &w.pod_affinity_term);
    let required = anti_affinity.required_during_scheduling_ignored_during_execution.iter();

    preferred.chain(required).any(|term| term_selects_per_host(term, labels))
}

/// Terms with a missing or invalid selector never match.
fn term_selects_per_host(term: &PodAffinityTerm, labels: &BTreeMap<String, String>) -> bool {
    term.topology_key == HOSTNAME_TOPOLOGY_KEY
        && term
            .label_selector
            .as_ref()
            .is_some_and(|selector| selector.matches(labels).unwrap_or(false))
}

// ============================================================================
// Deployment only
// ============================================================================

pub fn deployment_strategy(deployment: &Deployment, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    if !ctx.objects.is_targeted_by_service(deployment) {
        return Ok(TestScore::skipped("Skipped as the Deployment is not targeted by a service"));
    }

    let mut score = TestScore::new(Grade::AllOk);
    let strategy = deployment.spec.strategy.strategy_type.as_str();
    if !strategy.is_empty() && strategy != "RollingUpdate" {
        score.grade = Grade::Warning;
        score.add_comment_with_url(
            "",
            "Deployment update strategy",
            "The deployment is used by a service but not using the RollingUpdate strategy which can cause interruptions. Set .spec.strategy.type to RollingUpdate.",
            "https://kubernetes.io/docs/concepts/workloads/controllers/deployment/#strategy",
        );
    }
    Ok(score)
}

pub fn deployment_replicas(deployment: &Deployment, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let objects = ctx.objects;
    if !objects.is_targeted_by_service(deployment)
        || objects.has_matching_hpa(&deployment.type_meta, &deployment.metadata)
    {
        return Ok(TestScore::skipped(
            "Skipped as the Deployment is not targeted by service or is controlled by a HorizontalPodAutoscaler",
        ));
    }

    let mut score = TestScore::new(Grade::AllOk);
    if deployment.spec.replicas.unwrap_or(1) < 2 {
        score.grade = Grade::Warning;
        score.add_comment(
            "",
            "Deployment few replicas",
            "Deployments targeted by Services are recommended to have at least 2 replicas to prevent unwanted downtime.",
        );
    }
    Ok(score)
}

pub fn revision_history_limit(deployment: &Deployment, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    const ADVICE: &str =
        "It's recommended to define a revisionHistoryLimit below 5 to avoid data storage impact";

    let mut score = TestScore::new(Grade::AllOk);
    match deployment.spec.revision_history_limit {
        None => {
            score.grade = Grade::Critical;
            score.add_comment("", "No revisionHistoryLimit Configuration was found", ADVICE);
        }
        Some(limit) if limit > MAX_REVISION_HISTORY => {
            score.grade = Grade::AlmostOk;
            score.add_comment("", "revisionHistoryLimit greater than 5", ADVICE);
        }
        Some(_) => {}
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::context::{K8sObject, ParsedObjects, StatefulSet};
    use crate::analyzer::kubescore::rules::tests::{find, parse};

    fn deployment_of(objects: &ParsedObjects) -> &Deployment {
        find(objects, |o| match o {
            K8sObject::Deployment(d) => Some(d.as_ref()),
            _ => None,
        })
    }

    fn run(yaml: &str, rule: fn(&Deployment, &ScoreContext<'_>) -> anyhow::Result<TestScore>) -> TestScore {
        let objects = parse(yaml);
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        rule(deployment_of(&objects), &ctx).unwrap()
    }

    fn deployment(spec: &str, pod_spec: &str) -> String {
        format!(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
{spec}
  template:
    metadata:
      labels:
        app: web
    spec:
{pod_spec}
      containers:
        - name: web
          image: nginx:1
"#
        )
    }

    const SERVICE: &str = r#"
---
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  selector:
    app: web
"#;

    const HPA: &str = r#"
---
apiVersion: autoscaling/v2
kind: HorizontalPodAutoscaler
metadata:
  name: web
spec:
  scaleTargetRef:
    apiVersion: apps/v1
    kind: Deployment
    name: web
  maxReplicas: 5
"#;

    const HOST_ANTI_AFFINITY: &str = r#"      affinity:
        podAntiAffinity:
          preferredDuringSchedulingIgnoredDuringExecution:
            - weight: 100
              podAffinityTerm:
                topologyKey: kubernetes.io/hostname
                labelSelector:
                  matchExpressions:
                    - key: app
                      operator: In
                      values: [web]"#;

    #[test]
    fn test_anti_affinity_single_replica_is_ok() {
        let score = run(&deployment("  replicas: 1", ""), has_host_anti_affinity::<Deployment>);
        assert_eq!(score.grade, Grade::AllOk);
        assert!(!score.skipped);
        assert_eq!(score.comments[0].summary, "Skipped");
        assert_eq!(
            score.comments[0].description,
            "Skipped because the deployment has less than 2 replicas"
        );
    }

    #[test]
    fn test_anti_affinity_missing() {
        let score = run(&deployment("  replicas: 3", ""), has_host_anti_affinity::<Deployment>);
        assert_eq!(score.grade, Grade::Warning);
        assert_eq!(score.comments[0].summary, "Deployment does not have a host podAntiAffinity set");
    }

    #[test]
    fn test_anti_affinity_preferred_host_term() {
        let yaml = deployment("  replicas: 3", HOST_ANTI_AFFINITY);
        let score = run(&yaml, has_host_anti_affinity::<Deployment>);
        assert_eq!(score.grade, Grade::AllOk, "{:?}", score.comments);
    }

    #[test]
    fn test_anti_affinity_wrong_topology_key() {
        let yaml = deployment(
            "  replicas: 3",
            &HOST_ANTI_AFFINITY.replace("kubernetes.io/hostname", "topology.kubernetes.io/zone"),
        );
        let score = run(&yaml, has_host_anti_affinity::<Deployment>);
        assert_eq!(score.grade, Grade::Warning);
    }

    #[test]
    fn test_statefulset_anti_affinity_message() {
        let yaml = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: db
spec:
  replicas: 3
  template:
    spec:
      affinity:
        podAntiAffinity:
          requiredDuringSchedulingIgnoredDuringExecution:
            - topologyKey: kubernetes.io/hostname
      containers:
        - name: db
          image: postgres:16
"#;
        let objects = parse(yaml);
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        let s: &StatefulSet = find(&objects, |o| match o {
            K8sObject::StatefulSet(s) => Some(s.as_ref()),
            _ => None,
        });
        let score = has_host_anti_affinity(s, &ctx).unwrap();
        assert_eq!(score.grade, Grade::Warning, "a term without a selector never matches");
        assert_eq!(score.comments[0].summary, "StatefulSet does not have a host podAntiAffinity set");
        assert!(score.comments[0].description.contains("from a statefulset from"));
    }

    #[test]
    fn test_strategy_requires_service() {
        let yaml = deployment("  strategy:\n    type: Recreate", "");
        let score = run(&yaml, deployment_strategy);
        assert!(score.skipped, "not targeted by a service");

        let score = run(&(yaml + SERVICE), deployment_strategy);
        assert_eq!(score.grade, Grade::Warning);
        assert_eq!(score.comments[0].summary, "Deployment update strategy");
        assert_eq!(
            score.comments[0].documentation_url,
            "https://kubernetes.io/docs/concepts/workloads/controllers/deployment/#strategy"
        );
    }

    #[test]
    fn test_strategy_unset_or_rolling_is_ok() {
        let score = run(&(deployment("", "") + SERVICE), deployment_strategy);
        assert_eq!(score.grade, Grade::AllOk);

        let rolling = deployment("  strategy:\n    type: RollingUpdate", "");
        assert_eq!(run(&(rolling + SERVICE), deployment_strategy).grade, Grade::AllOk);
    }

    #[test]
    fn test_replicas_targeted_by_service() {
        let score = run(&(deployment("", "") + SERVICE), deployment_replicas);
        assert_eq!(score.grade, Grade::Warning, "unset replicas means one");
        assert_eq!(score.comments[0].summary, "Deployment few replicas");

        let score = run(&(deployment("  replicas: 2", "") + SERVICE), deployment_replicas);
        assert_eq!(score.grade, Grade::AllOk);
    }

    #[test]
    fn test_replicas_skipped_with_hpa_or_without_service() {
        let score = run(&deployment("", ""), deployment_replicas);
        assert!(score.skipped);

        let score = run(&(deployment("", "") + SERVICE + HPA), deployment_replicas);
        assert!(score.skipped, "the autoscaler owns the replica count");
    }

    #[test]
    fn test_revision_history_limit() {
        let score = run(&deployment("", ""), revision_history_limit);
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].summary, "No revisionHistoryLimit Configuration was found");

        let score = run(&deployment("  revisionHistoryLimit: 10", ""), revision_history_limit);
        assert_eq!(score.grade, Grade::AlmostOk);

        let score = run(&deployment("  revisionHistoryLimit: 3", ""), revision_history_limit);
        assert_eq!(score.grade, Grade::AllOk);
        assert!(score.comments.is_empty());
    }
}
