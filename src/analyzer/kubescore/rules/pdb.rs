//! PodDisruptionBudget coverage and policy.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{PodDisruptionBudget, Workload};
use crate::analyzer::kubescore::types::{Grade, TestScore};
use anyhow::Context;

/// A replicated workload should be covered by a budget in its namespace.
pub fn workload_has_pdb<W: Workload>(workload: &W, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    if workload.replicas().is_some_and(|n| n < 2) {
        return Ok(TestScore::skipped(format!(
            "Skipped because the {} has less than 2 replicas",
            workload.kind_word()
        )));
    }

    let namespace = &workload.object_meta().namespace;
    let labels = &workload.pod_template().metadata.labels;

    let mut matched = false;
    for budget in ctx.objects.pdbs() {
        if budget.metadata.namespace != *namespace {
            continue;
        }
        // A budget without a selector selects nothing.
        let Some(selector) = &budget.spec.selector else {
            continue;
        };
        let hit = selector
            .matches(labels)
            .with_context(|| format!("invalid selector on PodDisruptionBudget {}", budget.metadata.name))?;
        if hit {
            matched = true;
            break;
        }
    }

    let mut score = TestScore::new(Grade::AllOk);
    if !matched {
        score.grade = Grade::Critical;
        score.add_comment(
            "",
            "No matching PodDisruptionBudget was found",
            "It's recommended to define a PodDisruptionBudget to avoid unexpected downtime during Kubernetes maintenance operations, such as when draining a node.",
        );
    }
    Ok(score)
}

pub fn pdb_has_policy(pdb: &PodDisruptionBudget, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    if pdb.spec.min_available.is_none() && pdb.spec.max_unavailable.is_none() {
        score.grade = Grade::Critical;
        score.add_comment(
            "",
            "PodDisruptionBudget missing policy",
            "PodDisruptionBudget should specify minAvailable or maxUnavailable.",
        );
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::context::{Deployment, K8sObject, StatefulSet};
    use crate::analyzer::kubescore::rules::tests::{find, parse};

    fn deployment(replicas: &str) -> String {
        format!(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
spec:
{replicas}
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: nginx:1
"#
        )
    }

    fn budget(namespace: &str, selector: &str) -> String {
        format!(
            r#"
---
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: web
  namespace: {namespace}
spec:
  minAvailable: 1
{selector}
"#
        )
    }

    fn run_deployment(yaml: &str) -> anyhow::Result<TestScore> {
        let objects = parse(yaml);
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        let d: &Deployment = find(&objects, |o| match o {
            K8sObject::Deployment(d) => Some(d.as_ref()),
            _ => None,
        });
        workload_has_pdb(d, &ctx)
    }

    const SELECT_WEB: &str = "  selector:\n    matchLabels:\n      app: web";

    #[test]
    fn test_single_replica_is_skipped() {
        let score = run_deployment(&deployment("  replicas: 1")).unwrap();
        assert!(score.skipped);
        assert_eq!(score.comments[0].summary, "Skipped because the deployment has less than 2 replicas");
    }

    #[test]
    fn test_unset_replicas_requires_budget() {
        let score = run_deployment(&deployment("")).unwrap();
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].summary, "No matching PodDisruptionBudget was found");
    }

    #[test]
    fn test_matching_budget() {
        let yaml = deployment("  replicas: 3") + &budget("prod", SELECT_WEB);
        assert_eq!(run_deployment(&yaml).unwrap().grade, Grade::AllOk);
    }

    #[test]
    fn test_budget_in_other_namespace_or_without_selector() {
        let yaml = deployment("  replicas: 3") + &budget("dev", SELECT_WEB);
        assert_eq!(run_deployment(&yaml).unwrap().grade, Grade::Critical);

        let yaml = deployment("  replicas: 3") + &budget("prod", "");
        assert_eq!(run_deployment(&yaml).unwrap().grade, Grade::Critical);
    }

    #[test]
    fn test_invalid_selector_is_a_rule_fault() {
        let selector = "  selector:\n    matchExpressions:\n      - key: app\n        operator: Near";
        let yaml = deployment("  replicas: 3") + &budget("prod", selector);
        let err = run_deployment(&yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("Near"), "{:#}", err);
    }

    #[test]
    fn test_statefulset_budget() {
        let yaml = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: db
spec:
  replicas: 1
  template:
    metadata:
      labels:
        app: db
    spec:
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
        let score = workload_has_pdb(s, &ctx).unwrap();
        assert_eq!(score.comments[0].summary, "Skipped because the statefulset has less than 2 replicas");
    }

    #[test]
    fn test_budget_policy() {
        let objects = parse(&budget("prod", SELECT_WEB));
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        let pdb = find(&objects, |o| match o {
            K8sObject::PodDisruptionBudget(p) => Some(p.as_ref()),
            _ => None,
        });
        assert_eq!(pdb_has_policy(pdb, &ctx).unwrap().grade, Grade::AllOk);

        let objects = parse(&budget("prod", SELECT_WEB).replace("  minAvailable: 1\n", ""));
        let ctx = ScoreContext { objects: &objects, config: &config };
        let pdb = find(&objects, |o| match o {
            K8sObject::PodDisruptionBudget(p) => Some(p.as_ref()),
            _ => None,
        });
        let score = pdb_has_policy(pdb, &ctx).unwrap();
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].summary, "PodDisruptionBudget missing policy");
    }
}
