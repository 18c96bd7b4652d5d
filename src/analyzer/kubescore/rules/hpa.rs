//! HorizontalPodAutoscaler checks.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::HorizontalPodAutoscaler;
use crate::analyzer::kubescore::types::{Grade, TestScore};

pub fn hpa_has_target(hpa: &HorizontalPodAutoscaler, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let target = &hpa.spec.scale_target_ref;
    let found = ctx.objects.resources().iter().any(|resource| {
        let type_meta = resource.type_meta();
        let meta = resource.object_meta();
        type_meta.api_version == target.api_version
            && type_meta.kind == target.kind
            && meta.name == target.name
            && meta.namespace == hpa.metadata.namespace
    });

    let mut score = TestScore::new(Grade::AllOk);
    if !found {
        score.grade = Grade::Critical;
        score.add_comment("", "The HPA target does not match anything", "");
    }
    Ok(score)
}

pub fn hpa_has_multiple_replicas(hpa: &HorizontalPodAutoscaler, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let min_replicas = hpa.spec.min_replicas.unwrap_or(1);
    let wanted = ctx.config.min_replicas_hpa;

    let mut score = TestScore::new(Grade::AllOk);
    if min_replicas < wanted {
        score.grade = Grade::Warning;
        score.add_comment(
            "",
            "HPA few replicas",
            format!(
                "HorizontalPodAutoscalers are recommended to have at least {} replicas to prevent unwanted downtime.",
                wanted
            ),
        );
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::context::K8sObject;
    use crate::analyzer::kubescore::rules::tests::{find, parse};

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
spec:
  template:
    spec:
      containers:
        - name: web
          image: nginx:1
---
"#;

    fn hpa(namespace: &str, api_version: &str, min_replicas: Option<i32>) -> String {
        let min = min_replicas.map(|n| format!("  minReplicas: {}\n", n)).unwrap_or_default();
        format!(
            r#"apiVersion: autoscaling/v2
kind: HorizontalPodAutoscaler
metadata:
  name: web
  namespace: {namespace}
spec:
  scaleTargetRef:
    apiVersion: {api_version}
    kind: Deployment
    name: web
  maxReplicas: 10
{min}"#
        )
    }

    fn run(
        yaml: &str,
        config: &RunConfiguration,
        rule: fn(&HorizontalPodAutoscaler, &ScoreContext<'_>) -> anyhow::Result<TestScore>,
    ) -> TestScore {
        let objects = parse(yaml);
        let ctx = ScoreContext { objects: &objects, config };
        let hpa = find(&objects, |o| match o {
            K8sObject::HorizontalPodAutoscaler(h) => Some(h.as_ref()),
            _ => None,
        });
        rule(hpa, &ctx).unwrap()
    }

    #[test]
    fn test_target_found() {
        let yaml = DEPLOYMENT.to_string() + &hpa("prod", "apps/v1", Some(2));
        let score = run(&yaml, &RunConfiguration::default(), hpa_has_target);
        assert_eq!(score.grade, Grade::AllOk);
    }

    #[test]
    fn test_target_requires_namespace_and_api_version() {
        let config = RunConfiguration::default();
        let yaml = DEPLOYMENT.to_string() + &hpa("dev", "apps/v1", Some(2));
        let score = run(&yaml, &config, hpa_has_target);
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].summary, "The HPA target does not match anything");

        let yaml = DEPLOYMENT.to_string() + &hpa("prod", "apps/v1beta1", Some(2));
        assert_eq!(run(&yaml, &config, hpa_has_target).grade, Grade::Critical);
    }

    #[test]
    fn test_min_replicas_defaults_to_one() {
        let yaml = hpa("prod", "apps/v1", None);
        let score = run(&yaml, &RunConfiguration::default(), hpa_has_multiple_replicas);
        assert_eq!(score.grade, Grade::Warning);
        assert_eq!(
            score.comments[0].description,
            "HorizontalPodAutoscalers are recommended to have at least 2 replicas to prevent unwanted downtime."
        );
    }

    #[test]
    fn test_min_replicas_threshold_is_configurable() {
        let yaml = hpa("prod", "apps/v1", Some(3));
        let default = RunConfiguration::default();
        assert_eq!(run(&yaml, &default, hpa_has_multiple_replicas).grade, Grade::AllOk);

        let strict = RunConfiguration::default().with_min_replicas_hpa(5);
        let score = run(&yaml, &strict, hpa_has_multiple_replicas);
        assert_eq!(score.grade, Grade::Warning);
        assert!(score.comments[0].description.contains("at least 5 replicas"));
    }
}
