use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{PodSpecer, TopologySpreadConstraint};
use crate::analyzer::kubescore::types::{Grade, TestScore};

const SUMMARY: &str = "Pod Topology Spread Constraints";

/// Reports the first invalid constraint only.
pub fn topology_spread_constraints(pod: &dyn PodSpecer, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);

    let Some(constraints) = &pod.pod_spec().topology_spread_constraints else {
        score.add_comment(
            "",
            SUMMARY,
            "No Pod Topology Spread Constraints set, kube-scheduler defaults assumed",
        );
        return Ok(score);
    };

    if let Some(problem) = constraints.iter().find_map(constraint_problem) {
        score.grade = Grade::Critical;
        score.add_comment("", SUMMARY, problem);
    }
    Ok(score)
}

fn constraint_problem(constraint: &TopologySpreadConstraint) -> Option<&'static str> {
    if constraint.label_selector.is_none() {
        return Some(
            "No labelSelector detected. A label selector is needed determine the number of pods in a topology domain",
        );
    }
    if constraint.max_skew == 0 {
        return Some("MaxSkew is set to zero. This is not allowed.");
    }
    if constraint.min_domains == Some(0) {
        return Some("MaxDomain set to zero. This is not allowed. Constraint behaves if minDomains is set to 1 if nil");
    }
    if constraint.topology_key.is_empty() {
        return Some("TopologyKey is not set. This is the key of node labels used to bucket nodes into a domain");
    }
    if !matches!(constraint.when_unsatisfiable.as_str(), "DoNotSchedule" | "ScheduleAnyway") {
        return Some("Invalid WhenUnsatisfiable setting detected");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::rules::tests::{first_pod, parse};

    fn run(constraints: &str) -> TestScore {
        let yaml = format!(
            r#"
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
{constraints}
  containers:
    - name: web
      image: nginx:1
"#
        );
        let objects = parse(&yaml);
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        topology_spread_constraints(first_pod(&objects), &ctx).unwrap()
    }

    #[test]
    fn test_no_constraints_assumes_defaults() {
        let score = run("");
        assert_eq!(score.grade, Grade::AllOk);
        assert_eq!(
            score.comments[0].description,
            "No Pod Topology Spread Constraints set, kube-scheduler defaults assumed"
        );
    }

    #[test]
    fn test_valid_constraint() {
        let score = run(r#"  topologySpreadConstraints:
    - maxSkew: 1
      topologyKey: topology.kubernetes.io/zone
      whenUnsatisfiable: DoNotSchedule
      labelSelector:
        matchLabels:
          app: web"#);
        assert_eq!(score.grade, Grade::AllOk);
        assert!(score.comments.is_empty());
    }

    #[test]
    fn test_first_problem_wins() {
        let score = run(r#"  topologySpreadConstraints:
    - maxSkew: 0
      topologyKey: ""
      whenUnsatisfiable: Sometimes
      labelSelector:
        matchLabels:
          app: web"#);
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments.len(), 1);
        assert_eq!(score.comments[0].description, "MaxSkew is set to zero. This is not allowed.");
    }

    #[test]
    fn test_missing_selector_and_bad_policy() {
        let score = run(r#"  topologySpreadConstraints:
    - maxSkew: 1
      topologyKey: zone
      whenUnsatisfiable: DoNotSchedule"#);
        assert!(score.comments[0].description.starts_with("No labelSelector detected"));

        let score = run(r#"  topologySpreadConstraints:
    - maxSkew: 1
      topologyKey: zone
      whenUnsatisfiable: Sometimes
      labelSelector: {}"#);
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].description, "Invalid WhenUnsatisfiable setting detected");
    }

    #[test]
    fn test_zero_min_domains() {
        let score = run(r#"  topologySpreadConstraints:
    - maxSkew: 1
      minDomains: 0
      topologyKey: zone
      whenUnsatisfiable: DoNotSchedule
      labelSelector: {}"#);
        assert!(score.comments[0].description.starts_with("MaxDomain set to zero"));
    }
}
