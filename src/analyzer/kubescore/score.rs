//! The execution engine: runs every applicable check against every object.

use crate::analyzer::kubescore::checks::{CheckRegistry, ScoreContext};
use crate::analyzer::kubescore::config::RunConfiguration;
use crate::analyzer::kubescore::context::ParsedObjects;
use crate::analyzer::kubescore::pragma::is_enabled;
use crate::analyzer::kubescore::scorecard::{CheckOutcome, Scorecard};
use crate::analyzer::kubescore::types::TestScore;

const SKIP_ANNOTATION_COMMENT: &str = "Skipped because the object has the kube-score/skip annotation";

/// Score every object against every check of its facets.
///
/// Checks ignored by the run configuration are not run at all. Checks
/// disabled for an object, and every check on an object carrying a true
/// `kube-score/skip`, are recorded as skipped. A rule returning an error
/// affects only its own entry.
pub fn score(objects: &ParsedObjects, registry: &CheckRegistry, config: &RunConfiguration) -> Scorecard {
    let ctx = ScoreContext { objects, config };
    let mut scorecard = Scorecard::new();

    for resource in objects.resources() {
        let object_meta = resource.object_meta();
        let scored = scorecard.new_object(
            resource.type_meta().clone(),
            object_meta.clone(),
            resource.location.clone(),
        );

        for facet in resource.facets() {
            for check in registry.all_checks_for(facet) {
                if config.is_ignored(check.id()) {
                    continue;
                }

                let outcome = if resource.location.skip {
                    CheckOutcome::Scored(TestScore::skipped(SKIP_ANNOTATION_COMMENT))
                } else if !is_enabled(
                    &check.info,
                    &object_meta.annotations,
                    resource.child_annotations(),
                    config,
                ) {
                    CheckOutcome::Scored(TestScore::skipped(format!(
                        "Skipped because {} is ignored",
                        check.id()
                    )))
                } else {
                    match check.rule().apply(resource, &ctx) {
                        Some(Ok(score)) => CheckOutcome::Scored(score),
                        Some(Err(err)) => {
                            log::error!(
                                "Check {} failed on {} at {}: {:#}",
                                check.id(),
                                scored.key,
                                resource.location,
                                err
                            );
                            CheckOutcome::Error {
                                message: format!("{:#}", err),
                            }
                        }
                        None => continue,
                    }
                };

                scored.add(check.info.clone(), outcome);
            }
        }
    }

    scorecard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::checks::{CheckSpec, Rule};
    use crate::analyzer::kubescore::parser::{DecoderRegistry, Parser};
    use crate::analyzer::kubescore::types::Grade;

    fn parse(yaml: &str) -> ParsedObjects {
        let decoders = DecoderRegistry::with_defaults();
        Parser::new(&decoders).parse_str("test.yaml", yaml).unwrap()
    }

    fn registry() -> CheckRegistry {
        let mut registry = CheckRegistry::new();
        registry
            .register(
                CheckSpec::new("Always OK", ""),
                Rule::meta(|_, _| Ok(TestScore::new(Grade::AllOk))),
            )
            .unwrap();
        registry
            .register(
                CheckSpec::new("Faulty", ""),
                Rule::pod_template(|_, _| anyhow::bail!("broken rule")),
            )
            .unwrap();
        registry
            .register(
                CheckSpec::new("Optional One", "").optional(),
                Rule::meta(|_, _| Ok(TestScore::new(Grade::Critical))),
            )
            .unwrap();
        registry
    }

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
"#;

    #[test]
    fn test_rule_fault_is_isolated() {
        let card = score(&parse(DEPLOYMENT), &registry(), &RunConfiguration::default());
        let object = &card.objects()[0];
        assert_eq!(object.checks.len(), 3);
        assert_eq!(object.checks[0].grade(), Some(Grade::AllOk));
        assert!(object.checks[1].is_skipped(), "optional check is skipped by default");
        assert_eq!(object.checks[2].error(), Some("broken rule"));
        assert!(card.has_errors());
    }

    #[test]
    fn test_facets_limit_checks() {
        let yaml = "apiVersion: v1\nkind: Service\nmetadata:\n  name: svc\n";
        let card = score(&parse(yaml), &registry(), &RunConfiguration::default());
        assert_eq!(card.objects()[0].checks.len(), 2, "pod template check does not apply to a Service");
    }

    #[test]
    fn test_ignored_checks_are_removed() {
        let config = RunConfiguration::default().ignore("faulty");
        let card = score(&parse(DEPLOYMENT), &registry(), &config);
        let ids: Vec<_> = card.objects()[0].checks.iter().map(|c| c.check.id.as_str()).collect();
        assert_eq!(ids, vec!["always-ok", "optional-one"]);
    }

    #[test]
    fn test_skip_annotation_skips_everything() {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  annotations:
    kube-score/skip: "true"
"#;
        let card = score(&parse(yaml), &registry(), &RunConfiguration::default());
        let object = &card.objects()[0];
        assert!(object.checks.iter().all(|c| c.is_skipped()));
        assert!(!card.has_errors());
        assert_eq!(
            object.checks[0].score().unwrap().comments[0].summary,
            SKIP_ANNOTATION_COMMENT
        );
    }

    #[test]
    fn test_ignore_annotation_comment() {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  annotations:
    kube-score/ignore: always-ok
"#;
        let card = score(&parse(yaml), &registry(), &RunConfiguration::default());
        let first = &card.objects()[0].checks[0];
        assert!(first.is_skipped());
        assert_eq!(first.score().unwrap().comments[0].summary, "Skipped because always-ok is ignored");
    }
}
