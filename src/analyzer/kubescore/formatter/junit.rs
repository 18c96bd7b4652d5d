//! JUnit XML formatter.
//!
//! One `<testsuite>` per scored object and one `<testcase>` per check, so
//! that test report viewers in CI systems can display the scorecard.

use crate::analyzer::kubescore::scorecard::{ScoredCheck, ScoredObject, Scorecard};
use crate::analyzer::kubescore::types::{Comment, Grade};
use std::fmt::Write;

/// Format a scorecard as a JUnit XML document.
pub fn format(scorecard: &Scorecard) -> String {
    let mut output = String::new();
    // Writing to a String cannot fail.
    let _ = write_document(&mut output, scorecard);
    output
}

fn write_document(out: &mut String, scorecard: &Scorecard) -> std::fmt::Result {
    let objects = scorecard.sorted();
    let tests: usize = objects.iter().map(|o| o.checks.len()).sum();
    let failures: usize = objects.iter().map(|o| count(o, is_failure)).sum();
    let errors: usize = objects.iter().map(|o| count(o, |c| c.error().is_some())).sum();

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<testsuites name="kube-score" tests="{}" failures="{}" errors="{}">"#,
        tests, failures, errors
    )?;
    for (id, object) in objects.into_iter().enumerate() {
        write_suite(out, id, object)?;
    }
    writeln!(out, "</testsuites>")
}

fn write_suite(out: &mut String, id: usize, object: &ScoredObject) -> std::fmt::Result {
    let name = escape_xml(&object.human_ref());
    writeln!(
        out,
        r#"  <testsuite id="{}" name="{}" tests="{}" failures="{}" errors="{}" skipped="{}">"#,
        id,
        name,
        object.checks.len(),
        count(object, is_failure),
        count(object, |c| c.error().is_some()),
        count(object, ScoredCheck::is_skipped),
    )?;

    for check in &object.checks {
        write!(
            out,
            r#"    <testcase name="{}" classname="{}""#,
            escape_xml(&check.check.name),
            name
        )?;

        if let Some(message) = check.error() {
            writeln!(out, ">")?;
            writeln!(out, r#"      <error message="{}"></error>"#, escape_xml(message))?;
            writeln!(out, "    </testcase>")?;
            continue;
        }
        let Some(score) = check.score() else {
            writeln!(out, "/>")?;
            continue;
        };

        if score.skipped {
            writeln!(out, ">")?;
            writeln!(out, r#"      <skipped message="{}"/>"#, escape_xml(&summary(&score.comments)))?;
            writeln!(out, "    </testcase>")?;
        } else if is_failure(check) {
            writeln!(out, ">")?;
            writeln!(
                out,
                r#"      <failure message="{}" type="{}">{}</failure>"#,
                escape_xml(&summary(&score.comments)),
                score.grade,
                escape_xml(&details(&score.comments)),
            )?;
            writeln!(out, "    </testcase>")?;
        } else {
            writeln!(out, "/>")?;
        }
    }

    writeln!(out, "  </testsuite>")
}

fn count(object: &ScoredObject, pred: impl Fn(&ScoredCheck) -> bool) -> usize {
    object.checks.iter().filter(|&c| pred(c)).count()
}

fn is_failure(check: &ScoredCheck) -> bool {
    !check.is_skipped() && check.grade().is_some_and(|g| g <= Grade::Warning)
}

fn comment_line(comment: &Comment) -> String {
    if comment.path.is_empty() {
        comment.summary.clone()
    } else {
        format!("({}) {}", comment.path, comment.summary)
    }
}

fn summary(comments: &[Comment]) -> String {
    comments.iter().map(comment_line).collect::<Vec<_>>().join("; ")
}

fn details(comments: &[Comment]) -> String {
    comments
        .iter()
        .map(|c| {
            if c.description.is_empty() {
                comment_line(c)
            } else {
                format!("{}: {}", comment_line(c), c.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::checks::{CheckInfo, check_id};
    use crate::analyzer::kubescore::context::{ObjectMeta, TypeMeta};
    use crate::analyzer::kubescore::formatter::tests::sample_scorecard;
    use crate::analyzer::kubescore::scorecard::CheckOutcome;
    use crate::analyzer::kubescore::types::{Facet, FileLocation};

    #[test]
    fn test_junit_structure() {
        let output = format(&sample_scorecard());
        assert!(output.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(output.contains(r#"<testsuite id="0" name="web/prod apps/v1/Deployment""#));
        assert!(output.contains(r#"<testsuite id="1" name="web/prod v1/Service""#));
        assert!(output.contains(r#"<testcase name="Container Image Tag" classname="web/prod apps/v1/Deployment">"#));
        assert!(output.contains(r#"<failure message="(web) Image with latest tag" type="CRITICAL">"#));
        assert!(output.contains(r#"<skipped message="Skipped because the deployment has less than 2 replicas"/>"#));
        assert!(output.contains(r#"<testcase name="Service Type" classname="web/prod v1/Service"/>"#));
        assert!(output.trim_end().ends_with("</testsuites>"));
    }

    #[test]
    fn test_faulted_check_is_an_error() {
        let mut scorecard = Scorecard::new();
        let object = scorecard.new_object(
            TypeMeta {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
            },
            ObjectMeta {
                name: "a&b".to_string(),
                ..Default::default()
            },
            FileLocation::new("x.yaml", 1),
        );
        object.add(
            CheckInfo {
                name: "Broken".to_string(),
                id: check_id("Broken"),
                facet: Facet::Deployment,
                comment: String::new(),
                optional: false,
            },
            CheckOutcome::Error {
                message: "selector <bad>".to_string(),
            },
        );

        let output = format(&scorecard);
        assert!(output.contains(r#"errors="1""#));
        assert!(output.contains(r#"name="a&amp;b apps/v1/Deployment""#));
        assert!(output.contains(r#"<error message="selector &lt;bad&gt;"></error>"#));
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(escape_xml("a < b"), "a &lt; b");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml(r#"a "b""#), "a &quot;b&quot;");
    }
}
