//! Line oriented formatter for CI logs.
//!
//! One line per comment, or one line per check without comments:
//! `[GRADE] name/namespace apiVersion/kind: (path) summary`.

use crate::analyzer::kubescore::scorecard::Scorecard;

/// Format a scorecard as CI friendly lines.
pub fn format(scorecard: &Scorecard) -> String {
    let mut output = String::new();

    for object in scorecard.sorted() {
        let reference = object.human_ref();
        for check in &object.checks {
            if let Some(message) = check.error() {
                output.push_str(&format!("[ERROR] {}: ({}) {}\n", reference, check.check.id, message));
                continue;
            }
            let Some(score) = check.score() else {
                continue;
            };

            let label = if score.skipped {
                "SKIPPED".to_string()
            } else {
                score.grade.to_string()
            };

            if score.comments.is_empty() {
                output.push_str(&format!("[{}] {}\n", label, reference));
            }
            for comment in &score.comments {
                if comment.path.is_empty() {
                    output.push_str(&format!("[{}] {}: {}\n", label, reference, comment.summary));
                } else {
                    output.push_str(&format!(
                        "[{}] {}: ({}) {}\n",
                        label, reference, comment.path, comment.summary
                    ));
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::formatter::tests::sample_scorecard;

    #[test]
    fn test_ci_lines() {
        let output = format(&sample_scorecard());
        assert!(
            output.contains("[CRITICAL] web/prod apps/v1/Deployment: (web) Image with latest tag\n"),
            "{}",
            output
        );
        assert!(output.contains("[OK] web/prod v1/Service\n"));
        assert!(output.contains("[SKIPPED] web/prod apps/v1/Deployment: Skipped because the deployment has less than 2 replicas\n"));
    }

    #[test]
    fn test_every_line_has_a_grade_prefix() {
        let output = format(&sample_scorecard());
        for line in output.lines() {
            assert!(line.starts_with('['), "unexpected line {:?}", line);
        }
    }
}
