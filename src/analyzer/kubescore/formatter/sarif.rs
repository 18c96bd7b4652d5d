//! SARIF (Static Analysis Results Interchange Format) formatter.
//!
//! Only findings at Warning or worse are reported, one result per comment.
//! Skipped and faulted checks produce nothing.

use crate::analyzer::kubescore::scorecard::{ScoredObject, Scorecard};
use crate::analyzer::kubescore::types::Grade;
use serde::Serialize;
use std::collections::HashSet;

/// Format a scorecard as SARIF.
pub fn format(scorecard: &Scorecard) -> String {
    let output = SarifOutput::from(scorecard);
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Serialize)]
struct SarifOutput {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: u32,
}

impl From<&Scorecard> for SarifOutput {
    fn from(scorecard: &Scorecard) -> Self {
        let mut rules: Vec<SarifRule> = Vec::new();
        let mut seen_rules = HashSet::new();
        let mut results = Vec::new();

        for object in scorecard.sorted() {
            for check in &object.checks {
                let Some(score) = check.score() else {
                    continue;
                };
                if score.skipped {
                    continue;
                }
                let Some(level) = grade_to_sarif_level(score.grade) else {
                    continue;
                };

                if seen_rules.insert(check.check.id.clone()) {
                    rules.push(SarifRule {
                        id: check.check.id.clone(),
                        name: check.check.name.clone(),
                        short_description: SarifMessage {
                            text: check.check.comment.clone(),
                        },
                    });
                }

                for comment in &score.comments {
                    let text = if comment.path.is_empty() {
                        format!("{}: {}", object.human_ref(), comment.summary)
                    } else {
                        format!("{}: ({}) {}", object.human_ref(), comment.path, comment.summary)
                    };
                    results.push(SarifResult {
                        rule_id: check.check.id.clone(),
                        level: level.to_string(),
                        message: SarifMessage { text },
                        locations: vec![location(object)],
                    });
                }
            }
        }

        Self {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json".to_string(),
            version: "2.1.0".to_string(),
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "kube-score".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        information_uri: "https://github.com/zegl/kube-score".to_string(),
                        rules,
                    },
                },
                results,
            }],
        }
    }
}

fn location(object: &ScoredObject) -> SarifLocation {
    SarifLocation {
        physical_location: SarifPhysicalLocation {
            artifact_location: SarifArtifactLocation {
                uri: object.location.name.clone(),
            },
            region: SarifRegion {
                start_line: object.location.line,
            },
        },
    }
}

fn grade_to_sarif_level(grade: Grade) -> Option<&'static str> {
    match grade {
        Grade::Critical => Some("error"),
        Grade::Warning => Some("warning"),
        Grade::AlmostOk | Grade::AllOk => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::formatter::tests::sample_scorecard;

    #[test]
    fn test_sarif_document() {
        let output = format(&sample_scorecard());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["version"], "2.1.0");
        assert_eq!(value["runs"][0]["tool"]["driver"]["name"], "kube-score");

        let results = value["runs"][0]["results"].as_array().unwrap();
        let tag = results
            .iter()
            .find(|r| r["ruleId"] == "container-image-tag")
            .unwrap();
        assert_eq!(tag["level"], "error");
        assert_eq!(
            tag["message"]["text"],
            "web/prod apps/v1/Deployment: (web) Image with latest tag"
        );
        let location = &tag["locations"][0]["physicalLocation"];
        assert_eq!(location["artifactLocation"]["uri"], "app.yaml");
        assert_eq!(location["region"]["startLine"], 1);

        let replicas = results
            .iter()
            .find(|r| r["ruleId"] == "deployment-replicas")
            .unwrap();
        assert_eq!(replicas["level"], "warning");
    }

    #[test]
    fn test_rules_are_unique_and_cover_results() {
        let output = format(&sample_scorecard());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let rules = value["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r["id"].as_str().unwrap()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());

        for result in value["runs"][0]["results"].as_array().unwrap() {
            assert!(unique.contains(result["ruleId"].as_str().unwrap()));
        }
        assert!(!unique.contains("service-type"), "passing checks have no rule entry");
    }
}
