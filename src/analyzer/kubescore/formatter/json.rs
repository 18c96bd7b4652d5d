//! JSON formatter.

use crate::analyzer::kubescore::checks::CheckInfo;
use crate::analyzer::kubescore::context::{ObjectMeta, TypeMeta};
use crate::analyzer::kubescore::scorecard::{ScoredCheck, ScoredObject, Scorecard};
use crate::analyzer::kubescore::types::{Comment, Grade};
use serde::Serialize;

/// Format a scorecard as a pretty JSON array.
pub fn format(scorecard: &Scorecard) -> String {
    let output: Vec<JsonObject<'_>> = scorecard.sorted().into_iter().map(JsonObject::from).collect();
    let mut json = serde_json::to_string_pretty(&output).unwrap_or_else(|_| "[]".to_string());
    json.push('\n');
    json
}

#[derive(Serialize)]
struct JsonObject<'a> {
    object_name: &'a str,
    type_meta: &'a TypeMeta,
    object_meta: &'a ObjectMeta,
    checks: Vec<JsonCheck<'a>>,
    file_name: &'a str,
    file_row: u32,
}

#[derive(Serialize)]
struct JsonCheck<'a> {
    check: &'a CheckInfo,
    /// Absent for faulted checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    grade: Option<Grade>,
    skipped: bool,
    comments: &'a [Comment],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a ScoredObject> for JsonObject<'a> {
    fn from(object: &'a ScoredObject) -> Self {
        Self {
            object_name: &object.object_meta.name,
            type_meta: &object.type_meta,
            object_meta: &object.object_meta,
            checks: object.checks.iter().map(JsonCheck::from).collect(),
            file_name: &object.location.name,
            file_row: object.location.line,
        }
    }
}

impl<'a> From<&'a ScoredCheck> for JsonCheck<'a> {
    fn from(check: &'a ScoredCheck) -> Self {
        let score = check.score();
        Self {
            check: &check.check,
            grade: check.grade(),
            skipped: check.is_skipped(),
            comments: score.map(|s| s.comments.as_slice()).unwrap_or(&[]),
            error: check.error(),
        }
    }
}
