//! Checks on object metadata that apply to every kind.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::Resource;
use crate::analyzer::kubescore::types::{Grade, TestScore};
use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$").expect("valid label value pattern"));

/// Maximum length Kubernetes accepts for a label value.
const MAX_LABEL_VALUE_LEN: usize = 63;

pub fn is_valid_label_value(value: &str) -> bool {
    value.len() <= MAX_LABEL_VALUE_LEN && LABEL_VALUE.is_match(value)
}

pub fn label_values(resource: &Resource, _ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);
    for (key, value) in &resource.object_meta().labels {
        if !is_valid_label_value(value) {
            score.grade = Grade::Critical;
            score.add_comment(
                key,
                "Invalid label value",
                "The label value is invalid, and will not be accepted by Kubernetes",
            );
        }
    }
    Ok(score)
}
