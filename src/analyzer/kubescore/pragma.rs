//! Annotation-driven check enablement.
//!
//! Objects can turn checks off with `kube-score/ignore` and turn optional
//! checks on with `kube-score/enable`. Both take a comma separated list of
//! check ids, where `*` matches every id. Annotations on an embedded pod
//! template take precedence over those on the owning object.

use crate::analyzer::kubescore::checks::CheckInfo;
use crate::analyzer::kubescore::config::RunConfiguration;
use std::collections::BTreeMap;

/// Comma separated ids of checks to disable.
pub const IGNORE_ANNOTATION: &str = "kube-score/ignore";

/// Comma separated ids of optional checks to enable.
pub const ENABLE_ANNOTATION: &str = "kube-score/enable";

/// Boolean; skips every check on the object.
pub const SKIP_ANNOTATION: &str = "kube-score/skip";

/// Ids that an annotation entry also names.
pub const IMPLIED_IDS: &[(&str, &[&str])] = &[(
    "container-resources",
    &["container-ephemeral-storage-request-and-limit"],
)];

/// Whether a comma separated annotation value names `id`, directly, through
/// `*`, or through an implied id.
pub fn annotation_names(value: &str, id: &str) -> bool {
    value.split(',').map(str::trim).any(|entry| {
        entry == "*"
            || entry == id
            || IMPLIED_IDS
                .iter()
                .any(|(alias, implied)| *alias == entry && implied.contains(&id))
    })
}

fn annotation_lists(annotations: &BTreeMap<String, String>, key: &str, id: &str) -> bool {
    annotations
        .get(key)
        .is_some_and(|value| annotation_names(value, id))
}

/// Decide whether `check` runs on an object.
///
/// The first matching rule wins:
/// 1. pod template ignore annotation
/// 2. pod template enable annotation
/// 3. object ignore annotation
/// 4. object enable annotation
/// 5. enabled through the run configuration
/// 6. optional checks are off
/// 7. everything else is on
pub fn is_enabled(
    check: &CheckInfo,
    annotations: &BTreeMap<String, String>,
    child_annotations: Option<&BTreeMap<String, String>>,
    config: &RunConfiguration,
) -> bool {
    let id = check.id.as_str();
    let use_ignore = config.use_ignore_checks_annotation;
    let use_enable = config.use_optional_checks_annotation;

    for layer in child_annotations.into_iter().chain(std::iter::once(annotations)) {
        if use_ignore && annotation_lists(layer, IGNORE_ANNOTATION, id) {
            return false;
        }
        if use_enable && annotation_lists(layer, ENABLE_ANNOTATION, id) {
            return true;
        }
    }

    if config.is_optional_enabled(id) {
        return true;
    }

    !check.optional
}
