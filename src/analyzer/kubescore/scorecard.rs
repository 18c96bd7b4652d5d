//! The scorecard: every check outcome of a run, grouped per object.

use crate::analyzer::kubescore::checks::CheckInfo;
use crate::analyzer::kubescore::context::{ObjectMeta, TypeMeta};
use crate::analyzer::kubescore::types::{FileLocation, Grade, TestScore};
use serde::Serialize;
use std::collections::HashMap;

/// What happened when a check ran against an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The rule produced a score (possibly a skipped one).
    Scored(TestScore),
    /// The rule failed. Other checks on the object are unaffected.
    Error { message: String },
}

/// One check's outcome on one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCheck {
    pub check: CheckInfo,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

impl ScoredCheck {
    pub fn score(&self) -> Option<&TestScore> {
        match &self.outcome {
            CheckOutcome::Scored(score) => Some(score),
            CheckOutcome::Error { .. } => None,
        }
    }

    /// The grade, for checks that produced a score.
    pub fn grade(&self) -> Option<Grade> {
        self.score().map(|s| s.grade)
    }

    pub fn is_skipped(&self) -> bool {
        self.score().is_some_and(|s| s.skipped)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            CheckOutcome::Error { message } => Some(message),
            CheckOutcome::Scored(_) => None,
        }
    }
}

/// All outcomes for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredObject {
    pub key: String,
    pub type_meta: TypeMeta,
    pub object_meta: ObjectMeta,
    pub location: FileLocation,
    pub checks: Vec<ScoredCheck>,
}

impl ScoredObject {
    pub fn add(&mut self, check: CheckInfo, outcome: CheckOutcome) {
        self.checks.push(ScoredCheck { check, outcome });
    }

    /// Whether any non-skipped score is at or below `threshold`.
    pub fn any_below_or_equal(&self, threshold: Grade) -> bool {
        self.checks
            .iter()
            .filter(|c| !c.is_skipped())
            .filter_map(ScoredCheck::grade)
            .any(|grade| grade <= threshold)
    }

    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.error().is_some())
    }

    /// `name[/namespace] apiVersion/kind`
    pub fn human_ref(&self) -> String {
        let mut s = self.object_meta.name.clone();
        if !self.object_meta.namespace.is_empty() {
            s.push('/');
            s.push_str(&self.object_meta.namespace);
        }
        s.push(' ');
        s.push_str(&self.type_meta.api_version);
        s.push('/');
        s.push_str(&self.type_meta.kind);
        s
    }
}

/// Scored objects in input order, addressable by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scorecard {
    objects: Vec<ScoredObject>,
    index: HashMap<String, usize>,
}

/// `kind/apiVersion/namespace/name`
pub fn object_key(type_meta: &TypeMeta, object_meta: &ObjectMeta) -> String {
    format!(
        "{}/{}/{}/{}",
        type_meta.kind, type_meta.api_version, object_meta.namespace, object_meta.name
    )
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. A key already in use gets a `#2`, `#3`... suffix so
    /// that identical objects in different documents are kept apart.
    pub fn new_object(
        &mut self,
        type_meta: TypeMeta,
        object_meta: ObjectMeta,
        location: FileLocation,
    ) -> &mut ScoredObject {
        let base = object_key(&type_meta, &object_meta);
        let mut key = base.clone();
        let mut n = 2;
        while self.index.contains_key(&key) {
            key = format!("{}#{}", base, n);
            n += 1;
        }

        let position = self.objects.len();
        self.index.insert(key.clone(), position);
        self.objects.push(ScoredObject {
            key,
            type_meta,
            object_meta,
            location,
            checks: Vec::new(),
        });
        &mut self.objects[position]
    }

    pub fn objects(&self) -> &[ScoredObject] {
        &self.objects
    }

    pub fn get(&self, key: &str) -> Option<&ScoredObject> {
        self.index.get(key).map(|&i| &self.objects[i])
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects ordered by key.
    pub fn sorted(&self) -> Vec<&ScoredObject> {
        let mut objects: Vec<_> = self.objects.iter().collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        objects
    }

    pub fn any_below_or_equal(&self, threshold: Grade) -> bool {
        self.objects.iter().any(|o| o.any_below_or_equal(threshold))
    }

    pub fn has_errors(&self) -> bool {
        self.objects.iter().any(ScoredObject::has_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::types::Facet;

    fn meta(name: &str, namespace: &str) -> ObjectMeta {
        ObjectMeta {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        }
    }

    fn info(id: &str) -> CheckInfo {
        CheckInfo {
            name: id.to_string(),
            id: id.to_string(),
            facet: Facet::Meta,
            comment: String::new(),
            optional: false,
        }
    }

    #[test]
    fn test_keys_and_collisions() {
        let mut card = Scorecard::new();
        let tm = TypeMeta::new("apps/v1", "Deployment");
        card.new_object(tm.clone(), meta("web", "prod"), FileLocation::new("a.yaml", 1));
        card.new_object(tm.clone(), meta("web", "prod"), FileLocation::new("b.yaml", 1));
        card.new_object(tm.clone(), meta("web", "prod"), FileLocation::new("c.yaml", 1));

        assert_eq!(card.len(), 3);
        assert_eq!(card.objects()[0].key, "Deployment/apps/v1/prod/web");
        assert_eq!(card.objects()[1].key, "Deployment/apps/v1/prod/web#2");
        assert_eq!(card.get("Deployment/apps/v1/prod/web#3").unwrap().location.name, "c.yaml");
    }

    #[test]
    fn test_thresholds_ignore_skipped() {
        let mut card = Scorecard::new();
        let obj = card.new_object(TypeMeta::new("v1", "Service"), meta("svc", ""), FileLocation::new("a.yaml", 1));
        obj.add(info("a"), CheckOutcome::Scored(TestScore::skipped("skipped")));
        obj.add(info("b"), CheckOutcome::Scored(TestScore::new(Grade::Warning)));

        assert!(card.any_below_or_equal(Grade::Warning));
        assert!(!card.any_below_or_equal(Grade::Critical));
        assert!(!card.has_errors());
    }

    #[test]
    fn test_errors_are_recorded() {
        let mut card = Scorecard::new();
        let obj = card.new_object(TypeMeta::new("v1", "Service"), meta("svc", "ns"), FileLocation::new("a.yaml", 1));
        obj.add(info("a"), CheckOutcome::Error { message: "boom".into() });
        assert!(card.has_errors());
        assert_eq!(card.objects()[0].checks[0].error(), Some("boom"));
        assert_eq!(card.objects()[0].human_ref(), "svc/ns v1/Service");
    }

    #[test]
    fn test_outcome_serialization() {
        let check = ScoredCheck {
            check: info("a"),
            outcome: CheckOutcome::Error { message: "boom".into() },
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["check"]["id"], "a");
    }
}
