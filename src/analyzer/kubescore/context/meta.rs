//! Metadata shared by every resource kind, and the small value types used
//! across the model (quantities, int-or-string ports, label selectors).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The `apiVersion`/`kind` pair of an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeMeta {
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

impl TypeMeta {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// The API group, empty for the core group.
    pub fn group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }
}

impl fmt::Display for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version, self.kind)
    }
}

/// Object metadata. The namespace is kept as written; an absent namespace
/// is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(deserialize_with = "scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(deserialize_with = "scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Look up an annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(|s| s.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a string map, accepting unquoted scalars such as `true` or `1`
/// and rendering them the way they were written.
pub(crate) fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_yaml::Value>>::deserialize(deserializer)?;
    let mut map = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let rendered = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Null => String::new(),
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected a string value for key {:?}, found {:?}",
                    key, other
                )));
            }
        };
        map.insert(key, rendered);
    }
    Ok(map)
}

// ============================================================================
// Quantity
// ============================================================================

/// A resource quantity such as `500m`, `1Gi` or `2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuantityRepr", into = "String")]
pub struct Quantity(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<QuantityRepr> for Quantity {
    fn from(repr: QuantityRepr) -> Self {
        match repr {
            QuantityRepr::Text(s) => Self(s),
            QuantityRepr::Int(i) => Self(i.to_string()),
            QuantityRepr::Float(f) => Self(f.to_string()),
        }
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl Quantity {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Numeric value in base units, if the quantity is well formed.
    pub fn value(&self) -> Option<f64> {
        let s = self.0.trim();
        if s.is_empty() {
            return None;
        }

        const BINARY: &[(&str, i32)] = &[
            ("Ki", 10),
            ("Mi", 20),
            ("Gi", 30),
            ("Ti", 40),
            ("Pi", 50),
            ("Ei", 60),
        ];
        const DECIMAL: &[(&str, i32)] = &[
            ("n", -9),
            ("u", -6),
            ("m", -3),
            ("k", 3),
            ("M", 6),
            ("G", 9),
            ("T", 12),
            ("P", 15),
            ("E", 18),
        ];

        for (suffix, exp) in BINARY {
            if let Some(number) = s.strip_suffix(suffix) {
                return number.parse::<f64>().ok().map(|n| n * 2f64.powi(*exp));
            }
        }
        for (suffix, exp) in DECIMAL {
            if let Some(number) = s.strip_suffix(suffix) {
                let n = number.parse::<f64>().ok()?;
                return Some(if *exp < 0 {
                    n / 10f64.powi(-exp)
                } else {
                    n * 10f64.powi(*exp)
                });
            }
        }

        // Plain numbers and decimal exponents ("1e3") parse directly.
        s.parse::<f64>().ok()
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.value(), Some(v) if v == 0.0)
    }

    /// Compare by value, falling back to the literal text when either side
    /// is not a well formed quantity.
    pub fn same_as(&self, other: &Quantity) -> bool {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0),
            _ => self.0 == other.0,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// IntOrString
// ============================================================================

/// A port or percentage that can be written either as a number or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntOrString {
    Int(i32),
    String(String),
}

impl IntOrString {
    /// The integer value; numeric strings are parsed, names yield 0.
    pub fn int_value(&self) -> i32 {
        match self {
            Self::Int(i) => *i,
            Self::String(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::String(s) => Some(s.as_str()),
        }
    }
}

impl Default for IntOrString {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// Label selectors
// ============================================================================

/// Error raised for selectors Kubernetes would reject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelSelectorError {
    #[error("unsupported label selector operator {0:?}")]
    UnknownOperator(String),
    #[error("label selector operator {operator} on key {key:?} requires values")]
    MissingValues { key: String, operator: String },
    #[error("label selector operator {operator} on key {key:?} must not have values")]
    UnexpectedValues { key: String, operator: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

/// A `matchLabels`/`matchExpressions` selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(deserialize_with = "scalar_map")]
    pub match_labels: BTreeMap<String, String>,
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    /// An empty selector matches every set of labels.
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Whether the selector selects `labels`.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> Result<bool, LabelSelectorError> {
        for (key, value) in &self.match_labels {
            if labels.get(key) != Some(value) {
                return Ok(false);
            }
        }

        for req in &self.match_expressions {
            let present = labels.get(&req.key);
            let matched = match req.operator.as_str() {
                "In" | "NotIn" => {
                    if req.values.is_empty() {
                        return Err(LabelSelectorError::MissingValues {
                            key: req.key.clone(),
                            operator: req.operator.clone(),
                        });
                    }
                    let contained = present.is_some_and(|v| req.values.contains(v));
                    if req.operator == "In" { contained } else { !contained }
                }
                "Exists" | "DoesNotExist" => {
                    if !req.values.is_empty() {
                        return Err(LabelSelectorError::UnexpectedValues {
                            key: req.key.clone(),
                            operator: req.operator.clone(),
                        });
                    }
                    if req.operator == "Exists" { present.is_some() } else { present.is_none() }
                }
                other => return Err(LabelSelectorError::UnknownOperator(other.to_string())),
            };
            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Service-style selector matching: every pair must be present, and an
/// empty selector selects nothing.
pub fn selector_map_matches(selector: &BTreeMap<String, String>, labels: &BTreeMap<String, String>) -> bool {
    !selector.is_empty() && selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_object_meta_accepts_scalar_annotations() {
        let yaml = r#"
name: foo
annotations:
  kube-score/skip: true
  replicas: 3
labels:
  app: web
"#;
        let meta: ObjectMeta = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.name, "foo");
        assert_eq!(meta.namespace, "", "absent namespace is empty");
        assert_eq!(meta.annotation("kube-score/skip"), Some("true"));
        assert_eq!(meta.annotation("replicas"), Some("3"));
        assert_eq!(meta.labels.get("app").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_object_meta_rejects_nested_label_values() {
        let yaml = "labels:\n  app:\n    nested: true\n";
        assert!(serde_yaml::from_str::<ObjectMeta>(yaml).is_err());
    }

    #[test]
    fn test_quantity_values() {
        assert_eq!(Quantity::new("500m").value(), Some(0.5));
        assert_eq!(Quantity::new("1Ki").value(), Some(1024.0));
        assert_eq!(Quantity::new("2").value(), Some(2.0));
        assert_eq!(Quantity::new("1e3").value(), Some(1000.0));
        assert!(Quantity::new("0").is_zero());
        assert!(!Quantity::new("abc").is_zero());
        assert!(Quantity::new("1").same_as(&Quantity::new("1000m")));
        assert!(!Quantity::new("1Gi").same_as(&Quantity::new("1G")));
    }

    #[test]
    fn test_quantity_from_yaml_number() {
        let q: BTreeMap<String, Quantity> = serde_yaml::from_str("cpu: 1\nmemory: 128Mi\n").unwrap();
        assert_eq!(q["cpu"], Quantity::new("1"));
        assert_eq!(q["memory"], Quantity::new("128Mi"));
    }

    #[test]
    fn test_int_or_string() {
        let port: IntOrString = serde_yaml::from_str("8080").unwrap();
        assert_eq!(port, IntOrString::Int(8080));
        let named: IntOrString = serde_yaml::from_str("http").unwrap();
        assert_eq!(named.as_name(), Some("http"));
        assert_eq!(named.int_value(), 0);
        assert_eq!(IntOrString::String("81".into()).int_value(), 81);
    }

    #[test]
    fn test_label_selector_match_labels() {
        let selector = LabelSelector {
            match_labels: labels(&[("app", "web")]),
            ..Default::default()
        };
        assert!(selector.matches(&labels(&[("app", "web"), ("tier", "fe")])).unwrap());
        assert!(!selector.matches(&labels(&[("app", "db")])).unwrap());
        assert!(LabelSelector::default().matches(&labels(&[])).unwrap(), "empty selector matches all");
    }

    #[test]
    fn test_label_selector_expressions() {
        let yaml = r#"
matchExpressions:
  - key: app
    operator: In
    values: [web, api]
  - key: canary
    operator: DoesNotExist
"#;
        let selector: LabelSelector = serde_yaml::from_str(yaml).unwrap();
        assert!(selector.matches(&labels(&[("app", "api")])).unwrap());
        assert!(!selector.matches(&labels(&[("app", "api"), ("canary", "1")])).unwrap());
        assert!(!selector.matches(&labels(&[("app", "db")])).unwrap());
    }

    #[test]
    fn test_label_selector_invalid_operator() {
        let selector = LabelSelector {
            match_expressions: vec![LabelSelectorRequirement {
                key: "app".into(),
                operator: "Like".into(),
                values: vec![],
            }],
            ..Default::default()
        };
        assert!(matches!(
            selector.matches(&labels(&[])),
            Err(LabelSelectorError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_selector_map_matches() {
        let selector = labels(&[("app", "web")]);
        assert!(selector_map_matches(&selector, &labels(&[("app", "web"), ("x", "y")])));
        assert!(!selector_map_matches(&selector, &labels(&[("x", "y")])));
        assert!(!selector_map_matches(&labels(&[]), &labels(&[("x", "y")])));
    }
}
