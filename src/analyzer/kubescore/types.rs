//! Core types for kube-score.
//!
//! - `Grade` - The outcome level of a single check
//! - `Comment` - A finding attached to a score
//! - `TestScore` - The graded result of one check against one object
//! - `FileLocation` - Where an object was found in the input
//! - `Facet` - The capability view a check is written against

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Grade given by a check.
///
/// The numeric values are part of the JSON output and are ordered so that
/// a lower value is worse: `Critical < Warning < AlmostOk < AllOk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Grade {
    Critical = 1,
    Warning = 5,
    AlmostOk = 7,
    #[default]
    AllOk = 10,
}

impl Grade {
    /// Label used by the text renderers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::AlmostOk | Self::AllOk => "OK",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade as u8
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Critical),
            5 => Ok(Self::Warning),
            7 => Ok(Self::AlmostOk),
            10 => Ok(Self::AllOk),
            other => Err(format!("unknown grade {}", other)),
        }
    }
}

/// A single finding attached to a `TestScore`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Location inside the object (usually a container name).
    pub path: String,
    pub summary: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation_url: String,
}

/// Result of running one check against one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScore {
    pub grade: Grade,
    pub skipped: bool,
    pub comments: Vec<Comment>,
}

impl TestScore {
    /// A score with the given grade and no comments.
    pub fn new(grade: Grade) -> Self {
        Self {
            grade,
            skipped: false,
            comments: Vec::new(),
        }
    }

    /// A skipped score. Skipped scores are always `AllOk`.
    pub fn skipped(summary: impl Into<String>) -> Self {
        let mut score = Self::new(Grade::AllOk);
        score.skipped = true;
        score.add_comment("", summary, "");
        score
    }

    /// Append a comment.
    pub fn add_comment(
        &mut self,
        path: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.comments.push(Comment {
            path: path.into(),
            summary: summary.into(),
            description: description.into(),
            documentation_url: String::new(),
        });
    }

    /// Append a comment that links to further documentation.
    pub fn add_comment_with_url(
        &mut self,
        path: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
        documentation_url: impl Into<String>,
    ) {
        self.comments.push(Comment {
            path: path.into(),
            summary: summary.into(),
            description: description.into(),
            documentation_url: documentation_url.into(),
        });
    }

    /// Builder-style grade setter.
    pub fn with_grade(mut self, grade: Grade) -> Self {
        self.grade = grade;
        self
    }

    /// Lower the grade to `grade` if it is worse than the current one.
    pub fn downgrade(&mut self, grade: Grade) {
        if grade < self.grade {
            self.grade = grade;
        }
    }
}

/// Where an object was found in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    /// Input name, or the template path from a `# Source:` marker.
    pub name: String,
    /// 1-indexed line where the document starts.
    pub line: u32,
    /// Set when the object carries a truthy `kube-score/skip` annotation.
    #[serde(default)]
    pub skip: bool,
}

impl FileLocation {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
            skip: false,
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.line)
    }
}

/// The view of an object a check operates on.
///
/// A check is registered against one facet and runs on every object that
/// exposes it. Every object exposes `Meta`; pods and all workloads expose
/// `PodTemplate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Meta,
    PodTemplate,
    Service,
    Deployment,
    StatefulSet,
    NetworkPolicy,
    Ingress,
    CronJob,
    HorizontalPodAutoscaler,
    PodDisruptionBudget,
}

impl Facet {
    /// All facets, in execution order.
    pub const ALL: [Facet; 10] = [
        Facet::Meta,
        Facet::PodTemplate,
        Facet::Service,
        Facet::Deployment,
        Facet::StatefulSet,
        Facet::NetworkPolicy,
        Facet::Ingress,
        Facet::CronJob,
        Facet::HorizontalPodAutoscaler,
        Facet::PodDisruptionBudget,
    ];

    /// Name shown as the target type in listings and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "all",
            Self::PodTemplate => "Pod",
            Self::Service => "Service",
            Self::Deployment => "Deployment",
            Self::StatefulSet => "StatefulSet",
            Self::NetworkPolicy => "NetworkPolicy",
            Self::Ingress => "Ingress",
            Self::CronJob => "CronJob",
            Self::HorizontalPodAutoscaler => "HorizontalPodAutoscaler",
            Self::PodDisruptionBudget => "PodDisruptionBudget",
        }
    }
}

impl Serialize for Facet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
