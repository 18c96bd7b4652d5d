//! kube-score: static analysis of Kubernetes manifests.
//!
//! Manifests are decoded into a lenient object model, every registered check
//! whose facet applies to an object is run against it, and the results are
//! collected into a [`Scorecard`] graded per check.
//!
//! # Features
//!
//! - Multi-document YAML with `List` expansion and Helm `# Source:` tracking
//! - 31 built-in checks, 6 of them optional
//! - `kube-score/ignore`, `kube-score/enable` and `kube-score/skip` annotations
//! - Human, CI, JSON, SARIF and JUnit output
//!
//! # Example
//!
//! ```rust,ignore
//! use kube_score::analyzer::kubescore::{NamedInput, RunConfiguration, score_inputs};
//!
//! let inputs = vec![NamedInput::new("app.yaml", std::fs::read("app.yaml")?)];
//! let scorecard = score_inputs(&inputs, &RunConfiguration::default())?;
//!
//! for object in scorecard.sorted() {
//!     println!("{} has errors: {}", object.human_ref(), object.has_errors());
//! }
//! ```

pub mod checks;
pub mod config;
pub mod context;
pub mod formatter;
pub mod parser;
pub mod pragma;
pub mod rules;
pub mod score;
pub mod scorecard;
pub mod types;

// Re-export main types and functions
pub use checks::{CheckInfo, CheckRegistry, CheckSpec, RegistryError, Rule, ScoreContext, check_id};
pub use config::{ConfigError, KubernetesVersion, RunConfiguration};
pub use context::ParsedObjects;
pub use formatter::{HumanOptions, OutputFormat, format_to_string, print_scorecard};
pub use parser::{DecoderRegistry, DocumentError, NamedInput, ParseError, Parser};
pub use score::score;
pub use scorecard::{CheckOutcome, ScoredCheck, ScoredObject, Scorecard};
pub use types::{Comment, Facet, FileLocation, Grade, TestScore};

/// Parse `inputs` and score them with the built-in checks.
///
/// Fresh registries are built on every call. Callers scoring repeatedly,
/// or registering their own checks, should build them once and use
/// [`Parser`] and [`score`] directly.
pub fn score_inputs(inputs: &[NamedInput], config: &RunConfiguration) -> crate::error::Result<Scorecard> {
    let decoders = DecoderRegistry::with_defaults();
    let objects = Parser::new(&decoders).parse_inputs(inputs)?;
    let registry = CheckRegistry::with_builtin()?;
    Ok(score(&objects, &registry, config))
}
