//! # kube-score
//!
//! Static analysis of Kubernetes object definitions. Manifests are parsed
//! without contacting a cluster, scored by a catalogue of checks, and
//! reported as a graded scorecard.
//!
//! ## Example
//!
//! ```rust,no_run
//! use kube_score::analyzer::kubescore::{NamedInput, RunConfiguration, score_inputs};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let content = std::fs::read("deployment.yaml")?;
//! let scorecard = score_inputs(&[NamedInput::new("deployment.yaml", content)], &RunConfiguration::default())?;
//! println!("{} object(s) scored", scorecard.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

// Re-export commonly used types and functions
pub use error::{KubeScoreError, Result};
pub use handlers::*;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
