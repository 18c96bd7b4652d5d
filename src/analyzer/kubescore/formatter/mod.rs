//! Output formatters for scorecards.
//!
//! Every formatter is a read-only view over a [`Scorecard`]; none of them
//! changes grades or decides the exit code.

pub mod ci;
pub mod human;
pub mod json;
pub mod junit;
pub mod sarif;

use crate::analyzer::kubescore::scorecard::Scorecard;
use clap::ValueEnum;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Coloured, wrapped text for terminals.
    #[default]
    Human,
    /// One line per finding.
    Ci,
    /// JSON output.
    Json,
    /// SARIF format for code scanning integrations.
    Sarif,
    /// JUnit XML for test report viewers.
    #[value(name = "junit")]
    JUnit,
}

/// Settings that only affect the human formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanOptions {
    /// 0 hides OK checks, 1 shows them, 2 also shows skipped checks.
    pub verbosity: u8,
    pub term_width: usize,
    pub color: bool,
}

impl Default for HumanOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            term_width: 80,
            color: true,
        }
    }
}

/// Format a scorecard to a string.
pub fn format_to_string(scorecard: &Scorecard, format: OutputFormat, options: &HumanOptions) -> String {
    match format {
        OutputFormat::Human => human::format(scorecard, options),
        OutputFormat::Ci => ci::format(scorecard),
        OutputFormat::Json => json::format(scorecard),
        OutputFormat::Sarif => sarif::format(scorecard),
        OutputFormat::JUnit => junit::format(scorecard),
    }
}

/// Format and print a scorecard.
pub fn print_scorecard(scorecard: &Scorecard, format: OutputFormat, options: &HumanOptions) {
    print!("{}", format_to_string(scorecard, format, options));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analyzer::kubescore::checks::CheckRegistry;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::parser::{DecoderRegistry, Parser};
    use crate::analyzer::kubescore::score::score;

    /// A failing Deployment and the Service selecting it, scored with the
    /// built-in checks.
    pub fn sample_scorecard() -> Scorecard {
        let yaml = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: prod
spec:
  replicas: 1
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: nginx
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: prod
spec:
  selector:
    app: web
  ports:
    - port: 80
"#;
        let decoders = DecoderRegistry::with_defaults();
        let objects = Parser::new(&decoders).parse_str("app.yaml", yaml).unwrap();
        let registry = CheckRegistry::with_builtin().unwrap();
        score(&objects, &registry, &RunConfiguration::default())
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::from_str("HUMAN", true), Ok(OutputFormat::Human));
        assert_eq!(OutputFormat::from_str("junit", false), Ok(OutputFormat::JUnit));
        assert_eq!(OutputFormat::from_str("sarif", false), Ok(OutputFormat::Sarif));
        assert!(OutputFormat::from_str("xml", true).is_err());
    }
}
