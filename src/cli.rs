use crate::analyzer::kubescore::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kube-score")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kubernetes object analysis with recommendations for improved reliability and security")]
#[command(long_about = "kube-score performs static code analysis of Kubernetes object definitions. The output is a list of recommendations of what can be improved to make the application more secure and resilient.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score Kubernetes objects
    Score(ScoreArgs),

    /// List all registered checks
    List,

    /// Write a default configuration file
    Mkconfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScoreArgs {
    /// Files to score, `-` reads from stdin
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Exit with code 1 in case of warnings
    #[arg(long)]
    pub exit_one_on_warning: bool,

    /// Disables the requirement of setting a container CPU limit
    #[arg(long)]
    pub ignore_container_cpu_limit: bool,

    /// Disables the requirement of setting a container memory limit
    #[arg(long)]
    pub ignore_container_memory_limit: bool,

    /// Enable an optional test, can be set multiple times
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub enable_optional_test: Vec<String>,

    /// Disable a test, can be set multiple times
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub ignore_test: Vec<String>,

    /// Set to true to disable the kube-score/ignore annotation
    #[arg(long)]
    pub disable_ignore_checks_annotations: bool,

    /// Set to true to disable the kube-score/enable annotation
    #[arg(long)]
    pub disable_optional_checks_annotations: bool,

    /// Kubernetes version the manifests are deployed to, e.g. v1.24
    #[arg(long, value_name = "VERSION")]
    pub kubernetes_version: Option<String>,

    /// Minimum number of replicas a HorizontalPodAutoscaler should have
    #[arg(long, value_name = "N")]
    pub min_replicas_hpa: Option<i32>,

    /// Line width of the human output, defaults to the terminal width
    #[arg(long, value_name = "COLUMNS")]
    pub term_width: Option<usize>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
