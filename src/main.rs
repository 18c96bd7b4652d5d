use clap::Parser;
use kube_score::{
    analyzer::kubescore::{CheckRegistry, DecoderRegistry},
    cli::{Cli, Commands},
    config, handlers,
};
use std::process;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run() -> kube_score::Result<i32> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Registries are built once and handed to the commands that need them
    let decoders = DecoderRegistry::with_defaults();
    let registry = CheckRegistry::with_builtin()?;

    match &cli.command {
        Commands::Score(args) => {
            let file_config = config::load_config(cli.config.as_deref())?;
            handlers::handle_score(args, cli.verbose, &file_config, &decoders, &registry)
        }
        Commands::List => handlers::handle_list(&registry).map(|_| 0),
        Commands::Mkconfig { force } => handlers::handle_mkconfig(cli.config.as_deref(), *force).map(|_| 0),
    }
}
