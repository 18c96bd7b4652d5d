use crate::analyzer::kubescore::{
    CheckRegistry, DecoderRegistry, Grade, HumanOptions, KubernetesVersion, NamedInput, Parser, RunConfiguration,
    Scorecard, print_scorecard, score,
};
use crate::cli::ScoreArgs;
use crate::config::types::Config;
use crate::error::{KubeScoreError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

const STDIN_NAME: &str = "STDIN";

/// Score the files named in `args` and print the result.
///
/// Returns the process exit code.
pub fn handle_score(
    args: &ScoreArgs,
    verbosity: u8,
    file_config: &Config,
    decoders: &DecoderRegistry,
    registry: &CheckRegistry,
) -> Result<i32> {
    let config = build_run_configuration(args, file_config)?;
    let inputs = read_inputs(&args.files)?;

    let objects = Parser::new(decoders).parse_inputs(&inputs)?;
    log::info!("Scoring {} object(s) with {} check(s)", objects.len(), registry.len());
    let scorecard = score(&objects, registry, &config);

    let options = HumanOptions {
        verbosity,
        term_width: args
            .term_width
            .or_else(|| term_size::dimensions().map(|(w, _)| w))
            .unwrap_or(80),
        color: !args.no_color,
    };
    print_scorecard(&scorecard, args.output_format, &options);

    let exit_one_on_warning = args.exit_one_on_warning || file_config.exit_one_on_warning;
    Ok(exit_code(&scorecard, exit_one_on_warning))
}

/// Merge command line flags on top of the config file. List flags extend
/// the file's lists, boolean flags can only switch a setting on.
pub fn build_run_configuration(args: &ScoreArgs, file_config: &Config) -> Result<RunConfiguration> {
    let mut config = file_config.to_run_configuration();

    config.enabled_optional_checks.extend(args.enable_optional_test.iter().cloned());
    config.ignored_checks.extend(args.ignore_test.iter().cloned());

    if args.ignore_container_cpu_limit {
        config.ignore_container_cpu_limit = true;
    }
    if args.ignore_container_memory_limit {
        config.ignore_container_memory_limit = true;
    }
    if args.disable_ignore_checks_annotations {
        config.use_ignore_checks_annotation = false;
    }
    if args.disable_optional_checks_annotations {
        config.use_optional_checks_annotation = false;
    }
    if let Some(version) = &args.kubernetes_version {
        config.kubernetes_version = version.parse::<KubernetesVersion>()?;
    }
    if let Some(min_replicas) = args.min_replicas_hpa {
        config.min_replicas_hpa = min_replicas;
    }

    Ok(config)
}

/// Read every input as bytes. `-` is stdin, every other file is named by
/// its absolute path. Content is not checked here: invalid UTF-8 is a
/// parse error of the document that holds it.
pub fn read_inputs(files: &[PathBuf]) -> Result<Vec<NamedInput>> {
    let mut inputs = Vec::with_capacity(files.len());
    for file in files {
        if file.as_os_str() == "-" {
            let mut content = Vec::new();
            std::io::stdin().read_to_end(&mut content)?;
            inputs.push(NamedInput::new(STDIN_NAME, content));
            continue;
        }

        let content = std::fs::read(file).map_err(|source| KubeScoreError::Input {
            path: file.clone(),
            source,
        })?;
        inputs.push(NamedInput::new(display_name(file), content));
    }
    Ok(inputs)
}

fn display_name(file: &Path) -> String {
    std::path::absolute(file)
        .unwrap_or_else(|_| file.to_path_buf())
        .display()
        .to_string()
}

/// 1 on any critical finding or rule fault, or on warnings when asked to.
pub fn exit_code(scorecard: &Scorecard, exit_one_on_warning: bool) -> i32 {
    if scorecard.has_errors() || scorecard.any_below_or_equal(Grade::Critical) {
        return 1;
    }
    if exit_one_on_warning && scorecard.any_below_or_equal(Grade::Warning) {
        return 1;
    }
    0
}
