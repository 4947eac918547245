//! # designgen
//!
//! CLI tool for generating TypeScript token modules and component stubs from
//! a design tool export.
//!
//! ## Usage
//!
//! ```bash
//! # Generate from the locations in designgen.toml
//! designgen generate
//!
//! # Override inputs and output
//! designgen generate --catalog design/catalog.json --tokens design/tokens.json --output src/design
//!
//! # Keep the registry and generation state somewhere else
//! designgen generate --state-dir build/designgen
//!
//! # Dry run with stage logs
//! designgen generate --dry-run -v
//!
//! # Fail when the generated tree is out of date
//! designgen check
//!
//! # Initialize configuration
//! designgen init
//!
//! # Inspect or edit the naming registry
//! designgen registry list
//! designgen registry remove "Components/Button" --yes
//! ```

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use designgen::{
    config::{CliArgs, Config, ConfigManager},
    error::PipelineError,
    hooks::ProcessHookRunner,
    merge::MergeAction,
    pipeline::{remove_component, Pipeline, RunReport, Stores},
    registry::NamingAlias,
};

/// Exit code for "would change" and "needs confirmation" outcomes.
const EXIT_PENDING: u8 = 2;

#[derive(Parser)]
#[command(name = "designgen")]
#[command(author, version, about = "Generate typed design tokens and component stubs from a design export", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate token modules and component stubs
    Generate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Preview changes without writing files, stores or running hooks
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that generated output is up-to-date without writing anything
    Check {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Initialize a new designgen configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = designgen::config::CONFIG_FILENAME)]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Inspect or edit the naming registry
    Registry {
        /// Configuration file path
        #[arg(short, long, global = true)]
        config: Option<PathBuf>,

        /// Directory holding the naming registry and generation state
        #[arg(long, global = true)]
        state_dir: Option<PathBuf>,

        #[command(subcommand)]
        command: RegistryCommands,
    },
}

#[derive(Subcommand)]
enum RegistryCommands {
    /// Print every recorded alias
    List,

    /// Remove a component's aliases and delete its generated stub
    Remove {
        /// External (design tool) name of the component
        external_name: String,

        /// Apply the removal instead of only printing it
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Component catalog document
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Design token document
    #[arg(long)]
    tokens: Option<PathBuf>,

    /// Output directory for generated files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the naming registry and generation state
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Emit a preview story next to each stub
    #[arg(long)]
    stories: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Generate { inputs, dry_run } => cmd_generate(inputs, dry_run),
        Commands::Check { inputs } => cmd_check(inputs),
        Commands::Init { output, force } => cmd_init(output, force),
        Commands::Registry {
            config,
            state_dir,
            command,
        } => {
            let config = load_registry_config(config, state_dir)?;
            match command {
                RegistryCommands::List => cmd_registry_list(&config),
                RegistryCommands::Remove { external_name, yes } => {
                    cmd_registry_remove(&config, &external_name, yes)
                }
            }
        }
    }
}

/// Load configuration and merge command-line overrides.
fn load_config(inputs: &InputArgs) -> Result<Config, PipelineError> {
    let config = ConfigManager::load(inputs.config.as_deref())?;
    Ok(ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            catalog: inputs.catalog.clone(),
            tokens: inputs.tokens.clone(),
            output: inputs.output.clone(),
            state_dir: inputs.state_dir.clone(),
            stories: inputs.stories.then_some(true),
        },
    ))
}

/// Load configuration for the registry commands.
fn load_registry_config(
    config_path: Option<PathBuf>,
    state_dir: Option<PathBuf>,
) -> Result<Config, PipelineError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    Ok(ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            state_dir,
            ..CliArgs::default()
        },
    ))
}

/// Generate command implementation.
fn cmd_generate(inputs: InputArgs, dry_run: bool) -> anyhow::Result<ExitCode> {
    let config = load_config(&inputs)?;
    println!(
        "{} {} + {}",
        "Generating from".cyan(),
        config.input.catalog.display(),
        config.input.tokens.display()
    );

    let pipeline = Pipeline::new(config).dry_run(dry_run);
    let report = pipeline.run(&mut ProcessHookRunner)?;
    print_report(&report, &pipeline);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Check command implementation.
fn cmd_check(inputs: InputArgs) -> anyhow::Result<ExitCode> {
    let config = load_config(&inputs)?;
    println!("{}", "Checking generated output...".cyan());

    let pipeline = Pipeline::new(config).dry_run(true);
    let report = pipeline.run(&mut ProcessHookRunner)?;

    if report.is_up_to_date() {
        println!("{} Generated output is up-to-date", "✓".green());
        return Ok(ExitCode::SUCCESS);
    }

    for outcome in report.changed() {
        println!("  {} {}", format!("{:>9}", outcome.action).yellow(), outcome.path.display());
    }
    for conflict in &report.conflicts {
        println!("  {} {}", " conflict".red(), conflict);
    }
    println!("{} Generated output is out of date", "✗".red());
    println!("  Run 'designgen generate' to update");
    Ok(ExitCode::from(EXIT_PENDING))
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> anyhow::Result<ExitCode> {
    if output.exists() && !force {
        println!(
            "{} Configuration file already exists: {}",
            "Error:".red(),
            output.display()
        );
        println!("  Use --force to overwrite");
        return Ok(ExitCode::from(EXIT_PENDING));
    }

    std::fs::write(&output, ConfigManager::default_config_content())
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

/// Registry list implementation.
fn cmd_registry_list(config: &Config) -> anyhow::Result<ExitCode> {
    let stores = Stores::load(&config.output.state_dir)?;

    if stores.registry.is_empty() {
        println!("{}", "Registry is empty.".yellow());
        return Ok(ExitCode::SUCCESS);
    }

    for alias in stores.registry.aliases() {
        println!("  {}", format_alias(alias));
    }
    println!(
        "  {} alias(es), {} tracked file(s)",
        stores.registry.len().to_string().green(),
        stores.tracked().to_string().green()
    );
    Ok(ExitCode::SUCCESS)
}

/// Registry remove implementation.
fn cmd_registry_remove(config: &Config, external_name: &str, yes: bool) -> anyhow::Result<ExitCode> {
    let removal = remove_component(config, external_name, !yes)?;

    if removal.is_empty() {
        println!(
            "{} No component named '{}' in the registry",
            "Error:".red(),
            external_name
        );
        return Ok(ExitCode::FAILURE);
    }

    let verb = if yes { "Removed" } else { "Would remove" };
    for alias in &removal.aliases {
        println!("  {} {}", verb, format_alias(alias));
    }
    for file in &removal.files {
        println!("  {} {}", verb, config.output.dir.join(file).display());
    }

    if yes {
        println!("{} Registry updated", "✓".green());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("  Re-run with --yes to apply");
        Ok(ExitCode::from(EXIT_PENDING))
    }
}

fn format_alias(alias: &NamingAlias) -> String {
    let mut line = match &alias.variant {
        Some(variant) => format!("{} / {} -> {}", alias.external_name, variant, alias.code_name),
        None => format!("{} -> {}", alias.external_name, alias.code_name.green()),
    };
    if alias.is_external_library {
        line.push_str(&format!(" {}", "(external)".dimmed()));
    }
    line
}

/// Print a run summary.
fn print_report(report: &RunReport, pipeline: &Pipeline) {
    let prefix = if report.dry_run {
        "[dry-run] ".yellow().to_string()
    } else {
        String::new()
    };
    let out_dir = &pipeline.config().output.dir;

    println!("{}", "Build order:".cyan());
    for line in report.build_order.log_lines() {
        println!("  {line}");
    }

    for outcome in &report.artifacts {
        let path = out_dir.join(&outcome.path);
        match outcome.action {
            MergeAction::Create | MergeAction::Update if report.dry_run => {
                println!(
                    "{}{} Would write {} ({})",
                    prefix,
                    "✓".green(),
                    path.display(),
                    outcome.action
                );
            }
            MergeAction::Create | MergeAction::Update => {
                println!(
                    "{} Written {} ({}, {} bytes)",
                    "✓".green(),
                    path.display(),
                    outcome.action,
                    outcome.bytes
                );
            }
            MergeAction::Conflict(_) => {}
            MergeAction::Unchanged | MergeAction::Adopt => {
                println!("  {} {}", "unchanged".dimmed(), path.display());
            }
        }
    }

    for collision in &report.collisions {
        println!(
            "{} '{}' named {} ({} was taken)",
            "Warning:".yellow(),
            collision.external_name,
            collision.assigned,
            collision.candidate
        );
    }
    for conflict in &report.conflicts {
        println!(
            "{} {} left untouched: {}",
            "Conflict:".yellow(),
            out_dir.join(&conflict.path).display(),
            conflict.reason
        );
    }
    for path in &report.stale {
        println!(
            "{} {} is no longer generated",
            "Stale:".yellow(),
            out_dir.join(path).display()
        );
    }

    println!("  Token coverage: {}", report.coverage);

    for hook in &report.hooks.ran {
        println!("{} Hook {}", "✓".green(), hook);
    }
    if let Some(failure) = &report.hooks.failure {
        eprintln!("{} {}", "Hook failed:".red().bold(), failure);
    }
    for hook in &report.hooks.skipped {
        println!("  {} hook {}", "skipped".dimmed(), hook);
    }

    let changed = report.changed().count();
    println!(
        "{}{} file(s) changed, {} conflict(s)",
        prefix,
        changed.to_string().green(),
        report.conflicts.len()
    );
}

/// Print an error with formatting.
fn print_error(error: &anyhow::Error) {
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    eprintln!("{} {}", "Error:".red().bold(), message);
}
