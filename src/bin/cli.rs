use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lakeplan::{
    effective_grants, render_grants_json, render_grants_table, render_json, render_text, Differ,
    ExportOptions, LoadOptions, State, StateExporter, StateLoader, StateValidator, TextOptions,
};

#[derive(Parser)]
#[command(name = "lakeplan")]
#[command(about = "Declarative configuration planner for a multi-tenant data platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config directory
    #[arg(short, long, env = "LAKEPLAN_CONFIG_DIR", default_value = "./config")]
    config_dir: PathBuf,

    /// Drop unknown document fields instead of failing
    #[arg(long)]
    allow_unknown_fields: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the config tree
    Validate,

    /// Show the changes needed to converge the actual state to the config
    Plan {
        /// Exported tree holding the actual state (empty state if omitted)
        #[arg(long)]
        actual: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,
    },

    /// Re-export the config tree in canonical form
    Export {
        /// Target directory
        #[arg(long)]
        to: PathBuf,

        /// Write into a non-empty target directory
        #[arg(long)]
        overwrite: bool,
    },

    /// Print the effective grants after preset expansion
    Grants {
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("lakeplan=debug,info")
    } else {
        EnvFilter::new("lakeplan=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\x1b[31m✗ Error:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the command ran but found problems.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let loader = StateLoader::with_options(LoadOptions {
        allow_unknown_fields: cli.allow_unknown_fields,
    });

    match cli.command {
        Commands::Validate => cmd_validate(&loader, &cli.config_dir),
        Commands::Plan { actual, output, no_color } => {
            cmd_plan(&loader, &cli.config_dir, actual.as_deref(), output, no_color)
        }
        Commands::Export { to, overwrite } => cmd_export(&loader, &cli.config_dir, &to, overwrite),
        Commands::Grants { output } => cmd_grants(&loader, &cli.config_dir, output),
    }
}

fn load_and_validate(loader: &StateLoader, config_dir: &Path) -> Result<(State, bool), Box<dyn std::error::Error>> {
    info!("Loading config from {}", config_dir.display());
    let state = loader.load_dir(config_dir)?;
    let result = StateValidator::new().validate(&state);

    if result.is_valid() {
        eprintln!("\x1b[32m✓\x1b[0m {} resources valid", state.resource_count());
    } else {
        for err in &result.errors {
            eprintln!("  \x1b[31m✗\x1b[0m {}", err);
        }
        eprintln!("\n{} validation error(s)", result.len());
    }
    Ok((state, result.is_valid()))
}

fn cmd_validate(loader: &StateLoader, config_dir: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let (_, valid) = load_and_validate(loader, config_dir)?;
    Ok(valid)
}

fn cmd_plan(
    loader: &StateLoader,
    config_dir: &Path,
    actual_dir: Option<&Path>,
    output: OutputFormat,
    no_color: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (desired, valid) = load_and_validate(loader, config_dir)?;
    if !valid {
        return Ok(false);
    }

    let actual = match actual_dir {
        Some(dir) => loader.load_dir(dir)?,
        None => {
            warn!("No --actual given; planning against an empty state");
            State::new()
        }
    };

    let plan = Differ::new().diff(&desired, &actual);
    match output {
        OutputFormat::Text => {
            let color = !no_color && std::env::var_os("NO_COLOR").is_none() && atty::is(atty::Stream::Stdout);
            print!("{}", render_text(&plan, &TextOptions { color }));
        }
        OutputFormat::Json => println!("{}", render_json(&plan)?),
    }
    Ok(!plan.has_errors())
}

fn cmd_export(
    loader: &StateLoader,
    config_dir: &Path,
    to: &Path,
    overwrite: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let state = loader.load_dir(config_dir)?;
    let written = StateExporter::with_options(ExportOptions { overwrite }).export_dir(&state, to)?;
    println!("✓ Exported {} file(s) to {}", written, to.display());
    Ok(true)
}

fn cmd_grants(loader: &StateLoader, config_dir: &Path, output: OutputFormat) -> Result<bool, Box<dyn std::error::Error>> {
    let state = loader.load_dir(config_dir)?;
    let grants = effective_grants(&state);

    match output {
        OutputFormat::Text => {
            if grants.is_empty() {
                println!("No grants.");
            } else {
                println!("{}", render_grants_table(&grants));
                println!("\n{} effective grant(s)", grants.len());
            }
        }
        OutputFormat::Json => println!("{}", render_grants_json(&grants)?),
    }
    Ok(true)
}
