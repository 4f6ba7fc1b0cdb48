//! Argument parsing and command dispatch for the `riven` binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use riven_config::{ConfigService, Settings, default_settings};

/// Acquisition pipeline command-line entrypoint.
#[derive(Debug, Parser)]
#[command(name = "riven", version, about = "Runs or inspects the media acquisition pipeline.")]
struct Cli {
    /// Path to a TOML configuration file. Falls back to `RIVEN_CONFIG_PATH`
    /// when unset; individual fields are then layered under `RIVEN_`-prefixed
    /// environment variables (e.g. `RIVEN_MOUNT_PATH`, `RIVEN_PROVIDERS__REALDEBRID_API_KEY`).
    #[arg(long, global = true, env = "RIVEN_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the acquisition pipeline until interrupted. This is the default
    /// when no subcommand is given.
    Run,
    /// Inspect the resolved configuration without starting the pipeline.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the resolved configuration snapshot. Provider and metadata API
    /// keys are reported as configured/unset, never printed in full.
    Show {
        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Load and validate the resolved configuration, exiting non-zero on
    /// failure without starting the pipeline.
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Errors surfaced by CLI dispatch, distinct from pipeline runtime failures
/// so the process exit code can distinguish misconfiguration from a failed
/// pipeline run.
#[derive(Debug)]
enum CliError {
    /// The resolved configuration could not be loaded or failed validation.
    Validation(String),
    /// The pipeline itself returned an error.
    Failure(anyhow::Error),
}

impl CliError {
    const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 1,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(reason) => format!("configuration error: {reason}"),
            Self::Failure(err) => format!("error: {err:#}"),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failure(err)
    }
}

/// Parse arguments from the process environment, dispatch, and return the
/// process exit code.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.display_message());
            ExitCode::from(err.exit_code())
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => riven_app::run_app().await.map_err(anyhow::Error::from).map_err(CliError::from),
        Command::Config(ConfigCommand::Show { format }) => handle_config_show(cli.config, format),
        Command::Config(ConfigCommand::Validate) => handle_config_validate(cli.config),
    }
}

fn load_settings(config_path: Option<PathBuf>) -> Result<Settings, CliError> {
    let defaults = default_settings();
    let service = ConfigService::load(config_path, &defaults).map_err(|err| CliError::Validation(err.to_string()))?;
    Ok((*service.current()).clone())
}

fn handle_config_show(config_path: Option<PathBuf>, format: OutputFormat) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    let snapshot = ConfigSnapshot::from(&settings);
    match format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(&snapshot).map_err(|err| CliError::Validation(err.to_string()))?;
            println!("{rendered}");
        }
        OutputFormat::Text => print_text(&snapshot),
    }
    Ok(())
}

fn handle_config_validate(config_path: Option<PathBuf>) -> Result<(), CliError> {
    load_settings(config_path)?;
    println!("configuration is valid");
    Ok(())
}

/// Redacted configuration view safe to print: API keys report presence only.
#[derive(Debug, serde::Serialize)]
struct ConfigSnapshot {
    default_profile: String,
    mount_path: String,
    symlink_library_path: Option<String>,
    ranking_profiles: Vec<String>,
    path_profiles: usize,
    harvester_enabled: bool,
    realdebrid_api_key: &'static str,
    debrid_link_api_key: &'static str,
    alldebrid_api_key: &'static str,
    tmdb_api_key: &'static str,
}

impl From<&Settings> for ConfigSnapshot {
    fn from(settings: &Settings) -> Self {
        Self {
            default_profile: settings.default_profile.clone(),
            mount_path: settings.mount_path.display().to_string(),
            symlink_library_path: settings.symlink_library_path.as_ref().map(|p| p.display().to_string()),
            ranking_profiles: settings.ranking_profiles.iter().map(|p| p.name.clone()).collect(),
            path_profiles: settings.path_profiles.len(),
            harvester_enabled: settings.harvester.enabled,
            realdebrid_api_key: presence(settings.providers.realdebrid_api_key.as_ref()),
            debrid_link_api_key: presence(settings.providers.debrid_link_api_key.as_ref()),
            alldebrid_api_key: presence(settings.providers.alldebrid_api_key.as_ref()),
            tmdb_api_key: presence(settings.metadata.tmdb_api_key.as_ref()),
        }
    }
}

const fn presence(value: Option<&String>) -> &'static str {
    if value.is_some() { "configured" } else { "unset" }
}

fn print_text(snapshot: &ConfigSnapshot) {
    println!("default_profile:        {}", snapshot.default_profile);
    println!("mount_path:              {}", snapshot.mount_path);
    println!(
        "symlink_library_path:    {}",
        snapshot.symlink_library_path.as_deref().unwrap_or("(unset)")
    );
    println!("ranking_profiles:        {}", snapshot.ranking_profiles.join(", "));
    println!("path_profiles:           {}", snapshot.path_profiles);
    println!("harvester_enabled:       {}", snapshot.harvester_enabled);
    println!("realdebrid_api_key:      {}", snapshot.realdebrid_api_key);
    println!("debrid_link_api_key:     {}", snapshot.debrid_link_api_key);
    println!("alldebrid_api_key:       {}", snapshot.alldebrid_api_key);
    println!("tmdb_api_key:            {}", snapshot.tmdb_api_key);
}
