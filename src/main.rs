// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use peds_catalog::app_config::{self, Config};
use peds_catalog::app_controller::Controller;
use peds_catalog::database::models::EntityKind;
use peds_catalog::importer::FileKind;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import the master-data CSV files from a directory
    Import {
        /// Directory holding the five master-data files
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Import only one file (triggers, videos, clusters, cluster-videos, trigger-videos)
        #[arg(long, value_name = "FILE_KIND")]
        only: Option<FileKind>,
    },

    /// Print the sharing catalog snapshot
    Snapshot {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Drop the cached sharing catalog snapshot
    Invalidate,

    /// Publish a trigger, video or cluster
    Publish {
        /// Entity kind (trigger, video, cluster)
        kind: EntityKind,
        /// External code
        code: String,
    },

    /// Unpublish a trigger, video or cluster
    Unpublish {
        /// Entity kind (trigger, video, cluster)
        kind: EntityKind,
        /// External code
        code: String,
    },

    /// Resolve the patient page of a video
    Video {
        /// Video external code
        code: String,
        /// Page language (defaults to English)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Resolve the patient page of a cluster
    Cluster {
        /// Cluster external code
        code: String,
        /// Page language (defaults to English)
        #[arg(long)]
        lang: Option<String>,
    },

    /// Print the WhatsApp message prefixes for a doctor
    Prefixes {
        /// Doctor name as entered at registration
        #[arg(value_name = "DOCTOR_NAME")]
        doctor_name: String,
    },

    /// Print the sharing screen payload for a doctor
    Share {
        /// Doctor identifier
        doctor_id: String,
        /// Doctor name as entered at registration
        #[arg(value_name = "DOCTOR_NAME")]
        doctor_name: String,
    },

    /// Generate shell completions for peds-catalog
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// peds-catalog - catalog core for pediatric patient education
///
/// Loads master data, serves the sharing catalog and applies admin edits.
#[derive(Parser, Debug)]
#[command(name = "peds-catalog")]
#[command(version)]
#[command(about = "Pediatric patient-education catalog tool")]
#[command(long_about = "peds-catalog imports the clinic's master data and serves the cached sharing catalog.

EXAMPLES:
    peds-catalog import ./master_data                 # Import all five CSV files
    peds-catalog import ./master_data --only videos   # Import video_master.csv only
    peds-catalog snapshot --pretty                    # Print the sharing catalog
    peds-catalog unpublish video V100                 # Hide a video from patients
    peds-catalog video V100 --lang hi                 # Resolve a patient page
    peds-catalog completions bash > peds-catalog.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Catalog database file (overrides the configuration)
    #[arg(long, env = "PEDS_CATALOG_DB", global = true)]
    database: Option<PathBuf>,
}

// @struct: Colored stderr logger; filtering follows `log::max_level`
struct CustomLogger;

impl CustomLogger {
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Marker and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (marker, color) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            color,
            now,
            marker,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at info; the configured level is applied once the config is read
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "peds-catalog", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(Path::new(&cli.config))?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    if let Some(database) = &cli.database {
        config.database_path = Some(database.to_string_lossy().into_owned());
    }
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config).await?;
    run_command(&controller, cli.command).await
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    let mut stdout = std::io::stdout();

    match command {
        Commands::Import { dir, only } => {
            let summary = controller.run_import(&dir, only).await?;
            writeln!(stdout, "{}", summary)?;
        }
        Commands::Snapshot { pretty } => {
            writeln!(stdout, "{}", controller.snapshot_json(pretty).await?)?;
        }
        Commands::Invalidate => {
            controller.invalidate().await?;
            info!("Sharing catalog invalidated");
        }
        Commands::Publish { kind, code } => {
            controller.set_published(kind, &code, true).await?;
        }
        Commands::Unpublish { kind, code } => {
            controller.set_published(kind, &code, false).await?;
        }
        Commands::Video { code, lang } => match controller.video_page(&code, lang.as_deref()).await? {
            Some(page) => writeln!(stdout, "{}", serde_json::to_string_pretty(&page)?)?,
            None => warn!("No published video with code '{}'", code),
        },
        Commands::Cluster { code, lang } => {
            match controller.cluster_page(&code, lang.as_deref()).await? {
                Some(page) => writeln!(stdout, "{}", serde_json::to_string_pretty(&page)?)?,
                None => warn!("No published cluster with code '{}'", code),
            }
        }
        Commands::Prefixes { doctor_name } => {
            let prefixes = controller.message_prefixes(&doctor_name).await;
            for (language, text) in prefixes.iter() {
                writeln!(stdout, "[{}] {}", language, text)?;
            }
        }
        Commands::Share {
            doctor_id,
            doctor_name,
        } => {
            let payload = controller.share_payload(&doctor_id, &doctor_name).await?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&payload)?)?;
        }
        Commands::Completions { .. } => {}
    }

    stdout.flush().context("Failed to flush output")
}
