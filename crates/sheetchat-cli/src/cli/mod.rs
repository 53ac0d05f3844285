//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use sheetchat_core::{HttpBackend, config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "sheetchat")]
#[command(version)]
#[command(about = "Upload a spreadsheet and ask questions about it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides SHEETCHAT_BASE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Per-request deadline in seconds (0 disables)
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Status,
    /// Upload a spreadsheet and print the session id
    Upload {
        /// Spreadsheet to upload (.xlsx, .xls or .csv)
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Upload a spreadsheet, then chat about it interactively
    Chat {
        /// Spreadsheet to upload (.xlsx, .xls or .csv)
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Ask one question against an existing session
    Ask {
        /// Session (room) id returned by `upload`
        #[arg(long, value_name = "ID")]
        room: String,

        /// File name to show for the session
        #[arg(long, value_name = "NAME", default_value = "uploaded file")]
        name: String,

        /// The question to ask
        #[arg(value_name = "QUERY")]
        query: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Print a fresh config generated from the built-in defaults
    Generate,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        base_url,
        timeout_secs,
    } = cli;

    let setup = || -> Result<(config::Config, HttpBackend)> {
        let mut config = config::Config::load().context("load config")?;
        if let Some(secs) = timeout_secs {
            config.backend.request_timeout_secs = secs;
        }
        let backend = build_backend(&config, base_url.as_deref())?;
        Ok((config, backend))
    };

    match command {
        Commands::Status => {
            let (_, backend) = setup()?;
            commands::status::run(&backend).await
        }
        Commands::Upload { file } => {
            let (config, backend) = setup()?;
            commands::upload::run(&config, &backend, &file).await
        }
        Commands::Chat { file } => {
            let (config, backend) = setup()?;
            commands::chat::run(&config, &backend, &file).await
        }
        Commands::Ask { room, name, query } => {
            let (_, backend) = setup()?;
            commands::ask::run(&backend, &room, &name, &query).await
        }

        // Config commands must work even when the config file is broken.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
        },
    }
}

fn build_backend(config: &config::Config, base_url_override: Option<&str>) -> Result<HttpBackend> {
    match base_url_override.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => {
            url::Url::parse(url).with_context(|| format!("Invalid backend base URL: {url}"))?;
            HttpBackend::new(url, config.request_timeout())
        }
        None => HttpBackend::from_config(config),
    }
}
