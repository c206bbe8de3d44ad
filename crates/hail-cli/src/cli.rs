//! CLI entry and dispatch.

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use clap::Parser;
use hail_core::config::{self, Config};
use hail_core::console;
use hail_core::core::signals;
use hail_core::engine::{RemoteEngine, RemoteEngineConfig};
use hail_types::SessionId;

#[derive(Parser)]
#[command(name = "hail")]
#[command(version)]
#[command(about = "Terminal human-in-the-loop client for agent sessions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the engine base URL from config
    #[arg(long, value_name = "URL")]
    engine_url: Option<String>,

    /// Reuse an existing session ID instead of generating one
    #[arg(long, value_name = "ID")]
    session: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
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
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    signals::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                println!("{}", config::paths::config_path().display());
                Ok(())
            }
            ConfigCommands::Init => {
                let path = config::paths::config_path();
                if Config::init()? {
                    println!("Created {}", path.display());
                } else {
                    println!("Config already exists at {}", path.display());
                }
                Ok(())
            }
        },
        None => {
            let mut config = Config::load().context("load config")?;
            if let Some(url) = cli.engine_url {
                config.engine_url = url;
            }
            chat(&config, cli.session).await
        }
    }
}

async fn chat(config: &Config, session_override: Option<String>) -> Result<()> {
    let engine_config = RemoteEngineConfig::new(&config.engine_url, config.api_key.clone())
        .context("configure engine client")?;
    let engine = RemoteEngine::new(engine_config);
    let session = session_override.map_or_else(
        || SessionId::new(uuid::Uuid::new_v4().to_string()),
        SessionId::new,
    );

    // If stdin is piped, run a single turn instead of the REPL
    if !std::io::stdin().is_terminal() {
        let mut prompt = String::new();
        std::io::stdin().lock().read_to_string(&mut prompt)?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            anyhow::bail!("No input provided via pipe");
        }
        let mut stdout = std::io::stdout();
        console::run_single_turn(&engine, &session, prompt, &mut stdout).await?;
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    console::run_console(&engine, &session, stdin.lock(), &mut stdout)
        .await
        .context("interactive console failed")
}
