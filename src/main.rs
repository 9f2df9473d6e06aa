// ABOUTME: Main entry point for termlink: connect to a session or host one

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use termlink::config::{self, Config};

#[derive(Debug, Parser)]
#[command(name = "termlink", version, about = "Relay a terminal session over WebSocket")]
struct Cli {
    /// Config file (defaults to ~/.termlink/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Attach this terminal to a remote session
    Connect {
        /// Page URL (http/https) or session endpoint (ws/wss)
        url: Option<String>,

        /// Write session output without translating LF to CRLF
        #[arg(long)]
        raw_eol: bool,
    },
    /// Host sessions: run a program in a PTY for every WebSocket client
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,

        /// Program and arguments to run (defaults to the configured command)
        #[arg(last = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Connect { url, raw_eol } => {
            setup_file_logging()?;
            setup_panic_handler();
            if raw_eol {
                config.client.convert_eol = false;
            }
            termlink::client::connect(&config.client, url.as_deref())
                .await
                .context("Session failed")?;
        }
        Command::Serve { bind, command } => {
            setup_stderr_logging();
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some((program, args)) = command.split_first() {
                config.server.command = program.clone();
                config.server.args = args.to_vec();
            }
            termlink::server::run(config.server)
                .await
                .context("Session host failed")?;
        }
    }

    Ok(())
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "termlink=info".into())
}

/// The session owns the tty, so the client logs to a file.
fn setup_file_logging() -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    let log_dir = config::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_file = log_dir.join(format!(
        "termlink-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false), // No ANSI colors in log file
        )
        .with(env_filter())
        .init();

    Ok(())
}

fn setup_stderr_logging() {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

fn setup_panic_handler() {
    use tracing::error;

    std::panic::set_hook(Box::new(|panic_info| {
        // Ensure terminal is restored before logging the panic
        let _ = crossterm::terminal::disable_raw_mode();

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs in {} for more details.", config::log_dir().display());
    }));
}
