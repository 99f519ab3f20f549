//! `librarian` - download chat conversations as Markdown.

mod cmd;
mod config;
mod context;

use anyhow::{Context, Result};
use chat_librarian::PlatformKind;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::context::{AppContext, BrowserMode};

#[derive(Parser, Debug)]
#[command(name = "librarian", version, about = "Download chat conversations as Markdown")]
struct Cli {
    /// Chat platform: chatgpt or gemini
    #[arg(long, global = true)]
    platform: Option<String>,

    /// Attach to a browser running with --remote-debugging-port=PORT
    #[arg(long, global = true, conflicts_with = "first_run")]
    port: Option<u16>,

    /// Launch a visible browser to log in for the first time
    #[arg(long, global = true)]
    first_run: bool,

    /// Directory to save downloads to
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Also write each conversation as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List conversation titles, most recent first
    List,
    /// Download the most recent conversation
    Last,
    /// Download a conversation by exact title (case-insensitive)
    Download { title: String },
    /// Pick a conversation interactively
    Pick,
    /// Extract a conversation from a saved HTML page
    ExtractFile {
        path: PathBuf,
        /// Title for the output file; defaults to the file name
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        if is_connection_refused(&err) {
            eprintln!(
                "{}",
                "Is Chrome running with '--remote-debugging-port=<PORT>'?".yellow()
            );
        }
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let fallback = if debug {
        "debug,chat_librarian=debug"
    } else {
        "info,chat_librarian=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let platform_name = cli.platform.unwrap_or_else(|| config.platform.clone());
    let platform: PlatformKind = platform_name.parse()?;

    // a first run always launches, even with a port in the environment
    let port = cli.port.or(if cli.first_run { None } else { config.cdp_port });
    let browser = match port {
        Some(port) => BrowserMode::Attach(port),
        None => BrowserMode::Launch {
            visible: cli.first_run,
        },
    };

    let ctx = AppContext {
        platform,
        browser,
        output_dir: cli.output_dir.or_else(|| config.output_dir.clone()),
        json: cli.json,
        config,
    };

    match cli.command {
        Command::List => cmd::list::run(&ctx).await,
        Command::Last => cmd::last::run(&ctx).await,
        Command::Download { title } => cmd::download::run(&ctx, &title).await,
        Command::Pick => cmd::pick::run(&ctx).await,
        Command::ExtractFile { path, title } => {
            cmd::extract_file::run(&ctx, &path, title.as_deref()).await
        }
    }
}

fn is_connection_refused(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        let msg = cause.to_string().to_lowercase();
        msg.contains("connection refused") || msg.contains("cannot reach")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_conflicts_with_first_run() {
        let parsed = Cli::try_parse_from(["librarian", "--port", "9222", "--first-run", "list"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_download_takes_title() {
        let cli = Cli::try_parse_from(["librarian", "--platform", "gemini", "download", "Trip Plan"]).unwrap();
        assert_eq!(cli.platform.as_deref(), Some("gemini"));
        assert!(matches!(cli.command, Command::Download { title } if title == "Trip Plan"));
    }

    #[test]
    fn test_extract_file_title_is_optional() {
        let cli = Cli::try_parse_from(["librarian", "extract-file", "page.html"]).unwrap();
        assert!(matches!(cli.command, Command::ExtractFile { title: None, .. }));
    }

    #[test]
    fn test_connection_refused_detection() {
        let err = anyhow::anyhow!("tcp connect error: Connection refused (os error 111)")
            .context("Failed to connect to browser on port 9222");
        assert!(is_connection_refused(&err));
        assert!(!is_connection_refused(&anyhow::anyhow!("no chat found")));
    }
}
