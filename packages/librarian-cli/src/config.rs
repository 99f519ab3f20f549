use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables. Command-line flags
/// override these values.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for downloads; the platform's directory name when unset
    pub output_dir: Option<PathBuf>,
    /// Parent of the per-platform browser profiles
    pub profile_dir: PathBuf,
    pub cdp_port: Option<u16>,
    pub platform: String,
    /// Browser binary for launch mode; searched on `PATH` when unset
    pub browser_executable: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenv();

        let profile_dir = match env::var("LIBRARIAN_PROFILE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .context("Could not determine home directory for browser profiles")?
                .join(".chat_scraper_data"),
        };

        let cdp_port = match env::var("LIBRARIAN_CDP_PORT") {
            Ok(port) => Some(
                port.parse()
                    .context("LIBRARIAN_CDP_PORT must be a valid port number")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            output_dir: env::var("LIBRARIAN_OUTPUT_DIR").ok().map(PathBuf::from),
            profile_dir,
            cdp_port,
            platform: env::var("LIBRARIAN_PLATFORM").unwrap_or_else(|_| "chatgpt".to_string()),
            browser_executable: env::var("LIBRARIAN_BROWSER").ok().map(PathBuf::from),
        })
    }
}
