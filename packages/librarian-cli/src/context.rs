//! Application context shared by all commands

use anyhow::{bail, Context, Result};
use chat_librarian::surfaces::{CdpSurface, LaunchOptions};
use chat_librarian::{Librarian, MarkdownDirSink, Platform, PlatformKind};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::PathBuf;

use crate::config::Config;

/// How to get a browser.
#[derive(Debug, Clone, Copy)]
pub enum BrowserMode {
    /// Attach to a browser started with `--remote-debugging-port`
    Attach(u16),
    /// Launch a browser on the saved profile; visible on first run
    Launch { visible: bool },
}

pub type Session = Librarian<CdpSurface, MarkdownDirSink>;

/// Application context passed to all commands
pub struct AppContext {
    pub platform: PlatformKind,
    pub browser: BrowserMode,
    pub output_dir: Option<PathBuf>,
    pub json: bool,
    pub config: Config,
}

impl AppContext {
    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    /// Directory downloads are written to.
    pub fn output_dir(&self, platform: &dyn Platform) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(platform.output_dir_name()))
    }

    pub fn sink(&self, platform: &dyn Platform) -> MarkdownDirSink {
        MarkdownDirSink::new(self.output_dir(platform)).with_json(self.json)
    }

    /// Connect or launch a browser, open the platform and return a session.
    pub async fn open_session(&self) -> Result<Session> {
        let platform = self.platform.adapter();
        let surface = match self.browser {
            BrowserMode::Attach(port) => CdpSurface::attach(port)
                .await
                .with_context(|| format!("Failed to connect to browser on port {port}"))?,
            BrowserMode::Launch { visible } => {
                let profile = self
                    .config
                    .profile_dir
                    .join(format!("{}_data", platform.platform_name().to_lowercase()));
                let mut options = LaunchOptions::new(profile).with_visible(visible);
                if let Some(executable) = &self.config.browser_executable {
                    options = options.with_executable(executable.clone());
                }
                CdpSurface::launch(options)
                    .await
                    .context("Failed to launch browser")?
            }
        };

        let sink = self.sink(platform.as_ref());
        let librarian = Librarian::new(platform, surface, sink);
        librarian.open().await.context("Failed to open chat platform")?;

        if let BrowserMode::Launch { visible: true } = self.browser {
            self.print_warning("Log in in the browser window if needed.");
            let ready = Confirm::with_theme(&self.theme())
                .with_prompt("Logged in and ready to continue?")
                .default(true)
                .interact()?;
            if !ready {
                bail!("Aborted before login completed");
            }
        }
        Ok(librarian)
    }

    pub fn print_header(&self, msg: &str) {
        println!();
        println!("{}", style(msg).bold());
    }

    pub fn print_success(&self, msg: &str) {
        println!("{}", style(msg).green());
    }

    pub fn print_warning(&self, msg: &str) {
        println!("{}", style(msg).yellow());
    }
}

/// Close the browser behind a finished session.
pub async fn close_session(session: Session) -> Result<()> {
    session
        .into_surface()
        .close()
        .await
        .context("Failed to close browser")
}
