//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Google Photos library downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "photos-downloader",
    version,
    about = "Download a Google Photos library year by year",
    long_about = "A CLI tool that authorizes against Google with OAuth2 + PKCE and downloads \
                  photos and videos into one directory per year.\n\n\
                  Files that already exist are never downloaded again."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Root directory for downloads (one subdirectory per year).
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// OAuth client ID.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the OAuth client.
    #[arg(long)]
    pub redirect_uri: Option<String>,

    /// Download a single year.
    #[arg(short, long, conflicts_with_all = ["from_year", "to_year"])]
    pub year: Option<i32>,

    /// First year to download.
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Last year to download.
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Maximum simultaneous downloads.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Only download favourites.
    #[arg(long)]
    pub favorites: bool,

    /// Seconds to wait for the browser to complete authorization.
    #[arg(long)]
    pub callback_timeout: Option<u64>,

    /// Print the authorization URL instead of opening a browser.
    #[arg(long)]
    pub no_browser: bool,

    /// Run the authorization flow even if a refresh token is stored.
    #[arg(long)]
    pub reauthorize: bool,

    /// Delete the stored refresh token and exit.
    #[arg(long)]
    pub logout: bool,

    /// Hide download progress information.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        // Credentials
        if let Some(client_id) = &self.client_id {
            config.google.client_id = client_id.clone();
        }

        if let Some(client_secret) = &self.client_secret {
            config.google.client_secret = client_secret.clone();
        }

        if let Some(redirect_uri) = &self.redirect_uri {
            config.google.redirect_uri = redirect_uri.clone();
        }

        // Year range
        if let Some(year) = self.year {
            config.options.start_year = Some(year);
            config.options.end_year = Some(year);
        }

        if let Some(from) = self.from_year {
            config.options.start_year = Some(from);
        }

        if let Some(to) = self.to_year {
            config.options.end_year = Some(to);
        }

        // Options
        if let Some(dir) = &self.download_directory {
            config.options.download_directory = dir.clone();
        }

        if let Some(concurrency) = self.concurrency {
            config.options.concurrency = Some(concurrency);
        }

        if let Some(timeout) = self.callback_timeout {
            config.options.callback_timeout_seconds = Some(timeout);
        }

        // Boolean flags (only override if set to non-default)
        if self.favorites {
            config.options.favorites_only = true;
        }

        if self.no_browser {
            config.options.open_browser = false;
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }
}
