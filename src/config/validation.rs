//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};
use regex::Regex;
use url::{Host, Url};

/// Shape of a Google OAuth client ID.
const CLIENT_ID_PATTERN: &str = r"^[0-9]+-[a-z0-9]+\.apps\.googleusercontent\.com$";

/// Earliest year worth searching.
const MIN_YEAR: i32 = 1900;

/// Validate the entire configuration.
///
/// `current_year` bounds the year range.
pub fn validate_config(config: &Config, current_year: i32) -> Result<()> {
    validate_client_id(&config.google.client_id)?;
    validate_client_secret(&config.google.client_secret)?;
    validate_redirect_uri(&config.google.redirect_uri)?;
    validate_years(config, current_year)?;

    if config.options.concurrency == Some(0) {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: "Concurrency must be at least 1 (leave unset for no limit)".to_string(),
        });
    }

    Ok(())
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("replaceme") || lower.contains("your_client") || lower.starts_with('<')
}

/// Validate the OAuth client ID.
pub fn validate_client_id(client_id: &str) -> Result<()> {
    if client_id.trim().is_empty() {
        return Err(Error::MissingConfig(
            "google.client_id (or GOOGLE_CLIENT_ID)".to_string(),
        ));
    }

    if is_placeholder(client_id) {
        return Err(Error::ConfigValidation {
            field: "client_id".to_string(),
            message: "Client ID appears to be a placeholder. Use the ID of your OAuth client."
                .to_string(),
        });
    }

    let pattern = Regex::new(CLIENT_ID_PATTERN)
        .map_err(|e| Error::Config(format!("Invalid client ID pattern: {}", e)))?;
    if !pattern.is_match(client_id) {
        tracing::warn!(
            "Client ID '{}' does not look like a Google OAuth client ID",
            client_id
        );
    }

    Ok(())
}

/// Validate the OAuth client secret.
pub fn validate_client_secret(client_secret: &str) -> Result<()> {
    if client_secret.trim().is_empty() {
        return Err(Error::MissingConfig(
            "google.client_secret (or GOOGLE_CLIENT_SECRET)".to_string(),
        ));
    }

    if is_placeholder(client_secret) {
        return Err(Error::ConfigValidation {
            field: "client_secret".to_string(),
            message: "Client secret appears to be a placeholder.".to_string(),
        });
    }

    Ok(())
}

/// The redirect must be something the local listener can serve: plain http,
/// a loopback host, an explicit port and a path.
pub fn validate_redirect_uri(redirect_uri: &str) -> Result<()> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| Error::RedirectUri(format!("{}: {}", redirect_uri, e)))?;

    if url.scheme() != "http" {
        return Err(Error::RedirectUri(format!(
            "{}: scheme must be http",
            redirect_uri
        )));
    }

    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    if !loopback {
        return Err(Error::RedirectUri(format!(
            "{}: host must be localhost or a loopback address",
            redirect_uri
        )));
    }

    if url.port().is_none() {
        return Err(Error::RedirectUri(format!(
            "{}: an explicit port is required",
            redirect_uri
        )));
    }

    if url.path() == "/" {
        tracing::warn!(
            "Redirect URI {} has no path; it must still match the registered URI exactly",
            redirect_uri
        );
    }

    Ok(())
}

/// Validate the configured year range.
pub fn validate_years(config: &Config, current_year: i32) -> Result<()> {
    let (start, end) = config.year_range(current_year);

    for (field, year) in [("start_year", start), ("end_year", end)] {
        if year < MIN_YEAR || year > current_year + 1 {
            return Err(Error::ConfigValidation {
                field: field.to_string(),
                message: format!(
                    "Year {} is outside {}..={}",
                    year,
                    MIN_YEAR,
                    current_year + 1
                ),
            });
        }
    }

    if start > end {
        return Err(Error::ConfigValidation {
            field: "start_year".to_string(),
            message: format!("Start year {} is after end year {}", start, end),
        });
    }

    Ok(())
}
