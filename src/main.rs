//! Photos Downloader - CLI entry point.

use std::process::ExitCode;

use chrono::Datelike;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use photos_downloader::{
    app::App,
    auth::Rejection,
    cli::Args,
    config::{validate_config, Config},
    error::{exit_codes, Error, Result},
    output::{
        print_banner, print_config_summary, print_error, print_global_stats, print_info,
        print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::RedirectUri(_)
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::AuthorizationRejected(Rejection::ProviderError(_))
                | Error::CallbackTimeout(_) => ExitCode::from(exit_codes::ABORT as u8),
                Error::AuthorizationRejected(_)
                | Error::TokenExchange(_)
                | Error::Unauthenticated
                | Error::Api(_)
                | Error::IndexFetch(_) => ExitCode::from(exit_codes::API_ERROR as u8),
                Error::Download(_) => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                Error::SomeYearsFailed(_) => ExitCode::from(exit_codes::SOME_YEARS_FAILED as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            config_path.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    let current_year = chrono::Local::now().year();

    // Logging out needs no credentials
    if args.logout {
        App::from_config(config)?.logout().await?;
        print_success("Stored refresh token removed");
        return Ok(());
    }

    // Validate configuration
    validate_config(&config, current_year)?;
    let app = App::from_config(config.clone())?;

    // Print configuration summary
    let (start, end) = config.year_range(current_year);
    print_config_summary(
        (start, end),
        &config.options.download_directory.display().to_string(),
        &app.store().storage_location(),
        config.options.concurrency,
        config.options.favorites_only,
    );

    app.ensure_authorized(args.reauthorize).await?;

    let global_state = app.run_years(start..=end, !args.quiet).await;

    // Print global statistics
    print_global_stats(&global_state);

    if global_state.years_failed > 0 {
        return Err(Error::SomeYearsFailed(global_state.years_failed));
    }

    Ok(())
}
