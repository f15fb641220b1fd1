//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Photos Downloader                                 ║
║     Google Photos library, one folder per year        ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(
    years: (i32, i32),
    download_dir: &str,
    token_location: &str,
    concurrency: Option<usize>,
    favorites_only: bool,
) {
    let (start, end) = years;
    let years = if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    };
    let concurrency = concurrency
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unlimited".to_string());

    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Years: {}", years);
    println!("  Directory: {}", download_dir);
    println!("  Token: {}", token_location);
    println!("  Concurrency: {}", concurrency);
    if favorites_only {
        println!("  Favorites only");
    }
    println!();
}
