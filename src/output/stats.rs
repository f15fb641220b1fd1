//! Statistics reporting.

use console::style;

use crate::download::{BatchReport, GlobalState};

/// Print statistics for a single year.
pub fn print_batch_stats(year: i32, report: &BatchReport) {
    println!();
    println!("{}", style(format!("Statistics for {}:", year)).bold());
    println!("  Found:    {}", report.found);
    println!("  Pictures: {}", report.pic_count);
    println!("  Videos:   {}", report.vid_count);
    println!("  Skipped:  {} (already downloaded)", report.skipped_count);
    if !report.failures.is_empty() {
        println!("  Failed:   {}", style(report.failed_count()).red());
        for failure in &report.failures {
            println!("    {} - {}", failure.filename, style(&failure.reason).dim());
        }
    }
    println!(
        "  Total:    {} downloaded ({})",
        report.total_downloaded(),
        format_bytes(report.bytes_written)
    );
}

/// Print global statistics across all years.
pub fn print_global_stats(state: &GlobalState) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Global Statistics:").bold());
    println!("  Years processed: {}", state.years_processed);
    if state.years_failed > 0 {
        println!("  Years failed:    {}", style(state.years_failed).red());
    }
    println!("  Pictures: {}", state.pic_count);
    println!("  Videos:   {}", state.vid_count);
    println!("  Skipped:  {} (already downloaded)", state.skipped_count);
    if state.failed_count > 0 {
        println!("  Failed:   {}", style(state.failed_count).red());
    }
    println!(
        "  Total:    {} downloaded ({})",
        state.total_downloaded(),
        format_bytes(state.bytes_written)
    );
    println!("{}", style("═".repeat(50)).dim());
}

/// Human readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
