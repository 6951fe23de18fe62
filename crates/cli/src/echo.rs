use owo_colors::OwoColorize;

use splitview_core::ExtractedItem;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "SplitView".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Extract picked elements of web pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a labelled detail line under a step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information, colored by duration
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 1000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print one line per extracted item
pub fn print_items(items: &[ExtractedItem]) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extracted Items".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());

    for item in items {
        eprintln!(
            "  {} {}",
            format!("#{}", item.index).dimmed(),
            format_size(item.html.len()).bright_white()
        );
    }
    eprintln!();
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
