//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{DisplayFilter, PortStatus, ProbeResult, ScanReport};
use console::{style, Style};
use std::io::{self, Write};

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print results in human-readable plain text format.
pub fn print_plain(report: &ScanReport, filter: DisplayFilter) -> io::Result<()> {
    write_plain(&mut io::stdout().lock(), report, filter)
}

fn write_plain<W: Write>(out: &mut W, report: &ScanReport, filter: DisplayFilter) -> io::Result<()> {
    // Header
    writeln!(out)?;
    writeln!(out, "{}", style(HEAVY_RULE).cyan())?;
    writeln!(
        out,
        "                    {} Scan Results",
        style("portsweep").cyan().bold()
    )?;
    writeln!(out, "{}", style(HEAVY_RULE).cyan())?;
    writeln!(out)?;

    // Scan info
    writeln!(out, "  {} {}", style("Target:").bold(), report.target)?;
    writeln!(out, "  {} {}", style("IP Address:").bold(), report.resolved_ip)?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    // Statistics
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s",
        style("Statistics:").bold(),
        report.total_ports_scanned,
        report.duration
    )?;
    writeln!(
        out,
        "               {} open, {} closed, {} filtered, {} error",
        style(report.counts.open).green().bold(),
        style(report.counts.closed).red(),
        style(report.counts.filtered).yellow(),
        style(report.counts.error).magenta()
    )?;
    if report.cancelled {
        writeln!(
            out,
            "  {}",
            style("Scan was interrupted; not every port was probed.").yellow()
        )?;
    }
    writeln!(out)?;

    let visible: Vec<&ProbeResult> = report.visible(filter).collect();
    if visible.is_empty() {
        writeln!(out, "  {}", style("No ports to display.").dim())?;
    } else {
        writeln!(out, "  {}", style(LIGHT_RULE).dim())?;
        writeln!(
            out,
            "  {:>6}  {:^10}  {:<15}  {}",
            style("PORT").bold(),
            style("STATE").bold(),
            style("SERVICE").bold(),
            style("BANNER").bold()
        )?;
        writeln!(out, "  {}", style(LIGHT_RULE).dim())?;

        for result in visible {
            let status_style = match result.status {
                PortStatus::Open => Style::new().green().bold(),
                PortStatus::Closed => Style::new().red(),
                PortStatus::Filtered => Style::new().yellow(),
                PortStatus::Error => Style::new().magenta(),
            };

            // Error rows show their cause where a banner would go
            let detail = match result.status {
                PortStatus::Error => result.error_detail.as_deref(),
                _ => result.banner.as_deref(),
            }
            .map(|b| truncate_string(b, 35))
            .unwrap_or_default();

            writeln!(
                out,
                "  {:>6}  {:^10}  {:<15}  {}",
                result.port,
                status_style.apply_to(result.status.to_string()),
                result.service.as_deref().unwrap_or("-"),
                style(detail).dim()
            )?;
        }

        writeln!(out, "  {}", style(LIGHT_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(HEAVY_RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, ip: &str, ports: usize, concurrency: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("portsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Target: {} ({})",
        style("•").dim(),
        style(target).white().bold(),
        ip
    );
    println!(
        "{} Scanning {} ports, {} at a time...",
        style("•").dim(),
        style(ports).white().bold(),
        concurrency
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
