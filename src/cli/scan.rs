//! Scan command implementation.
//!
//! Merges flags with the settings file, builds the request, runs the engine
//! and renders the report.

use crate::cli::{Cli, OutputFormat};
use crate::config::{AppSettings, Paths};
use crate::error::{CliResult, ScanError};
use crate::output;
use crate::scanner::{build_request, duration_from_secs, run_scan, DisplayFilter, ScanOptions};
use crate::services::{ServiceDatabase, ServiceTable};
use crate::storage::save_report;
use crate::types::TargetResolver;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Execute a scan as described by the parsed command line.
pub async fn execute(cli: &Cli) -> CliResult<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path)?,
        None => AppSettings::load()?,
    };

    let format = match cli.format {
        Some(format) => format,
        None => OutputFormat::from_str(&settings.default_output_format, true).map_err(|_| {
            ScanError::InvalidConfig(format!(
                "unknown default_output_format '{}'",
                settings.default_output_format
            ))
        })?,
    };

    let options = scan_options(cli, &settings)?;
    let ports = cli.ports.as_deref().unwrap_or(&settings.default_ports);

    let resolver = TargetResolver::new();
    let request = build_request(&resolver, &cli.target, ports, options).await?;

    let show_chrome = !cli.quiet && format == OutputFormat::Plain;
    if show_chrome {
        output::print_scan_header(
            &request.target().original,
            &request.ip().to_string(),
            request.ports().len(),
            request.options().concurrency,
        );
    }

    let cache_file = match Paths::new() {
        Ok(paths) => Some(paths.service_cache_file()),
        Err(e) => {
            tracing::debug!(error = %e, "no service cache location");
            None
        }
    };
    let services = service_table(&settings, cache_file);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping dispatch");
            interrupt.cancel();
        }
    });

    let progress = (cli.verbose && format == OutputFormat::Plain)
        .then(|| progress_bar(request.ports().len() as u64));

    let report = run_scan(&request, &services, cancel, progress.clone()).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    if report.cancelled && !cli.quiet {
        output::print_warning("scan interrupted; showing partial results");
    }

    let filter = DisplayFilter::from_flags(cli.open_only, cli.show_closed);
    output::print_report(&report, format, filter)?;

    if let Some(path) = &cli.output {
        save_report(path, &report, filter)?;
        if show_chrome {
            output::print_info(&format!("Report written to {}", path.display()));
        }
    }

    Ok(())
}

/// Resolve timing and concurrency: flags first, then settings.
fn scan_options(cli: &Cli, settings: &AppSettings) -> CliResult<ScanOptions> {
    let timeout_secs = cli.timeout.unwrap_or(settings.default_timeout_secs);
    let connect_timeout = duration_from_secs("timeout", timeout_secs)?;

    let banner_timeout = match cli.banner_timeout.or(settings.default_banner_timeout_secs) {
        Some(secs) => duration_from_secs("banner timeout", secs)?,
        None => connect_timeout,
    };

    let mut options = ScanOptions::default()
        .with_connect_timeout(connect_timeout)
        .with_banner_timeout(banner_timeout)
        .with_concurrency(cli.concurrency.unwrap_or(settings.default_concurrency));

    if cli.no_banner {
        options = options.without_banners();
    }

    Ok(options)
}

/// Service names: cached database (or IANA export, or built-in) plus the
/// settings file's own entries.
fn service_table(settings: &AppSettings, cache_file: Option<PathBuf>) -> ServiceTable {
    let mut database = ServiceDatabase::new().with_max_age_days(settings.service_cache_days);

    if let Some(cache) = cache_file {
        database = database.with_cache_file(cache);
    }
    if let Some(csv) = &settings.service_csv {
        database = database.with_iana_csv(csv);
    }

    ServiceTable::load(&database).with_overrides(settings.services.clone())
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}
