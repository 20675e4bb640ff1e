//! Command surface for the audit pipeline.
//!
//! The CLI is a thin adapter: it validates arguments into an
//! [`AuditConfig`], runs the audit, prints the report, and maps the outcome
//! to an exit status (0 clean, 1 problems found, 2 fatal error).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::audit::audit;
use crate::config::AuditConfig;
use crate::constants::defaults::{MAX_BRIGHTNESS, MAX_ZERO_ANGLE_COUNT, MIN_BRIGHTNESS};
use crate::data::AuditReport;

/// Parsed command-line arguments for `tub-audit`.
#[derive(Debug, Parser)]
#[command(
    name = "tub-audit",
    disable_help_subcommand = true,
    about = "Audit a driving-log tub for unusable frames",
    long_about = "Flag frames whose image is missing, corrupt, or out of brightness \
                  bounds, and frames inside over-long zero-steering runs. Findings are \
                  reported by default; --remove persists them into the manifest's \
                  deletion index."
)]
pub struct AuditCli {
    #[arg(long = "tub", value_name = "PATH", help = "Path to the tub directory")]
    tub: PathBuf,
    #[arg(
        long,
        help = "Persist findings into the deletion index instead of only reporting"
    )]
    remove: bool,
    #[arg(
        long = "max-brightness",
        default_value_t = MAX_BRIGHTNESS,
        value_parser = parse_brightness,
        help = "Maximum acceptable mean grayscale intensity"
    )]
    max_brightness: f64,
    #[arg(
        long = "min-brightness",
        default_value_t = MIN_BRIGHTNESS,
        value_parser = parse_brightness,
        help = "Minimum acceptable mean grayscale intensity"
    )]
    min_brightness: f64,
    #[arg(
        long = "max-zero-angle-count",
        default_value_t = MAX_ZERO_ANGLE_COUNT,
        help = "Longest tolerated run of near-zero steering angles"
    )]
    max_zero_angle_count: usize,
}

impl AuditCli {
    /// Fold the parsed arguments into a validated config.
    fn into_config(self) -> Result<(PathBuf, AuditConfig), String> {
        if self.min_brightness > self.max_brightness {
            return Err(format!(
                "--min-brightness ({}) must not exceed --max-brightness ({})",
                self.min_brightness, self.max_brightness
            ));
        }
        let config = AuditConfig {
            remove: self.remove,
            max_brightness: self.max_brightness,
            min_brightness: self.min_brightness,
            max_zero_angle_count: self.max_zero_angle_count,
        };
        Ok((self.tub, config))
    }
}

fn parse_brightness(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("brightness must be finite and non-negative, got {raw}"));
    }
    Ok(value)
}

/// Entry point used by the `tub-audit` binary.
pub fn run() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let (tub, config) = match AuditCli::parse().into_config() {
        Ok(parts) => parts,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    match audit(&tub, &config) {
        Ok(report) => {
            print_report(&report);
            if report.problems.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(2)
        }
    }
}

fn print_report(report: &AuditReport) {
    println!("previously deleted indices: {}", report.previously_deleted);
    println!("total records: {}", report.total_records);
    if report.malformed_lines > 0 {
        println!("skipped malformed catalog lines: {}", report.malformed_lines);
    }
    if report.problems.is_empty() {
        println!("no problem frames found");
        return;
    }
    println!("found {} problem frames:", report.problem_count());
    for entry in &report.problems {
        let path = entry
            .image_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<no image>".to_string());
        println!("  index {}: {} - {}", entry.index, path, entry.reason);
    }
    if report.committed {
        println!(
            "added {} indices to the deletion index",
            report.problem_count()
        );
    }
}
