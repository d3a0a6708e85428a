//! Progress and logging utilities for the CLI.
//!
//! Spinners for long comparison phases, with a log-only mode where they are
//! hidden so the output stays tail-friendly, and the tracing subscriber
//! setup.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Global flag for log-only mode (set from args in main)
pub static LOG_ONLY: AtomicBool = AtomicBool::new(false);

pub fn set_log_only(value: bool) {
    LOG_ONLY.store(value, Ordering::Relaxed);
}

pub fn is_log_only() -> bool {
    LOG_ONLY.load(Ordering::Relaxed)
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "vinyl_match=debug,info"
    } else {
        "vinyl_match=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

/// Spinner frames: a record turning on the platter
const SPIN_FRAMES: &[&str] = &["◐", "◓", "◑", "◒", "●"];

/// Elapsed time for the run summary: milliseconds under a second,
/// `1m 05s` style past a minute.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        return format!("{}ms", millis);
    }
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Spinner for a matching phase whose size is not known up front.
/// Hidden in log-only mode.
pub fn create_spinner(phase: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg:.bold} ({elapsed})")
                .unwrap()
                .tick_strings(SPIN_FRAMES),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
    }
    pb.set_message(format!("{}...", phase));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(42)), "42ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 05s");
        assert_eq!(format_duration(Duration::from_secs(600)), "10m 00s");
    }

    #[test]
    fn test_spinner_hidden_in_log_only_mode() {
        set_log_only(true);
        let spinner = create_spinner("Comparing listings");
        assert!(spinner.is_hidden());
        assert_eq!(spinner.message(), "Comparing listings...");
        spinner.finish_and_clear();
        set_log_only(false);
    }
}
