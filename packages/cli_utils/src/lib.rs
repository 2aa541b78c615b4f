#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `paysplit` binary: a logger that cooperates
//! with progress bars, and a fragment progress bar that plugs into the
//! splitting pipeline.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use paysplit_split::ProgressCallback;

pub use indicatif::MultiProgress;

const TICK: Duration = Duration::from_millis(120);

fn loading_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn fragments_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {msg:12} [{bar:40.green/dim}] {pos:>4}/{len} fragments ({elapsed})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

fn names_message(unique_names: usize) -> String {
    match unique_names {
        1 => "1 name".to_owned(),
        n => format!("{n} names"),
    }
}

/// Progress of one splitting batch on the terminal.
///
/// Shows a spinner while the source document loads and switches to a
/// fragment counter once the pipeline knows how many fragments to expect.
/// Newly found names are printed above the bar.
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    #[must_use]
    pub fn fragments_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner().with_style(loading_style()));
        bar.set_message(message.to_owned());
        bar.enable_steady_tick(TICK);

        Arc::new(Self { bar })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(fragments_style());
        self.bar.set_length(total);
        self.bar.reset();
        self.bar.set_message(names_message(0));
    }

    fn set_processed(&self, processed: u64, unique_names: usize) {
        self.bar.set_position(processed);
        self.bar.set_message(names_message(unique_names));
    }

    fn name_discovered(&self, name: &str) {
        self.bar.println(format!("  + {}", name.replace('_', " ")));
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    fn abandon(&self, msg: String) {
        self.bar.abandon_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`, so log records are printed around progress
/// bars instead of through them.
///
/// Progress bars must be added to the returned [`MultiProgress`].
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let max_level = logger.filter();

    // A logger may already be installed when running under a test harness.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(max_level);
    }

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_name_counts() {
        assert_eq!(names_message(0), "0 names");
        assert_eq!(names_message(1), "1 name");
        assert_eq!(names_message(12), "12 names");
    }
}
