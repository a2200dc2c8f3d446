#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the `gehl_map` binary: the progress bar used while
//! buildings are annotated, and logger setup that keeps log lines from
//! tearing through that bar.

use std::sync::Arc;
use std::time::Duration;

use gehl_map_features::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// [`ProgressCallback`] drawn as an `indicatif` bar.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Applied by `set_total()`; until then the bar is a spinner.
    counted_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Spinner labelled `message` that turns into a counted bar when the
    /// record total arrives.
    #[must_use]
    pub fn records_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let counted_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.green/dim} {human_pos}/{human_len} [{elapsed}<{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

        Arc::new(Self { bar, counted_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.counted_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` (level from `RUST_LOG`) behind
/// `indicatif-log-bridge` and returns the [`MultiProgress`] that owns every
/// bar the binary draws.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already set when called twice in one process (tests).
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
