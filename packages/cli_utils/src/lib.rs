#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the Chocó malaria pipeline.
//!
//! Provides `indicatif`-backed progress bars behind the [`ProgressCallback`]
//! trait, plus [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while progress bars redraw.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use malaria_choco_cases::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Spinner shown while the case table is still being grouped.
const GROUPING_TEMPLATE: &str = "{spinner:.cyan} {msg}: grouping case rows by municipality";

/// Bar over municipality series once their count is known.
const MUNICIPALITY_TEMPLATE: &str =
    "  {msg} {wide_bar:.cyan/dim} {pos}/{len} municipalities [{eta}]";

/// Bar over pipeline stages (interpolate, join, render).
const STAGE_TEMPLATE: &str = "{msg} {wide_bar:.green/dim} stage {pos}/{len} [{elapsed_precise}]";

fn style(template: &str, fallback: fn() -> ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| fallback())
}

/// A pipeline progress bar backed by `indicatif`.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Applied by `set_total()`, once the number of municipalities is known.
    bar_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Progress over the per-municipality interpolation series.
    ///
    /// Spins until [`ProgressCallback::set_total()`] reports how many
    /// municipalities the filtered table holds.
    #[must_use]
    pub fn groups_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_style(style(GROUPING_TEMPLATE, ProgressStyle::default_spinner));
        bar.set_message(message.to_owned());

        let bar_style =
            style(MUNICIPALITY_TEMPLATE, ProgressStyle::default_bar).progress_chars("=>-");

        Arc::new(Self { bar, bar_style })
    }

    /// Progress over the `stages` of a full pipeline run.
    #[must_use]
    pub fn steps_bar(
        multi: &MultiProgress,
        message: &str,
        stages: u64,
    ) -> Arc<dyn ProgressCallback> {
        let bar_style = style(STAGE_TEMPLATE, ProgressStyle::default_bar).progress_chars("=>-");
        let bar = multi.add(ProgressBar::new(stages));
        bar.set_style(bar_style.clone());
        bar.set_message(message.to_owned());

        Arc::new(Self { bar, bar_style })
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.bar_style.clone());
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

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`.
///
/// Bars for the pipeline stages must be added to the returned
/// [`MultiProgress`], or log lines will tear through them.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
