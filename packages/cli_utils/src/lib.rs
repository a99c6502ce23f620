#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing shared by the climate need binaries: progress bars for
//! shapefile conversion and report writing, and a logger that draws above
//! them.

use std::sync::Arc;
use std::time::Duration;

use climate_need_geography::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const SHAPES_TEMPLATE: &str = "  {msg} {wide_bar:.cyan/dim} {pos}/{len} shapes {percent}% [{eta}]";
const FILES_TEMPLATE: &str = "{msg} {wide_bar:.green/dim} {pos}/{len} files [{elapsed_precise}]";

/// Progress reporting on a terminal bar.
///
/// Conversion starts as a spinner while the shapefile is read and becomes a
/// counted bar once [`ProgressCallback::set_total`] reports the number of
/// shapes.
pub struct IndicatifProgress {
    bar: ProgressBar,
    counted: ProgressStyle,
}

impl IndicatifProgress {
    /// A spinner for shapefile conversion.
    #[must_use]
    pub fn conversion(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(style(SPINNER_TEMPLATE, ProgressStyle::default_spinner()));
        bar.set_message(message.to_string());

        Arc::new(Self {
            bar,
            counted: style(SHAPES_TEMPLATE, ProgressStyle::default_bar()).progress_chars("##-"),
        })
    }

    /// A counted bar for the files of a report.
    #[must_use]
    pub fn report(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let counted = style(FILES_TEMPLATE, ProgressStyle::default_bar()).progress_chars("##-");
        let bar = multi.add(ProgressBar::new(0).with_style(counted.clone()));
        bar.set_message(message.to_string());

        Arc::new(Self { bar, counted })
    }
}

fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or(fallback)
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.counted.clone());
        self.bar.set_length(total);
        self.bar.set_position(0);
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
/// `indicatif-log-bridge`, and returns the [`MultiProgress`] every bar
/// must join for log lines to print above it.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // A second call (tests, the interactive menu) keeps the first logger.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }

    multi
}
