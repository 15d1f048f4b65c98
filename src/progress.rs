use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressBarIter, ProgressIterator, ProgressStyle};

const ROW_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} rows";

/// Whether pixel serialization reports its progress on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressConfig {
    is_enabled: bool,
}

impl ProgressConfig {
    pub fn enabled() -> Self {
        ProgressConfig { is_enabled: true }
    }

    pub fn disabled() -> Self {
        ProgressConfig { is_enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Start tracking `rows` rows of an image. Hidden when disabled.
    pub fn rows(&self, rows: u32, message: &'static str) -> Result<RowProgress> {
        if !self.is_enabled() {
            return Ok(RowProgress {
                bar: ProgressBar::hidden(),
            });
        }

        let style = ProgressStyle::default_bar()
            .template(ROW_TEMPLATE)
            .context("Invalid progress template")?;
        let bar = ProgressBar::new(u64::from(rows))
            .with_style(style)
            .with_message(message);

        Ok(RowProgress { bar })
    }
}

/// A row counter for one pass over an image.
#[derive(Debug)]
pub struct RowProgress {
    bar: ProgressBar,
}

impl RowProgress {
    /// Tick once per row yielded by `rows`.
    pub fn track<I: Iterator>(&self, rows: I) -> ProgressBarIter<I> {
        rows.progress_with(self.bar.clone())
    }

    /// Remove the bar from the terminal.
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
