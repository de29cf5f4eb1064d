//! Import progress bar.

use indicatif::{ProgressBar, ProgressStyle};

/// Imports between progress refreshes.
pub const PROGRESS_INTERVAL: usize = 100;

pub struct ImportProgress {
    bar: ProgressBar,
    total: u64,
    position: u64,
}

impl ImportProgress {
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            let style = ProgressStyle::with_template("{percent:>3}% |{wide_bar}| {spinner} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("|/-\\ ");
            ProgressBar::new(total).with_style(style)
        } else {
            ProgressBar::hidden()
        };
        Self { bar, total, position: 0 }
    }

    pub fn hidden(total: u64) -> Self {
        Self::new(total, false)
    }

    /// Called after each import with the running count.
    pub fn observe(&mut self, imported: usize) {
        if imported % PROGRESS_INTERVAL == 0 {
            self.set(imported);
        }
    }

    pub fn finish(&mut self, imported: usize) {
        self.set(imported);
        self.bar.finish();
    }

    /// Position never moves backwards and never passes the expected total.
    fn set(&mut self, imported: usize) {
        let clamped = (imported as u64).min(self.total).max(self.position);
        self.position = clamped;
        self.bar.set_position(clamped);
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn percent(&self) -> u64 {
        match self.total {
            0 => 100,
            total => self.position * 100 / total,
        }
    }
}
