//! Progress indicators for check runs
//!
//! Uses `linya`, which draws to stderr and leaves stdout to the report.

use linya::{Bar, Progress};

/// Single bar counting finished checks
pub struct CheckProgress {
  progress: Progress,
  bar: Bar,
}

impl CheckProgress {
  /// Create a new progress bar for `total` checks
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
