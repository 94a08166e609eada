//! CLI presenter for output formatting

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::transcription::{JobState, TimeRange};
use crate::domain::units::ByteSize;

const SPINNER_TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars(SPINNER_TICKS)
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn segment_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .tick_chars(SPINNER_TICKS)
        .template("{spinner:.cyan} {msg} [{bar:20.cyan/blue}] {pos}/{len} segments")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Start a progress display for one transcription job
    pub fn job_progress(&self, label: &str) -> JobProgressView {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        JobProgressView {
            bar,
            label: label.to_string(),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (transcripts and machine-readable output)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Format one planned segment as a table row
    pub fn format_plan_row(&self, order: usize, range: TimeRange, estimated_bytes: u64) -> String {
        format!(
            "{:>4}  {:>12} - {:<12} {:>10}",
            order,
            format_timestamp(range.start_ms),
            format_timestamp(range.stop_ms),
            ByteSize::human(estimated_bytes)
        )
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Shareable progress display driven by job callbacks
#[derive(Clone)]
pub struct JobProgressView {
    bar: ProgressBar,
    label: String,
}

impl JobProgressView {
    pub fn on_state(&self, state: JobState) {
        let message = match state {
            JobState::Resolving => "Resolving",
            JobState::Encoding => "Encoding audio",
            JobState::Segmenting => "Segmenting",
            JobState::Dispatching | JobState::Collecting => "Transcribing",
            JobState::Reassembling => "Reassembling",
            JobState::Completed | JobState::Failed | JobState::Cancelled => return,
        };
        self.bar.set_message(format!("{} {}", message, self.label.dimmed()));
    }

    pub fn on_segments_planned(&self, total: usize) {
        self.bar.set_style(segment_bar_style());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    pub fn on_segment_done(&self, done: usize, _total: usize) {
        self.bar.set_position(done as u64);
    }

    pub fn finish_success(&self, message: &str) {
        self.bar.set_style(spinner_style());
        self.bar
            .finish_with_message(format!("{} {}", "✓".green(), message));
    }

    pub fn finish_fail(&self, message: &str) {
        self.bar.set_style(spinner_style());
        self.bar
            .finish_with_message(format!("{} {}", "✗".red(), message));
    }
}

/// Milliseconds as `H:MM:SS.mmm`
pub fn format_timestamp(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!(
        "{}:{:02}:{:02}.{:03}",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60,
        ms % 1000
    )
}
