//! Status output on stderr: right-aligned coloured labels and spinners.
//!
//! stdout is reserved for command results (trees, JSON), so everything here
//! goes to stderr.

use std::io::Write;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Width of the label column.
const LABEL_WIDTH: usize = 12;

/// Render `label` right-aligned in the label column, followed by `message`.
pub fn status_line(style: &Style, label: &str, message: &str) -> String {
    format!(
        "{:>width$} {message}",
        style.apply_to(label),
        width = LABEL_WIDTH
    )
}

fn emit(style: Style, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", status_line(&style, label, message));
}

/// A finished action: `    Resolved App (3 dependencies, 5 modules)`.
pub fn status(label: &str, message: &str) {
    emit(Style::new().green().bold(), label, message);
}

/// Where a command is reading from or writing to, in bold cyan.
pub fn status_info(label: &str, message: &str) {
    emit(Style::new().cyan().bold(), label, message);
}

/// Something the user asked for that could not be shown.
pub fn status_warn(label: &str, message: &str) {
    emit(Style::new().yellow().bold(), label, message);
}

/// A ticking spinner for work of unknown length. Finish it with
/// [`ProgressBar::finish_and_clear`] before printing results.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
