//! Cargo-style status lines and the resolution spinner, all on stderr.

use std::io::Write;

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};

fn print_status(style: Style, label: &str, message: &str) {
    let _ = writeln!(
        std::io::stderr(),
        "{:>12} {message}",
        style.bold().apply_to(label)
    );
}

/// Action line with a green label: `   Compiling org.example:core:2.0.0`.
pub fn status(label: &str, message: &str) {
    print_status(Style::new().green(), label, message);
}

/// Informational line (cyan label), e.g. modules that are already fresh.
pub fn status_info(label: &str, message: &str) {
    print_status(Style::new().cyan(), label, message);
}

/// Warning line (yellow label): skipped, cancelled or reconciled modules.
pub fn status_warn(label: &str, message: &str) {
    print_status(Style::new().yellow(), label, message);
}

/// Error line (red label).
pub fn status_error(label: &str, message: &str) {
    print_status(Style::new().red(), label, message);
}

/// A ticking spinner for work of unknown length. Hidden when stderr is not
/// a terminal. Finish it with [`ProgressBar::finish_and_clear`].
pub fn spinner(message: &str) -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
