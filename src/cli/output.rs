//! Shared CLI output helpers for consistent terminal output.
//!
//! Styling goes through `console`, which disables colors when the stream
//! is not a terminal or NO_COLOR is set.

use console::style;

/// Print a success message with checkmark.
///
/// Example: `✓ set DB_PASS`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr.
///
/// Example: `✗ stage staging does not exist in this project`
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a warning message.
///
/// Example: `⚠ no KMS key configured, storing plain`
pub fn warn(msg: &str) {
    println!("{} {}", style("⚠").yellow(), msg);
}

/// Print a hint message.
///
/// Example: `→ run stagehand init first`
pub fn hint(msg: &str) {
    println!("{}", style(format!("→ {}", msg)).cyan());
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Format a scope label for a listing header (underlined, like `common:`).
pub fn scope_header(indent: usize, label: &str) -> String {
    format!("{}{}:", "    ".repeat(indent), style(label).underlined())
}

/// Format one `key = value` listing line.
pub fn variable_line(indent: usize, key: &str, value: &str) -> String {
    format!(
        "{}{} = {}",
        "    ".repeat(indent),
        style(key).bold().green(),
        style(value).green()
    )
}

/// Format a key name for inline mention.
pub fn key(k: &str) -> String {
    style(k).cyan().to_string()
}
