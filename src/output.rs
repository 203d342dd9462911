// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output and color utilities for consistent terminal formatting
//!
//! Provides shared color functions respecting NO_COLOR environment variable.

use colored::Colorize;

/// Check if colors should be used (respects NO_COLOR env var)
pub fn use_colors() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Colorize file path (cyan)
pub fn colorize_path(text: &str, use_color: bool) -> String {
    if use_color {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize similarity score: green for strong, yellow otherwise
pub fn colorize_score(score: f32, use_color: bool) -> String {
    let text = format!("{score:.3}");
    if !use_color {
        return text;
    }
    if score >= 0.7 {
        text.green().to_string()
    } else {
        text.yellow().to_string()
    }
}

/// Colorize status line (bold)
pub fn colorize_status(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Colorize secondary detail (dimmed)
pub fn colorize_detail(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_without_color() {
        assert_eq!(colorize_path("docs/a.md", false), "docs/a.md");
        assert_eq!(colorize_score(0.91234, false), "0.912");
    }
}
