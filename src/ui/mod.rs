//! CLI UI utilities for terminal output.
//!
//! This module provides colored output, a progress spinner, source icons,
//! and the renderers for ranked search results.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{ScoredArticle, SearchResult, SourceKind, SourceStatus};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a terminal (where the spinner draws).
pub fn stderr_is_terminal() -> bool {
    std::io::stderr().is_terminal()
}

/// Icon for each literature source.
pub fn source_icon(source: SourceKind) -> &'static str {
    match source {
        SourceKind::PubMed => "🏥",
        SourceKind::EuropePmc => "🌍",
        SourceKind::Arxiv => "📝",
        SourceKind::PubMedCentral => "📚",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(80).dimmed());
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    // Find the longest prefix that fits
    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width - 3 {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Format one ranked article as a plain-text block.
///
/// ```text
/// Title (Source)
/// Abstract
/// Similarity: 0.87
/// ---
/// ```
pub fn format_article_block(article: &ScoredArticle) -> String {
    format!(
        "{} ({})\n{}\nSimilarity: {:.2}\n---",
        article.title(),
        article.source(),
        article.abstract_text(),
        article.similarity
    )
}

/// Print ranked articles as plain-text blocks, or "No articles found."
pub fn print_results_plain(result: &SearchResult) {
    if result.is_empty() {
        println!("No articles found.");
        return;
    }
    for article in result {
        println!("{}", format_article_block(article));
    }
}

/// Build a table of ranked articles sized to `width` columns.
pub fn results_table(result: &SearchResult, width: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width.min(u16::MAX as usize) as u16)
        .set_header(vec!["#", "Score", "Source", "Title", "Abstract"]);

    let title_width = (width / 3).max(20);
    let abstract_width = (width / 3).max(20);

    for (rank, article) in result.iter().enumerate() {
        let abstract_text = if article.abstract_text().is_empty() {
            "-".to_string()
        } else {
            truncate_with_ellipsis(article.abstract_text(), abstract_width * 2)
        };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(format!("{:.2}", article.similarity)),
            Cell::new(format!(
                "{} {}",
                source_icon(article.source()),
                article.source()
            )),
            Cell::new(truncate_with_ellipsis(article.title(), title_width * 2)),
            Cell::new(abstract_text),
        ]);
    }

    table
}

/// Print a warning for each source that failed during the search.
pub fn print_source_failures(result: &SearchResult) {
    for report in &result.reports {
        if let SourceStatus::Failed { error } = &report.status {
            print_status(
                Status::Warning,
                &format!("{} unavailable: {}", report.source, error),
            );
        }
    }
}

/// A loading spinner with message, drawn on stderr.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(styled("{spinner:.cyan} {msg}", "⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb.set_style(styled("{spinner:.green} {msg}", "✓✓"));
        self.pb.finish_with_message(msg.to_string());
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.pb.set_style(styled("{spinner:.red} {msg}", "✗✗"));
        self.pb.finish_with_message(msg.to_string());
    }
}

fn styled(template: &str, ticks: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(ticks)
}
