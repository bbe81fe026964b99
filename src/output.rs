//! Terminal output for the command-line front end.
//!
//! Everything the user is meant to read goes through [`OutputFormatter`]:
//! status lines, the progress bar, per-category listings and the summary
//! table. Diagnostics go through `tracing` instead.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

const PROGRESS_TEMPLATE: &str = "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Stateless helper for styled CLI output.
///
/// Status lines start with a colored marker: `✓` success, `✗` error (on
/// stderr), `⚠` warning.
pub struct OutputFormatter;

impl OutputFormatter {
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::success("Sorting complete.");
    /// ```
    pub fn success(message: &str) {
        println!("{}", status_line("✓".green(), message));
    }

    pub fn error(message: &str) {
        eprintln!("{}", status_line("✗".red(), message));
    }

    pub fn warning(message: &str) {
        println!("{}", status_line("⚠".yellow(), message));
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Bold section title preceded by a blank line.
    pub fn header(title: &str) {
        println!("\n{}", title.bold());
    }

    /// Creates a hidden-length progress bar; the first
    /// [`update_progress`](Self::update_progress) call sets its length.
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar();
    /// OutputFormatter::update_progress(&pb, 1, 10);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar() -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        ProgressBar::new(0).with_style(style)
    }

    /// Applies a `(processed, total)` update from the sort or undo engine.
    pub fn update_progress(pb: &ProgressBar, processed: usize, total: usize) {
        pb.set_length(total as u64);
        pb.set_position(processed as u64);
    }

    /// Prints per-category counts with their share of the total, in the
    /// order given.
    pub fn summary_table(category_counts: &[(String, usize)], total_files: usize) {
        Self::header("Summary");
        for line in summary_lines(category_counts, total_files) {
            println!("{}", line);
        }
    }

    /// Lists up to `limit` file names under a category heading.
    pub fn category_listing(category: &str, names: &[String], limit: usize) {
        println!("{} ({})", category.bold(), names.len());
        for name in names.iter().take(limit) {
            println!("  • {}", name);
        }
        if names.len() > limit {
            let more = format!("... and {} more", names.len() - limit);
            println!("  • {}", more.dimmed());
        }
    }

    pub fn dry_run_notice(message: &str) {
        println!("{} {}", "[DRY RUN]".yellow().bold(), message);
    }
}

fn status_line(marker: ColoredString, message: &str) -> String {
    format!("{} {}", marker, message)
}

/// Plain-text rows of the summary table, without colors.
fn summary_lines(category_counts: &[(String, usize)], total_files: usize) -> Vec<String> {
    let name_width = category_counts
        .iter()
        .map(|(name, _)| name.len())
        .chain(std::iter::once("Category".len()))
        .max()
        .unwrap_or(0);
    let count_width = total_files.to_string().len().max("Files".len());
    let rule = "-".repeat(name_width + count_width + 11);

    let row = |name: &str, count: usize| {
        format!(
            "{:<name_width$}  {:>count_width$}  {:>5.1}%",
            name,
            count,
            percentage(count, total_files)
        )
    };

    let mut lines = Vec::with_capacity(category_counts.len() + 4);
    lines.push(format!(
        "{:<name_width$}  {:>count_width$}  {:>6}",
        "Category", "Files", "Share"
    ));
    lines.push(rule.clone());
    lines.extend(category_counts.iter().map(|(name, count)| row(name, *count)));
    lines.push(rule);
    lines.push(row("Total", total_files));
    lines
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// "file" or "files" for a count.
pub fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
