//! CLI table output.
//!
//! Renders the results of the `entries`, `inspect` and `hooks` commands as
//! terminal tables:
//! - resolved entries with their source paths
//! - the configuration sources that were found and merged
//! - the files a gate check refused, with a one-line verdict

use crate::config_hierarchy::{ConfigSourceType, HierarchicalConfig};
use crate::entry::EntryMap;
use crate::gate::GateDecision;
use prettytable::{Attr, Cell, Row, Table, format};

/// Maximum width for the message column before truncation.
const MAX_MESSAGE_WIDTH: usize = 60;

/// Truncates a message to [`MAX_MESSAGE_WIDTH`] characters, ending it with
/// "..." when it was cut.
#[must_use]
fn truncate_message(message: &str) -> String {
    if message.chars().count() > MAX_MESSAGE_WIDTH {
        let kept: String = message.chars().take(MAX_MESSAGE_WIDTH.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        message.to_string()
    }
}

fn table_format() -> format::TableFormat {
    format::FormatBuilder::new()
        .column_separator('│')
        .borders('│')
        .separator(
            format::LinePosition::Top,
            format::LineSeparator::new('─', '┬', '┌', '┐'),
        )
        .separator(
            format::LinePosition::Title,
            format::LineSeparator::new('═', '╪', '╞', '╡'),
        )
        .separator(
            format::LinePosition::Bottom,
            format::LineSeparator::new('─', '┴', '└', '┘'),
        )
        .padding(1, 1)
        .build()
}

fn titled_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(table_format());
    table.set_titles(Row::new(
        titles.iter().map(|t| Cell::new(t).with_style(Attr::Bold)).collect(),
    ));
    table
}

/// Renders resolved entries as a two-column table.
///
/// # Example
///
/// ```rust
/// use scaffold_core::cli_report::render_entry_table;
/// use scaffold_core::entry::EntryMap;
///
/// let mut entries = EntryMap::new();
/// entries.insert("home".to_string(), "src/pages/home/home.js".to_string());
///
/// let table = render_entry_table(&entries);
/// assert!(table.contains("src/pages/home/home.js"));
/// ```
#[must_use]
pub fn render_entry_table(entries: &EntryMap) -> String {
    if entries.is_empty() {
        return "No entries found.\n".to_string();
    }
    let mut table = titled_table(&["Entry", "Source"]);
    for (name, path) in entries {
        table.add_row(Row::new(vec![Cell::new(name), Cell::new(path)]));
    }
    format!(
        "{table}{} entr{}\n",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    )
}

/// Renders the configuration sources in merge order.
#[must_use]
pub fn render_sources_table(config: &HierarchicalConfig) -> String {
    if config.sources.is_empty() {
        return "No configuration files found, using defaults.\n".to_string();
    }
    let mut table = titled_table(&["Source", "Path"]);
    for source in &config.sources {
        let label = match source.source_type {
            ConfigSourceType::Default => "default",
            ConfigSourceType::CliExplicit => "--config",
            ConfigSourceType::Custom => "custom",
        };
        table.add_row(Row::new(vec![
            Cell::new(label),
            Cell::new(&source.path.display().to_string()),
        ]));
    }
    table.to_string()
}

/// One-line summary of a gate decision.
#[must_use]
pub fn render_gate_summary(decision: &GateDecision) -> String {
    match decision {
        GateDecision::Disabled => "git hooks disabled".to_string(),
        GateDecision::NoMatchingHook => "no match any hooks".to_string(),
        GateDecision::MergeCommitSkipped => "merge commit, checks skipped".to_string(),
        GateDecision::Passed => "all checks passed".to_string(),
        GateDecision::Rejected { rejection, .. } => format!(
            "rejected by {}: {} file{}",
            rejection.check,
            rejection.files.len(),
            if rejection.files.len() == 1 { "" } else { "s" }
        ),
    }
}

/// Renders a gate decision: the summary line, plus a table of the refused
/// files for a rejection.
#[must_use]
pub fn render_gate_report(decision: &GateDecision) -> String {
    let summary = render_gate_summary(decision);
    let GateDecision::Rejected { rejection, .. } = decision else {
        return format!("{summary}\n");
    };

    let mut table = titled_table(&["Check", "File"]);
    for file in &rejection.files {
        table.add_row(Row::new(vec![
            Cell::new(rejection.check).with_style(Attr::ForegroundColor(prettytable::color::RED)),
            Cell::new(file),
        ]));
    }
    format!("{summary}\n{}\n{table}", truncate_message(&rejection.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Rejection;
    use crate::config_hierarchy::ConfigSource;
    use serde_json::json;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_truncate_message_short() {
        assert_eq!(truncate_message("Short message"), "Short message");
    }

    #[test]
    fn test_truncate_message_over_limit_counts_chars() {
        let message = "é".repeat(MAX_MESSAGE_WIDTH + 10);
        let truncated = truncate_message(&message);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_WIDTH);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_entry_table_lists_entries_in_name_order() {
        let mut entries = EntryMap::new();
        entries.insert("zeta".to_string(), "src/pages/zeta/zeta.js".to_string());
        entries.insert("alpha".to_string(), "src/pages/alpha/alpha.ts".to_string());

        let out = render_entry_table(&entries);
        let alpha = out.find("alpha").unwrap();
        let zeta = out.find("zeta").unwrap();
        assert!(alpha < zeta);
        assert!(out.ends_with("2 entries\n"));
    }

    #[test]
    fn test_entry_table_empty() {
        assert_eq!(render_entry_table(&EntryMap::new()), "No entries found.\n");
    }

    #[test]
    fn test_sources_table_labels() {
        let config = HierarchicalConfig::new(
            PathBuf::from("/repo"),
            vec![
                ConfigSource::new(ConfigSourceType::Default, PathBuf::from("/repo/scaffold.config.toml"), json!({})),
                ConfigSource::new(
                    ConfigSourceType::Custom,
                    PathBuf::from("/repo/scaffold.custom.config.toml"),
                    json!({}),
                ),
            ],
            json!({}),
        );
        let out = render_sources_table(&config);
        assert!(out.contains("default"));
        assert!(out.contains("custom"));
        assert!(out.contains("/repo/scaffold.custom.config.toml"));
    }

    #[test]
    fn test_gate_report_for_rejection() {
        let decision = GateDecision::Rejected {
            rejection: Rejection::new(
                "size_limit",
                "sizeLimitFileList",
                vec!["/repo/src/a.png".to_string()],
                "These files are too large: /repo/src/a.png",
            ),
            exit_delay: Duration::from_millis(200),
        };
        let out = render_gate_report(&decision);
        assert!(out.starts_with("rejected by size_limit: 1 file\n"));
        assert!(out.contains("/repo/src/a.png"));
    }

    #[test]
    fn test_gate_summary_without_rejection() {
        assert_eq!(render_gate_report(&GateDecision::Passed), "all checks passed\n");
        assert_eq!(render_gate_summary(&GateDecision::NoMatchingHook), "no match any hooks");
    }
}
