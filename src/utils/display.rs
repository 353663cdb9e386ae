//! Terminal display helpers for CLI output.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use std::io::{self, IsTerminal};
use unicode_width::UnicodeWidthChar;

use crate::models::{CatalogItem, SearchPage};

/// Widest title shown in a table cell
pub const TITLE_WIDTH: usize = 60;

/// Widest author list shown in a table cell
pub const AUTHORS_WIDTH: usize = 40;

/// Check if stdout is a terminal.
#[inline]
pub fn is_terminal() -> bool {
    io::stdout().is_terminal()
}

/// Truncate text to fit within `max_width` display columns.
///
/// Wide characters count as two columns. An ellipsis is appended when the text
/// was cut.
///
/// ```
/// use reading_shelf::utils::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("Hello World", 8), "Hello...");
/// assert_eq!(truncate_with_ellipsis("Hi", 8), "Hi");
/// ```
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let widths: Vec<(char, usize)> = text.chars().map(|c| (c, c.width().unwrap_or(1))).collect();
    let total: usize = widths.iter().map(|(_, w)| *w).sum();
    if total <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut used = 0;
    let mut out = String::new();
    for (c, w) in widths {
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }

    if out.is_empty() {
        return "...".to_string();
    }
    format!("{}...", out)
}

/// Render items as a table with a leading position column
pub fn items_table(items: &[CatalogItem], first_position: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Title", "Authors", "Year", "Id"]);

    for (offset, item) in items.iter().enumerate() {
        table.add_row(vec![
            (first_position + offset).to_string(),
            truncate_with_ellipsis(&item.title, TITLE_WIDTH),
            truncate_with_ellipsis(&item.author_line(), AUTHORS_WIDTH),
            item.published_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string()),
            item.id.clone(),
        ]);
    }

    table
}

/// One-line position summary, e.g. `Page 2 of 5 (47 results)`
///
/// The catalog may report a total that no longer reaches the shown page; the
/// page count then never reads below the page index.
pub fn page_summary(page: &SearchPage) -> String {
    if page.total_results == 0 {
        return "No results".to_string();
    }
    format!(
        "Page {} of {} ({} results)",
        page.page_index,
        page.page_count().max(page.page_index),
        page.total_results
    )
}
