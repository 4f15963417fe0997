//! Directory listing parser
//!
//! Static listings render one table row per entry:
//! `<tr><td><a href='name'>name</a></td><td>20.18 KB</td><td>last modified</td></tr>`.
//! This module turns those rows into [`FileRecord`]s and parses the
//! human-readable size column back into bytes.

use crate::state::FileRecord;
use scraper::{ElementRef, Html, Selector};

const KIB: u64 = 1024;

/// Parses listing HTML into file records, in listing order
///
/// # Row Rules
///
/// A row qualifies when its first cell holds a link followed by a size cell
/// and a last-modified cell. It is excluded when:
///
/// - the link is the parent directory (`../`) or any other sub-directory
///   (ends with `/`)
/// - the link starts with `?` (column sort links)
/// - the link or the displayed name is empty or `#`
///
/// Rows are normally inside a `<table>`; text with no table at all is read
/// as a run of bare rows.
///
/// Text that contains no qualifying rows yields an empty list; this
/// function never fails.
///
/// # Example
///
/// ```
/// use volume_census::crawler::parse_listing;
///
/// let html = "<table><tr><td><a href='0001-01.json'>0001-01.json</a></td>\
///             <td>1.00 KB</td><td>2024-03-01 12:00</td></tr></table>";
/// let records = parse_listing(html);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].size_bytes, 1024);
/// ```
pub fn parse_listing(html: &str) -> Vec<FileRecord> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let (Ok(table_selector), Ok(row_selector), Ok(cell_selector), Ok(link_selector)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("td"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    // The HTML tree builder drops rows outside a table, so bare rows get one
    let mut document = Html::parse_document(html);
    if document.select(&table_selector).next().is_none() {
        document = Html::parse_fragment(&format!("<table>{}</table>", html));
    }

    document
        .select(&row_selector)
        .filter_map(|row| parse_row(row, &cell_selector, &link_selector))
        .collect()
}

/// Extracts a file record from one table row, if the row describes a file
fn parse_row(
    row: ElementRef<'_>,
    cell_selector: &Selector,
    link_selector: &Selector,
) -> Option<FileRecord> {
    let cells: Vec<ElementRef<'_>> = row.select(cell_selector).collect();
    if cells.len() < 3 {
        return None;
    }

    let link = cells[0].select(link_selector).next()?;
    let href = link.value().attr("href")?.trim();
    let filename = element_text(link);

    if !is_file_entry(href, &filename) {
        return None;
    }

    let size_display = element_text(cells[1]);
    let last_modified = element_text(cells[2]);

    Some(FileRecord {
        filename,
        size_bytes: parse_size(&size_display),
        size_display,
        last_modified,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Returns true if a row's link and name describe a file (not a directory or control link)
fn is_file_entry(href: &str, name: &str) -> bool {
    if href.is_empty() || href == "#" || name.is_empty() || name == "#" {
        return false;
    }

    if href == ".." || href.ends_with('/') {
        return false;
    }

    !href.starts_with('?')
}

/// Converts a displayed size such as `"20.18 KB"` into bytes
///
/// The value must be a number and a unit separated by whitespace. Units are
/// 1024-based (`B`, `KB`, `MB`, `GB`, `TB`, case-insensitive); an unrecognized
/// unit is read as bytes. Placeholders (`-`), empty strings, a missing unit,
/// non-numeric or negative values all parse to 0. Fractional bytes are
/// truncated.
pub fn parse_size(display: &str) -> u64 {
    let normalized = display.trim().to_ascii_uppercase();
    let mut parts = normalized.split_whitespace();

    let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return 0;
    };

    let Ok(value) = value.parse::<f64>() else {
        return 0;
    };

    if !value.is_finite() || value < 0.0 {
        return 0;
    }

    (value * unit_multiplier(unit) as f64) as u64
}

fn unit_multiplier(unit: &str) -> u64 {
    match unit {
        "KB" => KIB,
        "MB" => KIB.pow(2),
        "GB" => KIB.pow(3),
        "TB" => KIB.pow(4),
        _ => 1,
    }
}
