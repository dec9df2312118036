//! Utility functions for console output

use crate::types::ArchiveSet;

/// Format a byte size into a human-readable string.
///
/// Selects bytes, KB, MB or GB based on magnitude (binary multiples).
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Render the discovered parts as a table, one line per part plus a total
pub fn format_parts_table(set: &ArchiveSet) -> String {
    let width = set
        .parts
        .iter()
        .map(|p| p.file_name().chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!("{:>5}  {:<width$}  {:>12}\n", "Part", "Name", "Size");
    out.push_str(&"-".repeat(width + 21));
    out.push('\n');
    for part in &set.parts {
        out.push_str(&format!(
            "{:>5}  {:<width$}  {:>12}\n",
            part.number,
            part.file_name(),
            format_size(part.size_bytes)
        ));
    }
    out.push_str(&"-".repeat(width + 21));
    out.push('\n');
    out.push_str(&format!(
        "{:>5}  {:<width$}  {:>12}",
        set.len(),
        "parts",
        format_size(set.total_size())
    ));
    out
}
