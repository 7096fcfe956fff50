//! Markdown rendering of detected tables.
//!
//! All table-to-markdown rendering lives in the refiner; readers emit raw
//! cell matrices plus a plain-text fallback only.

use fileflux_core::Table;

/// Render a table as a markdown pipe table. The first row is the header
/// row, followed by a `| --- |` separator.
pub fn render_markdown_table(table: &Table) -> String {
    if table.cells.is_empty() {
        return String::new();
    }
    let cols = table.column_count();
    let mut out = String::new();
    for (idx, row) in table.cells.iter().enumerate() {
        out.push('|');
        for col in 0..cols {
            let cell = row.get(col).map(String::as_str).unwrap_or("");
            out.push(' ');
            out.push_str(cell);
            out.push_str(" |");
        }
        out.push('\n');
        if idx == 0 {
            out.push('|');
            for _ in 0..cols {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// Replace each high-confidence table's plain-text fallback in `text` with
/// its markdown rendering. Low-confidence tables keep the fallback.
/// Returns the rewritten text and the number of tables reinjected.
pub fn reinject_tables(text: &str, tables: &[Table]) -> (String, usize) {
    let mut out = text.to_string();
    let mut reinjected = 0usize;
    for table in tables {
        if table.needs_llm_assist || table.cells.is_empty() {
            continue;
        }
        let markdown = render_markdown_table(table);
        let fallback = table.fallback_text.trim();
        if fallback.is_empty() {
            continue;
        }
        if out.contains(fallback) {
            out = out.replacen(fallback, &markdown, 1);
            reinjected += 1;
        } else {
            // Paragraph reflow may have joined the fallback rows.
            let joined = fallback.replace('\n', " ");
            if out.contains(&joined) {
                out = out.replacen(&joined, &markdown, 1);
                reinjected += 1;
            }
        }
    }
    (out, reinjected)
}
