//! Table detection from word alignment.
//!
//! Two independent column detectors run over the page rows; the one with
//! the higher alignment score wins. Consecutive rows aligning with the
//! detected columns form table regions, which are cut into cell matrices
//! and scored for confidence.

use super::layout::{PdfWord, Row};

/// Minimum consecutive aligning rows for a table region.
const MIN_REGION_ROWS: usize = 2;

/// Confidence below this marks the table `needs_llm_assist`.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// A detected table region before conversion into the core model.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCandidate {
    /// Cell matrix; rows padded to the column count.
    pub cells: Vec<Vec<String>>,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Half-open range of page-row indices the region covers.
    pub row_range: (usize, usize),
    /// Plain-text fallback rendering of the region.
    pub fallback_text: String,
}

/// Detect tables in the rows of one page.
pub fn detect_tables(rows: &[Row]) -> Vec<TableCandidate> {
    let Some(columns) = detect_columns(rows) else {
        return Vec::new();
    };
    let tolerance = cell_tolerance(&columns);
    let regions = find_regions(rows, &columns, tolerance);

    regions
        .into_iter()
        .map(|(start, end)| build_candidate(&rows[start..end], &columns, tolerance, (start, end)))
        .collect()
}

/// Pick the better of the two column detectors by alignment score.
pub fn detect_columns(rows: &[Row]) -> Option<Vec<f32>> {
    let gap = detect_columns_gap(rows);
    let position = detect_columns_position(rows);
    match (gap, position) {
        (Some(g), Some(p)) => {
            if alignment_score(rows, &g) >= alignment_score(rows, &p) {
                Some(g)
            } else {
                Some(p)
            }
        }
        (g, p) => g.or(p),
    }
}

/// Gap-based column detection: large inter-word gaps are separator
/// candidates, clustered across rows.
fn detect_columns_gap(rows: &[Row]) -> Option<Vec<f32>> {
    let mut candidates: Vec<(usize, f32)> = Vec::new();
    let mut gap_widths: Vec<f32> = Vec::new();

    for (row_idx, row) in rows.iter().enumerate() {
        let Some(first) = row.first() else { continue };
        candidates.push((row_idx, first.bbox.x));

        let gaps: Vec<f32> = row
            .windows(2)
            .map(|pair| pair[1].bbox.x - pair[0].right())
            .filter(|g| *g > 0.0)
            .collect();
        if gaps.is_empty() {
            continue;
        }
        let mean = gaps.iter().sum::<f32>() / gaps.len() as f32;
        for pair in row.windows(2) {
            let gap = pair[1].bbox.x - pair[0].right();
            if gap > 0.0 && gap >= 2.0 * mean {
                candidates.push((row_idx, pair[1].bbox.x));
                gap_widths.push(gap);
            }
        }
    }

    if gap_widths.is_empty() {
        return None;
    }
    let mean_gap = gap_widths.iter().sum::<f32>() / gap_widths.len() as f32;
    let bucket = (0.5 * mean_gap).max(10.0);
    let min_support = (rows.len() / 2).max(2);
    cluster_candidates(&candidates, bucket, min_support)
}

/// Position-based column detection: bucket word left edges and keep the
/// well-supported buckets.
fn detect_columns_position(rows: &[Row]) -> Option<Vec<f32>> {
    let words: Vec<&PdfWord> = rows.iter().flatten().collect();
    if words.is_empty() {
        return None;
    }
    let mean_char_width = {
        let mut total = 0.0f32;
        let mut chars = 0usize;
        for w in &words {
            total += w.bbox.width;
            chars += w.text.chars().count().max(1);
        }
        total / chars as f32
    };
    let bucket = (1.5 * mean_char_width).max(3.0);
    let min_support = ((0.4 * rows.len() as f32) as usize).max(2);

    let candidates: Vec<(usize, f32)> = rows
        .iter()
        .enumerate()
        .flat_map(|(row_idx, row)| row.iter().map(move |w| (row_idx, w.bbox.x)))
        .collect();
    let mut columns = cluster_candidates(&candidates, bucket, min_support)?;

    // Merge columns closer than twice the bucket size.
    let merge_distance = 2.0 * bucket;
    let mut merged: Vec<f32> = Vec::with_capacity(columns.len());
    for col in columns.drain(..) {
        match merged.last_mut() {
            Some(last) if col - *last < merge_distance => *last = (*last + col) / 2.0,
            _ => merged.push(col),
        }
    }
    merged.truncate(10);
    if merged.len() >= 2 {
        Some(merged)
    } else {
        None
    }
}

/// Cluster candidate x positions into buckets of the given size, keeping
/// clusters supported by at least `min_support` distinct rows. Returns the
/// sorted cluster centers, or `None` when fewer than two survive.
fn cluster_candidates(
    candidates: &[(usize, f32)],
    bucket: f32,
    min_support: usize,
) -> Option<Vec<f32>> {
    let mut sorted: Vec<(usize, f32)> = candidates.to_vec();
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut columns: Vec<f32> = Vec::new();
    let mut cluster_xs: Vec<f32> = Vec::new();
    let mut cluster_rows: Vec<usize> = Vec::new();
    let mut cluster_start = f32::NEG_INFINITY;

    let mut flush =
        |xs: &mut Vec<f32>, rows_seen: &mut Vec<usize>, columns: &mut Vec<f32>| {
            if !xs.is_empty() {
                rows_seen.sort_unstable();
                rows_seen.dedup();
                if rows_seen.len() >= min_support {
                    columns.push(xs.iter().sum::<f32>() / xs.len() as f32);
                }
                xs.clear();
                rows_seen.clear();
            }
        };

    for (row_idx, x) in sorted {
        if cluster_xs.is_empty() || x - cluster_start <= bucket {
            if cluster_xs.is_empty() {
                cluster_start = x;
            }
            cluster_xs.push(x);
            cluster_rows.push(row_idx);
        } else {
            flush(&mut cluster_xs, &mut cluster_rows, &mut columns);
            cluster_start = x;
            cluster_xs.push(x);
            cluster_rows.push(row_idx);
        }
    }
    flush(&mut cluster_xs, &mut cluster_rows, &mut columns);

    if columns.len() >= 2 {
        Some(columns)
    } else {
        None
    }
}

/// Mean distance between consecutive column positions.
fn mean_column_width(columns: &[f32]) -> f32 {
    if columns.len() < 2 {
        return 0.0;
    }
    columns
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .sum::<f32>()
        / (columns.len() - 1) as f32
}

/// Fraction of words whose left edge lies near a column position.
pub fn alignment_score(rows: &[Row], columns: &[f32]) -> f32 {
    let tolerance = (0.2 * mean_column_width(columns)).max(10.0);
    let words: Vec<&PdfWord> = rows.iter().flatten().collect();
    if words.is_empty() {
        return 0.0;
    }
    let aligned = words
        .iter()
        .filter(|w| {
            columns
                .iter()
                .any(|col| (w.bbox.x - col).abs() <= tolerance)
        })
        .count();
    aligned as f32 / words.len() as f32
}

/// Cell-assignment tolerance for the detected columns.
fn cell_tolerance(columns: &[f32]) -> f32 {
    (0.15 * mean_column_width(columns)).max(5.0)
}

/// Whether a row aligns with the columns: at least half of its words fall
/// within twice the tolerance of some column.
fn row_aligns(row: &Row, columns: &[f32], tolerance: f32) -> bool {
    if row.is_empty() {
        return false;
    }
    let near = row
        .iter()
        .filter(|w| {
            columns
                .iter()
                .any(|col| (w.bbox.x - col).abs() <= 2.0 * tolerance)
        })
        .count();
    near * 2 >= row.len()
}

/// Find maximal runs of consecutive aligning rows of at least
/// [`MIN_REGION_ROWS`].
fn find_regions(rows: &[Row], columns: &[f32], tolerance: f32) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, row) in rows.iter().enumerate() {
        if row_aligns(row, columns, tolerance) {
            start.get_or_insert(idx);
        } else if let Some(s) = start.take() {
            if idx - s >= MIN_REGION_ROWS {
                regions.push((s, idx));
            }
        }
    }
    if let Some(s) = start {
        if rows.len() - s >= MIN_REGION_ROWS {
            regions.push((s, rows.len()));
        }
    }
    regions
}

/// Assign each word of a region row to a cell. A word lands in cell `i`
/// when its left edge falls in `[columns[i] - tol, columns[i+1] - tol)`;
/// every word is assigned at most once.
fn assign_cells(row: &Row, columns: &[f32], tolerance: f32) -> Vec<String> {
    let mut cells = vec![String::new(); columns.len()];
    for word in row {
        let x = word.bbox.x;
        let mut cell_idx = columns.len() - 1;
        for i in 0..columns.len() {
            let lower = columns[i] - tolerance;
            let upper = columns
                .get(i + 1)
                .map(|c| c - tolerance)
                .unwrap_or(f32::INFINITY);
            if x >= lower && x < upper {
                cell_idx = i;
                break;
            }
            if x < lower {
                cell_idx = i;
                break;
            }
        }
        let cell = &mut cells[cell_idx];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(&word.text);
    }
    cells
}

fn build_candidate(
    region: &[Row],
    columns: &[f32],
    tolerance: f32,
    row_range: (usize, usize),
) -> TableCandidate {
    let cells: Vec<Vec<String>> = region
        .iter()
        .map(|row| assign_cells(row, columns, tolerance))
        .collect();
    let confidence = score_confidence(&cells);
    let fallback_text = region
        .iter()
        .map(|row| {
            row.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");
    TableCandidate {
        cells,
        confidence,
        row_range,
        fallback_text,
    }
}

/// Confidence of a cell matrix: weighted column consistency, non-empty
/// ratio and column-count reasonableness.
pub fn score_confidence(cells: &[Vec<String>]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }
    let cols = cells.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return 0.0;
    }

    let full_rows = cells
        .iter()
        .filter(|row| row.iter().filter(|c| !c.is_empty()).count() == cols)
        .count();
    let column_consistency = full_rows as f32 / cells.len() as f32;

    let total_cells = cells.len() * cols;
    let empty_cells: usize = cells
        .iter()
        .map(|row| row.iter().filter(|c| c.is_empty()).count() + (cols - row.len()))
        .sum();
    let empty_ratio = empty_cells as f32 / total_cells as f32;

    let column_count_score = match cols {
        3..=6 => 1.0,
        0..=2 => 0.7,
        7..=10 => 0.8,
        11..=15 => 0.5,
        _ => 0.2,
    };

    0.4 * column_consistency + 0.3 * (1.0 - empty_ratio) + 0.3 * column_count_score
}
