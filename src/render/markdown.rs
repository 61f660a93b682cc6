//! Markdown output: a summary table for single-run mode, a changed-files
//! table (plus optional line-level change lists) for diff mode.

use std::fmt::Write;

use crate::diff::{FileStatus, LineDelta};
use crate::report::{
    sort_diffs, sort_files, DiffReport, DiffRow, DiffSortKey, Direction, FileSortKey, Report,
};

use super::{format_delta_pct, format_pct};

/// Render a single-run report. Rows are sorted worst-first by percentage
/// so the files needing attention lead the table.
pub fn single(report: &Report) -> String {
    let mut md = String::new();
    writeln!(md, "# Coverage Report\n").unwrap();
    writeln!(
        md,
        "**Coverage:** {} ({}/{})\n",
        format_pct(report.totals.percent()),
        report.totals.hit,
        report.totals.executable
    )
    .unwrap();

    writeln!(md, "## File Summary\n").unwrap();
    writeln!(md, "| File | % Covered | Covered | Total | Uncovered |").unwrap();
    writeln!(md, "|---|---:|---:|---:|---:|").unwrap();

    let rows = sort_files(
        report.files.clone(),
        FileSortKey::Percentage,
        Direction::Ascending,
    );
    for row in &rows {
        writeln!(
            md,
            "| `{}` | {} | {} | {} | {} |",
            row.path,
            format_pct(row.percentage),
            row.hit,
            row.executable,
            row.missed
        )
        .unwrap();
    }

    md
}

/// Render a diff report. Only changed files (including added/removed
/// ones) appear in the table; `show_lines` appends per-file lists of the
/// line numbers whose coverage flipped.
pub fn diff(report: &DiffReport, show_lines: bool) -> String {
    let mut md = String::new();
    writeln!(md, "# Coverage Diff Report\n").unwrap();
    writeln!(
        md,
        "**Run A:** {} ({}/{})  ",
        format_pct(report.totals_a.percent()),
        report.totals_a.hit,
        report.totals_a.executable
    )
    .unwrap();
    writeln!(
        md,
        "**Run B:** {} ({}/{})  ",
        format_pct(report.totals_b.percent()),
        report.totals_b.hit,
        report.totals_b.executable
    )
    .unwrap();
    writeln!(md, "**Delta:** {}\n", format_delta_pct(report.delta_percentage)).unwrap();

    writeln!(md, "## File Summary (changed only)\n").unwrap();
    writeln!(md, "| File | A % | B % | Δ % | +covered | +uncovered |").unwrap();
    writeln!(md, "|---|---:|---:|---:|---:|---:|").unwrap();

    let changed = changed_rows(report);
    for row in &changed {
        writeln!(
            md,
            "| `{}` | {} | {} | {} | {} | {} |",
            row.path,
            format_pct(row.a_percentage),
            format_pct(row.b_percentage),
            format_delta_pct(row.delta_percentage),
            row.newly_hit,
            row.newly_missed
        )
        .unwrap();
    }

    if show_lines && !changed.is_empty() {
        writeln!(md, "\n## Line-level Changes").unwrap();
        for row in &changed {
            let newly_hit = lines_with_delta(row, LineDelta::NewlyHit);
            let newly_missed = lines_with_delta(row, LineDelta::NewlyMissed);
            if newly_hit.is_empty() && newly_missed.is_empty() {
                continue;
            }
            writeln!(md, "\n### `{}`\n", row.path).unwrap();
            if !newly_hit.is_empty() {
                writeln!(md, "**Became covered:** {}", join(&newly_hit)).unwrap();
            }
            if !newly_missed.is_empty() {
                writeln!(md, "**Became uncovered:** {}", join(&newly_missed)).unwrap();
            }
        }
    }

    md
}

/// Changed rows (anything but Unchanged), alphabetical.
fn changed_rows(report: &DiffReport) -> Vec<DiffRow> {
    let rows: Vec<DiffRow> = report
        .files
        .iter()
        .filter(|row| row.status != FileStatus::Unchanged)
        .cloned()
        .collect();
    sort_diffs(rows, DiffSortKey::Path, Direction::Ascending)
}

fn lines_with_delta(row: &DiffRow, delta: LineDelta) -> Vec<u32> {
    row.lines
        .iter()
        .filter(|pair| pair.delta == Some(delta))
        .map(|pair| pair.line_number)
        .collect()
}

fn join(lines: &[u32]) -> String {
    lines
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
