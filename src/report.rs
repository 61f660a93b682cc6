//! Report model: the display-ready structure renderers consume.
//!
//! Pure transformations of the run/diff data. No I/O and no number
//! formatting here; rounding percentages to display precision belongs to
//! the renderers so the model stays reusable.

use serde::Serialize;

use crate::diff::{FileStatus, LinePair, RunDiff};
use crate::model::{LineEntry, LineSummary, RunCoverage};

/// One summary-table row for single-run mode, carrying everything a
/// renderer needs for both the table and the file's detail page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRow {
    pub path: String,
    pub executable: u64,
    pub hit: u64,
    pub missed: u64,
    pub percentage: Option<f64>,
    pub lines: Vec<LineEntry>,
}

/// Single-run report: project totals plus per-file rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub totals: LineSummary,
    pub files: Vec<FileRow>,
}

/// One summary-table row for diff mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRow {
    pub path: String,
    pub status: FileStatus,
    pub a: Option<LineSummary>,
    pub b: Option<LineSummary>,
    pub a_percentage: Option<f64>,
    pub b_percentage: Option<f64>,
    pub delta_hit: Option<i64>,
    pub delta_executable: Option<i64>,
    pub delta_percentage: Option<f64>,
    pub newly_hit: u64,
    pub newly_missed: u64,
    pub lines: Vec<LinePair>,
}

/// Diff report: both runs' totals, project deltas, per-file rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub totals_a: LineSummary,
    pub totals_b: LineSummary,
    pub delta_hit: i64,
    pub delta_executable: i64,
    pub delta_percentage: Option<f64>,
    pub files: Vec<DiffRow>,
}

/// Build the single-run report model.
pub fn build(run: RunCoverage) -> Report {
    let totals = run.totals;
    let files = run
        .files
        .into_iter()
        .map(|file| FileRow {
            path: file.path,
            executable: file.summary.executable,
            hit: file.summary.hit,
            missed: file.summary.missed(),
            percentage: file.summary.percent(),
            lines: file.lines,
        })
        .collect();
    Report { totals, files }
}

/// Build the diff report model.
pub fn build_diff(diff: RunDiff) -> DiffReport {
    let files = diff
        .files
        .into_iter()
        .map(|file| DiffRow {
            path: file.path,
            status: file.status,
            a_percentage: file.a.and_then(|s| s.percent()),
            b_percentage: file.b.and_then(|s| s.percent()),
            a: file.a,
            b: file.b,
            delta_hit: file.delta_hit,
            delta_executable: file.delta_executable,
            delta_percentage: file.delta_percentage,
            newly_hit: file.newly_hit,
            newly_missed: file.newly_missed,
            lines: file.lines,
        })
        .collect();
    DiffReport {
        totals_a: diff.totals_a,
        totals_b: diff.totals_b,
        delta_hit: diff.delta_hit,
        delta_executable: diff.delta_executable,
        delta_percentage: diff.delta_percentage,
        files,
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort keys for single-run rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSortKey {
    Path,
    Percentage,
    Hit,
    Executable,
    Missed,
}

/// Sort keys for diff rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSortKey {
    Path,
    APercentage,
    BPercentage,
    DeltaPercentage,
    NewlyHit,
    NewlyMissed,
}

/// Sort single-run rows. Pure: no shared sort state; callers hold the
/// current key/direction themselves. Stable, with path as the secondary
/// key. A not-applicable percentage sorts below every applicable one.
#[must_use]
pub fn sort_files(mut rows: Vec<FileRow>, key: FileSortKey, direction: Direction) -> Vec<FileRow> {
    rows.sort_by(|a, b| {
        let ordering = match key {
            FileSortKey::Path => a.path.cmp(&b.path),
            FileSortKey::Percentage => cmp_opt_f64(a.percentage, b.percentage),
            FileSortKey::Hit => a.hit.cmp(&b.hit),
            FileSortKey::Executable => a.executable.cmp(&b.executable),
            FileSortKey::Missed => a.missed.cmp(&b.missed),
        };
        directed(ordering, direction).then_with(|| a.path.cmp(&b.path))
    });
    rows
}

/// Sort diff rows; same contract as [`sort_files`].
#[must_use]
pub fn sort_diffs(mut rows: Vec<DiffRow>, key: DiffSortKey, direction: Direction) -> Vec<DiffRow> {
    rows.sort_by(|a, b| {
        let ordering = match key {
            DiffSortKey::Path => a.path.cmp(&b.path),
            DiffSortKey::APercentage => cmp_opt_f64(a.a_percentage, b.a_percentage),
            DiffSortKey::BPercentage => cmp_opt_f64(a.b_percentage, b.b_percentage),
            DiffSortKey::DeltaPercentage => cmp_opt_f64(a.delta_percentage, b.delta_percentage),
            DiffSortKey::NewlyHit => a.newly_hit.cmp(&b.newly_hit),
            DiffSortKey::NewlyMissed => a.newly_missed.cmp(&b.newly_missed),
        };
        directed(ordering, direction).then_with(|| a.path.cmp(&b.path))
    });
    rows
}

fn directed(ordering: std::cmp::Ordering, direction: Direction) -> std::cmp::Ordering {
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}

fn cmp_opt_f64(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Display filtering
// ---------------------------------------------------------------------------

/// Detail-page display options. These hide lines at render time only; the
/// parsed data always contains every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    /// Show whitespace-only lines.
    pub display_blank: bool,
    /// Hide comment-only lines (heuristic).
    pub strip_comments: bool,
}

/// Whether a line should appear on a detail page. Executed lines are
/// always visible; only NotExecutable/NoData lines can be hidden.
pub fn line_visible(entry: &LineEntry, options: DisplayOptions) -> bool {
    if entry.status.is_executable() {
        return true;
    }
    if !options.display_blank && is_blank(&entry.text) {
        return false;
    }
    if options.strip_comments && is_comment(&entry.text) {
        return false;
    }
    true
}

/// Whether a diff pair should appear on a detail page. A pair is hidden
/// only when neither side carries execution status.
pub fn pair_visible(pair: &LinePair, options: DisplayOptions) -> bool {
    let executable = |entry: &Option<LineEntry>| {
        entry
            .as_ref()
            .is_some_and(|e| e.status.is_executable())
    };
    if executable(&pair.a) || executable(&pair.b) {
        return true;
    }
    let text = pair_text(pair);
    if !options.display_blank && is_blank(text) {
        return false;
    }
    if options.strip_comments && is_comment(text) {
        return false;
    }
    true
}

/// The text a renderer should show for a pair: run B's, falling back to
/// run A's when B's side is absent or blank.
pub fn pair_text(pair: &LinePair) -> &str {
    let a = pair.a.as_ref().map(|e| e.text.as_str()).unwrap_or("");
    let b = pair.b.as_ref().map(|e| e.text.as_str()).unwrap_or("");
    if !b.trim().is_empty() {
        b
    } else if !a.trim().is_empty() {
        a
    } else if pair.b.is_some() {
        b
    } else {
        a
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Comment-only heuristic covering the usual instrumented languages
/// (Fortran, C/C++, scripts).
fn is_comment(text: &str) -> bool {
    let s = text.trim_start();
    if s.is_empty() {
        return false;
    }
    s.starts_with('!')
        || s.starts_with("//")
        || s.starts_with('#')
        || s.starts_with("/*")
        || s.starts_with("*/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileCoverage, LineStatus};

    fn entry(status: LineStatus, text: &str) -> LineEntry {
        LineEntry {
            line_number: 1,
            status,
            text: text.to_string(),
        }
    }

    fn row(path: &str, executable: u64, hit: u64) -> FileRow {
        FileRow {
            path: path.to_string(),
            executable,
            hit,
            missed: executable - hit,
            percentage: LineSummary { executable, hit }.percent(),
            lines: vec![],
        }
    }

    #[test]
    fn test_build_single() {
        let run = RunCoverage::new(vec![FileCoverage::new(
            "f.c".to_string(),
            vec![
                entry(LineStatus::Executed(1), "a"),
                entry(LineStatus::Executed(0), "b"),
            ],
        )]);
        let report = build(run);
        assert_eq!(report.totals.executable, 2);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].missed, 1);
        assert_eq!(report.files[0].percentage, Some(50.0));
        // Full line sequence survives for detail rendering.
        assert_eq!(report.files[0].lines.len(), 2);
    }

    #[test]
    fn test_sort_by_path_default() {
        let rows = vec![row("b.c", 1, 1), row("a.c", 1, 0)];
        let sorted = sort_files(rows, FileSortKey::Path, Direction::Ascending);
        assert_eq!(sorted[0].path, "a.c");
    }

    #[test]
    fn test_sort_by_percentage_with_stable_tiebreak() {
        let rows = vec![row("c.c", 2, 1), row("b.c", 2, 2), row("a.c", 2, 1)];
        let sorted = sort_files(rows, FileSortKey::Percentage, Direction::Ascending);
        // 50% ties sort by path.
        assert_eq!(sorted[0].path, "a.c");
        assert_eq!(sorted[1].path, "c.c");
        assert_eq!(sorted[2].path, "b.c");
    }

    #[test]
    fn test_sort_descending_inverts() {
        let rows = vec![row("a.c", 4, 1), row("b.c", 4, 3)];
        let sorted = sort_files(rows, FileSortKey::Percentage, Direction::Descending);
        assert_eq!(sorted[0].path, "b.c");
    }

    #[test]
    fn test_not_applicable_sorts_below_zero_percent() {
        let rows = vec![row("na.c", 0, 0), row("zero.c", 3, 0)];
        let sorted = sort_files(rows, FileSortKey::Percentage, Direction::Ascending);
        assert_eq!(sorted[0].path, "na.c");
        assert_eq!(sorted[0].percentage, None);
        assert_eq!(sorted[1].percentage, Some(0.0));
    }

    #[test]
    fn test_executed_lines_are_always_visible() {
        let options = DisplayOptions {
            display_blank: false,
            strip_comments: true,
        };
        // Even an executed line whose text looks like a comment or blank.
        assert!(line_visible(&entry(LineStatus::Executed(0), "   "), options));
        assert!(line_visible(
            &entry(LineStatus::Executed(3), "// odd but executed"),
            options
        ));
    }

    #[test]
    fn test_blank_hidden_by_default() {
        let options = DisplayOptions::default();
        assert!(!line_visible(
            &entry(LineStatus::NotExecutable, "   "),
            options
        ));
        let shown = DisplayOptions {
            display_blank: true,
            ..options
        };
        assert!(line_visible(&entry(LineStatus::NotExecutable, "   "), shown));
    }

    #[test]
    fn test_strip_comments() {
        let options = DisplayOptions {
            display_blank: true,
            strip_comments: true,
        };
        assert!(!line_visible(
            &entry(LineStatus::NotExecutable, "  // note"),
            options
        ));
        assert!(!line_visible(
            &entry(LineStatus::NoData, "! fortran comment"),
            options
        ));
        assert!(line_visible(
            &entry(LineStatus::NotExecutable, "int x;"),
            options
        ));
    }

    #[test]
    fn test_comments_kept_without_strip() {
        let options = DisplayOptions {
            display_blank: true,
            strip_comments: false,
        };
        assert!(line_visible(
            &entry(LineStatus::NotExecutable, "// kept"),
            options
        ));
    }

    #[test]
    fn test_pair_visible_requires_both_sides_inert() {
        let options = DisplayOptions::default();
        let pair = LinePair {
            line_number: 1,
            a: Some(entry(LineStatus::Executed(1), "")),
            b: Some(entry(LineStatus::NotExecutable, "")),
            text_changed: false,
            delta: None,
        };
        // A side is executable → visible despite blank text.
        assert!(pair_visible(&pair, options));

        let inert = LinePair {
            line_number: 1,
            a: Some(entry(LineStatus::NotExecutable, "  ")),
            b: None,
            text_changed: false,
            delta: None,
        };
        assert!(!pair_visible(&inert, options));
    }

    #[test]
    fn test_pair_text_prefers_b() {
        let pair = LinePair {
            line_number: 1,
            a: Some(entry(LineStatus::Executed(1), "old")),
            b: Some(entry(LineStatus::Executed(1), "new")),
            text_changed: true,
            delta: None,
        };
        assert_eq!(pair_text(&pair), "new");

        let b_blank = LinePair {
            line_number: 1,
            a: Some(entry(LineStatus::Executed(1), "old")),
            b: Some(entry(LineStatus::Executed(1), "   ")),
            text_changed: true,
            delta: None,
        };
        assert_eq!(pair_text(&b_blank), "old");
    }
}
