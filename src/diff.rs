//! Diff engine: align two runs of the same codebase and classify every
//! line and file by how its coverage changed.
//!
//! Lines are paired strictly by line number. When the two runs disagree on
//! a file's length, the tail pairs against an absent side; no content-based
//! re-alignment is attempted. A file present in only one run and a
//! line-count mismatch are expected outcomes, not errors.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{FileCoverage, LineEntry, LineStatus, LineSummary, RunCoverage};

/// Presence/identity of a file across the two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    /// Only in run B.
    Added,
    /// Only in run A.
    Removed,
    Unchanged,
    Modified,
}

/// How one line's coverage changed between the runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineDelta {
    /// Missed in A, hit in B.
    NewlyHit,
    /// Hit in A, missed in B.
    NewlyMissed,
    StillHit,
    StillMissed,
    /// Flipped between not-executable and executable.
    StatusChanged,
    /// No usable execution status on some side (no-data, or
    /// non-executable in both runs).
    Unavailable,
}

/// One line number, paired across the runs. An absent side marks a line
/// beyond that run's length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePair {
    pub line_number: u32,
    pub a: Option<LineEntry>,
    pub b: Option<LineEntry>,
    /// Both sides present but their source text differs. Informational:
    /// the pair is still diffed by status.
    pub text_changed: bool,
    /// `None` unless the line is present in both runs.
    pub delta: Option<LineDelta>,
}

/// One file's comparison across the two runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub status: FileStatus,
    pub a: Option<LineSummary>,
    pub b: Option<LineSummary>,
    pub lines: Vec<LinePair>,
    /// B − A; `None` when the file exists in only one run.
    pub delta_hit: Option<i64>,
    pub delta_executable: Option<i64>,
    pub delta_percentage: Option<f64>,
    /// Count of [`LineDelta::NewlyHit`] pairs.
    pub newly_hit: u64,
    /// Count of [`LineDelta::NewlyMissed`] pairs.
    pub newly_missed: u64,
}

/// The full comparison: one [`FileDiff`] per path in either run, in
/// insertion order (A's discovery order, then files only in B), plus run
/// totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunDiff {
    pub files: Vec<FileDiff>,
    pub totals_a: LineSummary,
    pub totals_b: LineSummary,
    /// Sum of per-file deltas over files present in both runs.
    pub delta_hit: i64,
    pub delta_executable: i64,
    /// `totals_b.percent() − totals_a.percent()`, when both apply.
    pub delta_percentage: Option<f64>,
}

/// Compare run B (after) against run A (before).
pub fn diff_runs(a: &RunCoverage, b: &RunCoverage) -> RunDiff {
    let b_index: HashMap<&str, usize> = b
        .files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.path.as_str(), i))
        .collect();
    let a_index: HashMap<&str, usize> = a
        .files
        .iter()
        .enumerate()
        .map(|(i, f)| (f.path.as_str(), i))
        .collect();

    let mut files = Vec::new();
    let mut delta_hit = 0i64;
    let mut delta_executable = 0i64;

    for file_a in &a.files {
        let file_b = b_index.get(file_a.path.as_str()).map(|&i| &b.files[i]);
        let diff = diff_file(&file_a.path, Some(file_a), file_b);
        delta_hit += diff.delta_hit.unwrap_or(0);
        delta_executable += diff.delta_executable.unwrap_or(0);
        files.push(diff);
    }
    for file_b in &b.files {
        if !a_index.contains_key(file_b.path.as_str()) {
            files.push(diff_file(&file_b.path, None, Some(file_b)));
        }
    }

    let delta_percentage = match (a.totals.percent(), b.totals.percent()) {
        (Some(pa), Some(pb)) => Some(pb - pa),
        _ => None,
    };

    RunDiff {
        files,
        totals_a: a.totals,
        totals_b: b.totals,
        delta_hit,
        delta_executable,
        delta_percentage,
    }
}

fn diff_file(path: &str, a: Option<&FileCoverage>, b: Option<&FileCoverage>) -> FileDiff {
    let lines = pair_lines(
        a.map(|f| f.lines.as_slice()).unwrap_or(&[]),
        b.map(|f| f.lines.as_slice()).unwrap_or(&[]),
    );

    let summary_a = a.map(|f| f.summary);
    let summary_b = b.map(|f| f.summary);

    let status = match (summary_a, summary_b) {
        (Some(_), None) => FileStatus::Removed,
        (None, Some(_)) => FileStatus::Added,
        _ => {
            let changed = lines
                .iter()
                .any(|pair| pair.text_changed || pair.a != pair.b);
            if changed {
                FileStatus::Modified
            } else {
                FileStatus::Unchanged
            }
        }
    };

    let (delta_hit, delta_executable, delta_percentage) = match (summary_a, summary_b) {
        (Some(sa), Some(sb)) => {
            let pct = match (sa.percent(), sb.percent()) {
                (Some(pa), Some(pb)) => Some(pb - pa),
                _ => None,
            };
            (
                Some(sb.hit as i64 - sa.hit as i64),
                Some(sb.executable as i64 - sa.executable as i64),
                pct,
            )
        }
        _ => (None, None, None),
    };

    let newly_hit = lines
        .iter()
        .filter(|p| p.delta == Some(LineDelta::NewlyHit))
        .count() as u64;
    let newly_missed = lines
        .iter()
        .filter(|p| p.delta == Some(LineDelta::NewlyMissed))
        .count() as u64;

    FileDiff {
        path: path.to_string(),
        status,
        a: summary_a,
        b: summary_b,
        lines,
        delta_hit,
        delta_executable,
        delta_percentage,
        newly_hit,
        newly_missed,
    }
}

fn pair_lines(a: &[LineEntry], b: &[LineEntry]) -> Vec<LinePair> {
    let len = a.len().max(b.len());
    let mut pairs = Vec::with_capacity(len);
    for i in 0..len {
        let la = a.get(i).cloned();
        let lb = b.get(i).cloned();
        let (text_changed, delta) = match (&la, &lb) {
            (Some(ea), Some(eb)) => (ea.text != eb.text, Some(classify(&ea.status, &eb.status))),
            _ => (false, None),
        };
        pairs.push(LinePair {
            line_number: i as u32 + 1,
            a: la,
            b: lb,
            text_changed,
            delta,
        });
    }
    pairs
}

/// Classify a line present in both runs.
fn classify(a: &LineStatus, b: &LineStatus) -> LineDelta {
    use LineStatus::*;
    match (a, b) {
        (NoData, _) | (_, NoData) => LineDelta::Unavailable,
        (NotExecutable, NotExecutable) => LineDelta::Unavailable,
        (NotExecutable, Executed(_)) | (Executed(_), NotExecutable) => LineDelta::StatusChanged,
        (Executed(x), Executed(y)) => match (*x > 0, *y > 0) {
            (true, true) => LineDelta::StillHit,
            (false, false) => LineDelta::StillMissed,
            (false, true) => LineDelta::NewlyHit,
            (true, false) => LineDelta::NewlyMissed,
        },
    }
}
