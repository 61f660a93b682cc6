//! Uniform in-memory representation of coverage data. The parser produces
//! `LineEntry` sequences, the loader assembles them into a `RunCoverage`,
//! and everything downstream (diffing, report building, rendering) only
//! reads these values.

use serde::Serialize;

/// Coverage status of one source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LineStatus {
    /// Executable line with its execution count. A count of 0 means the
    /// line was never hit (a miss).
    Executed(u64),
    /// Not executable (comments, blanks, declarations).
    NotExecutable,
    /// The instrumentation produced no data for this line (e.g. outside
    /// compiled regions).
    NoData,
}

impl LineStatus {
    pub fn is_executable(&self) -> bool {
        matches!(self, LineStatus::Executed(_))
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, LineStatus::Executed(n) if *n > 0)
    }
}

/// One source line of one record-set.
///
/// Every physical source line yields exactly one entry, in original order.
/// `NotExecutable` and `NoData` entries are never dropped at parse time;
/// hiding them is a display concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEntry {
    /// 1-based, contiguous within a file.
    pub line_number: u32,
    pub status: LineStatus,
    /// Raw source text, preserved verbatim.
    pub text: String,
}

/// Executable/hit counts for a file or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    pub executable: u64,
    pub hit: u64,
}

impl LineSummary {
    /// Reduce a line sequence to its counts. Total: empty input yields
    /// zeros.
    #[must_use]
    pub fn from_lines(lines: &[LineEntry]) -> Self {
        let mut summary = Self::default();
        for entry in lines {
            if entry.status.is_executable() {
                summary.executable += 1;
                if entry.status.is_hit() {
                    summary.hit += 1;
                }
            }
        }
        summary
    }

    pub fn missed(&self) -> u64 {
        self.executable - self.hit
    }

    /// Hit percentage, or `None` when nothing is executable. Not-applicable
    /// is distinct from 0%.
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        if self.executable == 0 {
            None
        } else {
            Some(self.hit as f64 / self.executable as f64 * 100.0)
        }
    }

    pub fn add(&mut self, other: &LineSummary) {
        self.executable += other.executable;
        self.hit += other.hit;
    }
}

/// Coverage data for a single source file within one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverage {
    /// Logical source path, stable across runs of the same codebase.
    pub path: String,
    pub lines: Vec<LineEntry>,
    pub summary: LineSummary,
}

impl FileCoverage {
    pub fn new(path: String, lines: Vec<LineEntry>) -> Self {
        let summary = LineSummary::from_lines(&lines);
        Self {
            path,
            lines,
            summary,
        }
    }
}

/// One run: every record-set found in one directory. Paths are unique;
/// file order is discovery order and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunCoverage {
    pub files: Vec<FileCoverage>,
    pub totals: LineSummary,
}

impl RunCoverage {
    pub fn new(files: Vec<FileCoverage>) -> Self {
        let mut totals = LineSummary::default();
        for file in &files {
            totals.add(&file.summary);
        }
        Self { files, totals }
    }

    pub fn get(&self, path: &str) -> Option<&FileCoverage> {
        self.files.iter().find(|f| f.path == path)
    }
}
