//! Parser for gcov-style line records.
//!
//! One record-set per source file, one text line per source line:
//!
//! ```text
//! <status-token>:<line_number>:<source_text>
//! ```
//!
//! Status tokens:
//!   `<n>`      execution count (0 = executable but never hit)
//!   `#####`    unreached executable code, normalized to a count of 0
//!   `-`        not executable
//!   `=====`    no data (e.g. not compiled)
//!
//! Lines numbered 0 are record-set metadata (`Source:`, `Graph:`, `Data:`,
//! `Runs:`, ...); `Source` declares the logical path used to match this
//! record-set across runs.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CovlensError, Result};
use crate::model::{LineEntry, LineStatus};

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?P<tok>-|#+|=+|\d+)\s*:\s*(?P<line>\d+)\s*:(?P<text>.*)$").unwrap());

/// A parsed record-set: the declared source identity plus every source
/// line, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    /// Logical path from the `Source:` header, if the record-set declared
    /// one.
    pub source: Option<String>,
    pub lines: Vec<LineEntry>,
}

/// Parse the raw text of one record-set.
///
/// Every physical line must classify: unrecognized tokens are
/// [`CovlensError::MalformedRecord`], never skipped. Source line numbers
/// must be exactly `1..N` in order or the parse fails with
/// [`CovlensError::Sequence`]. `origin` is the on-disk record file, used
/// only for error context.
pub fn parse_record_set(input: &str, origin: &Path) -> Result<RecordSet> {
    let mut source: Option<String> = None;
    let mut lines: Vec<LineEntry> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let captures = LINE_RE.captures(raw).ok_or_else(|| malformed(origin, index, raw))?;

        let token = &captures["tok"];
        let line_number: u32 = captures["line"]
            .parse()
            .map_err(|_| malformed(origin, index, raw))?;
        let text = &captures["text"];

        if line_number == 0 {
            // Metadata header. Only Source matters; Graph/Data/Runs and
            // friends are ignored.
            if let Some(value) = text.strip_prefix("Source:") {
                source = Some(value.trim().to_string());
            }
            continue;
        }

        let status = match token {
            "-" => LineStatus::NotExecutable,
            t if t.starts_with('=') => LineStatus::NoData,
            t if t.starts_with('#') => LineStatus::Executed(0),
            t => {
                let count: u64 = t.parse().map_err(|_| malformed(origin, index, raw))?;
                LineStatus::Executed(count)
            }
        };

        let expected = lines.len() as u32 + 1;
        if line_number != expected {
            return Err(CovlensError::Sequence {
                path: origin.to_path_buf(),
                expected,
                found: line_number,
            });
        }

        lines.push(LineEntry {
            line_number,
            status,
            text: text.to_string(),
        });
    }

    Ok(RecordSet { source, lines })
}

fn malformed(origin: &Path, index: usize, raw: &str) -> CovlensError {
    CovlensError::MalformedRecord {
        path: origin.to_path_buf(),
        line: index + 1,
        content: raw.to_string(),
    }
}
