//! Run loader: discover every `*.gcov` record-set under a directory, parse
//! each one, and assemble a [`RunCoverage`].
//!
//! Loading is all-or-nothing: any unreadable file, malformed record, or
//! duplicate source identity aborts the whole run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CovlensError, Result};
use crate::model::{FileCoverage, RunCoverage};
use crate::record;

/// Load one run from a directory of record-sets.
///
/// The logical identity of each file comes from its `Source:` header (the
/// on-disk record name may differ through build-directory prefixes); a
/// record-set without one falls back to the record file's stem. Discovery
/// is recursive and sorted by file name, so the result is a pure function
/// of the directory contents. An empty directory yields an empty run.
///
/// Some CI layouts nest the records one level down: when the directory
/// itself contains no record-sets but has a `codecov/` subdirectory, that
/// subdirectory is loaded instead.
pub fn load_dir(dir: &Path) -> Result<RunCoverage> {
    let files = collect(dir)?;
    if files.is_empty() {
        let fallback = dir.join("codecov");
        if fallback.is_dir() {
            return load_dir(&fallback);
        }
    }
    Ok(RunCoverage::new(files))
}

fn collect(dir: &Path) -> Result<Vec<FileCoverage>> {
    let mut files: Vec<FileCoverage> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(walk_error(dir))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("gcov") {
            continue;
        }

        // Instrumented sources occasionally embed non-UTF-8 bytes; a lossy
        // read keeps the line structure intact.
        let bytes = std::fs::read(path).map_err(|source| CovlensError::io(path, source))?;
        let content = String::from_utf8_lossy(&bytes);

        let set = record::parse_record_set(&content, path)?;
        let source = match set.source {
            Some(declared) => declared,
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unnamed")
                .to_string(),
        };

        if let Some(first) = seen.get(&source) {
            return Err(CovlensError::DuplicateFile {
                source_file: source,
                first: first.clone(),
                second: path.to_path_buf(),
            });
        }
        seen.insert(source.clone(), path.to_path_buf());
        files.push(FileCoverage::new(source, set.lines));
    }

    Ok(files)
}

fn walk_error(dir: &Path) -> impl Fn(walkdir::Error) -> CovlensError + '_ {
    move |err| {
        let path = err.path().unwrap_or(dir).to_path_buf();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
        CovlensError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineStatus;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "main.c.gcov",
            "-:0:Source:src/main.c\n1:1:int main() {\n0:2:  miss();\n-:3:}\n",
        );
        write(
            dir.path(),
            "util.c.gcov",
            "-:0:Source:src/util.c\n4:1:int util() { return 4; }\n",
        );

        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files.len(), 2);
        assert_eq!(run.totals.executable, 3);
        assert_eq!(run.totals.hit, 2);

        let main = run.get("src/main.c").unwrap();
        assert_eq!(main.lines.len(), 3);
        assert_eq!(main.summary.executable, 2);
        assert_eq!(main.summary.hit, 1);
        assert_eq!(main.lines[2].status, LineStatus::NotExecutable);
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.gcov", "-:0:Source:b.c\n1:1:b();\n");
        write(dir.path(), "a.gcov", "-:0:Source:a.c\n1:1:a();\n");

        let first = load_dir(dir.path()).unwrap();
        let second = load_dir(dir.path()).unwrap();
        assert_eq!(first, second);
        // Sorted discovery, not insertion-time accident.
        assert_eq!(first.files[0].path, "a.c");
        assert_eq!(first.files[1].path, "b.c");
    }

    #[test]
    fn test_empty_directory_is_a_valid_run() {
        let dir = tempfile::tempdir().unwrap();
        let run = load_dir(dir.path()).unwrap();
        assert!(run.files.is_empty());
        assert_eq!(run.totals.executable, 0);
        assert_eq!(run.totals.percent(), None);
    }

    #[test]
    fn test_non_gcov_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "not coverage");
        write(dir.path(), "a.gcov", "1:1:a();\n");
        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files.len(), 1);
    }

    #[test]
    fn test_source_header_wins_over_filename() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "mangled#path#main.c.gcov", "-:0:Source:src/main.c\n1:1:x\n");
        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files[0].path, "src/main.c");
    }

    #[test]
    fn test_missing_source_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.c.gcov", "1:1:x\n");
        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files[0].path, "main.c");
    }

    #[test]
    fn test_duplicate_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "one.gcov", "-:0:Source:foo.c\n1:1:x\n");
        write(dir.path(), "two.gcov", "-:0:Source:foo.c\n1:1:x\n");
        let err = load_dir(dir.path()).unwrap_err();
        match err {
            CovlensError::DuplicateFile { source_file, .. } => assert_eq!(source_file, "foo.c"),
            other => panic!("expected DuplicateFile, got {other:?}"),
        }
    }

    #[test]
    fn test_recursive_discovery() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        write(dir.path(), "a.gcov", "-:0:Source:a.c\n1:1:x\n");
        write(&dir.path().join("sub"), "b.gcov", "-:0:Source:b.c\n1:1:x\n");
        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files.len(), 2);
    }

    #[test]
    fn test_codecov_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("codecov");
        std::fs::create_dir(&nested).unwrap();
        write(&nested, "a.gcov", "-:0:Source:a.c\n1:1:x\n");
        let run = load_dir(dir.path()).unwrap();
        assert_eq!(run.files.len(), 1);
        assert_eq!(run.files[0].path, "a.c");
    }

    #[test]
    fn test_parse_failure_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.gcov", "-:0:Source:good.c\n1:1:x\n");
        write(dir.path(), "zbad.gcov", "-:0:Source:bad.c\nwhat even is this\n");
        assert!(matches!(
            load_dir(dir.path()).unwrap_err(),
            CovlensError::MalformedRecord { .. }
        ));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(matches!(
            load_dir(&gone).unwrap_err(),
            CovlensError::Io { .. }
        ));
    }
}
