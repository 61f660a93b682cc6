use std::path::Path;

use covlens::cli::{self, Cli, Format};
use covlens::diff::{diff_runs, FileStatus, LineDelta};
use covlens::render::{Syntax, SyntaxTheme};
use covlens::{load, report};

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn setup_runs() -> (tempfile::TempDir, tempfile::TempDir) {
    let before = tempfile::tempdir().unwrap();
    let after = tempfile::tempdir().unwrap();

    // main.c: line 2 stays hit, line 3 becomes covered, line 4 becomes
    // uncovered.
    write(
        before.path(),
        "main.c.gcov",
        "\
-:0:Source:src/main.c
-:1:// entry point
1:2:int main(void) {
#####:3:  first();
5:4:  second();
-:5:}
",
    );
    write(
        after.path(),
        "main.c.gcov",
        "\
-:0:Source:src/main.c
-:1:// entry point
1:2:int main(void) {
7:3:  first();
#####:4:  second();
-:5:}
",
    );

    // old.c exists only before; new.c only after.
    write(before.path(), "old.c.gcov", "-:0:Source:old.c\n1:1:gone();\n");
    write(after.path(), "new.c.gcov", "-:0:Source:new.c\n0:1:fresh();\n");

    (before, after)
}

/// End-to-end: load both runs, diff, and check the per-line and per-file
/// classifications.
#[test]
fn diff_end_to_end() {
    let (before, after) = setup_runs();
    let a = load::load_dir(before.path()).unwrap();
    let b = load::load_dir(after.path()).unwrap();
    let diff = diff_runs(&a, &b);

    // Union of paths, no duplicates.
    let mut paths: Vec<_> = diff.files.iter().map(|f| f.path.clone()).collect();
    paths.sort();
    assert_eq!(paths, vec!["new.c", "old.c", "src/main.c"]);

    let main = diff.files.iter().find(|f| f.path == "src/main.c").unwrap();
    assert_eq!(main.status, FileStatus::Modified);
    assert_eq!(main.lines[2].delta, Some(LineDelta::NewlyHit));
    assert_eq!(main.lines[3].delta, Some(LineDelta::NewlyMissed));
    assert_eq!(main.delta_hit, Some(0));

    let old = diff.files.iter().find(|f| f.path == "old.c").unwrap();
    assert_eq!(old.status, FileStatus::Removed);
    assert_eq!(old.delta_hit, None);

    let new = diff.files.iter().find(|f| f.path == "new.c").unwrap();
    assert_eq!(new.status, FileStatus::Added);
}

/// Swapping the runs negates the aggregate deltas.
#[test]
fn diff_is_symmetric() {
    let (before, after) = setup_runs();
    let a = load::load_dir(before.path()).unwrap();
    let b = load::load_dir(after.path()).unwrap();

    let forward = diff_runs(&a, &b);
    let backward = diff_runs(&b, &a);
    assert_eq!(forward.delta_hit, -backward.delta_hit);
    assert_eq!(forward.delta_executable, -backward.delta_executable);
}

#[test]
fn diff_markdown_report() {
    let (before, after) = setup_runs();
    let a = load::load_dir(before.path()).unwrap();
    let b = load::load_dir(after.path()).unwrap();
    let report = report::build_diff(diff_runs(&a, &b));

    let md = covlens::render::markdown::diff(&report, true);
    assert!(md.contains("# Coverage Diff Report"));
    assert!(md.contains("`src/main.c`"));
    assert!(md.contains("**Became covered:** 3"));
    assert!(md.contains("**Became uncovered:** 4"));
}

#[test]
fn cli_diff_writes_html_with_details_for_changed_files() {
    let (before, after) = setup_runs();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("diff.html");

    let cli = Cli {
        run_a: before.path().to_path_buf(),
        run_b: Some(after.path().to_path_buf()),
        format: Format::Html,
        output: Some(output.clone()),
        details_dir: None,
        display_blank: false,
        strip_comments: false,
        syntax: Syntax::Off,
        syntax_theme: SyntaxTheme::Github,
        ui_font_size: 12,
        code_font_size: 13.0,
        code_line_height: 1.25,
        show_lines: false,
    };
    cli::run(cli).unwrap();

    let summary = std::fs::read_to_string(&output).unwrap();
    assert!(summary.contains("<h1>Coverage Diff Report</h1>"));
    assert!(summary.contains("src/main.c"));

    let details = out_dir.path().join("diff_files");
    assert!(details.is_dir());
    // One page per changed file (main.c, old.c, new.c).
    let pages = std::fs::read_dir(&details)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name != "index.html")
        .count();
    assert_eq!(pages, 3);
}

/// Loading the same directories twice produces the identical diff.
#[test]
fn diff_is_deterministic() {
    let (before, after) = setup_runs();
    let first = diff_runs(
        &load::load_dir(before.path()).unwrap(),
        &load::load_dir(after.path()).unwrap(),
    );
    let second = diff_runs(
        &load::load_dir(before.path()).unwrap(),
        &load::load_dir(after.path()).unwrap(),
    );
    assert_eq!(first, second);
}
