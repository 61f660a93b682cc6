//! Command-line front-end: argument surface, mode selection, and output
//! writing. The core stays pure; every filesystem write happens here.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use crate::diff::{diff_runs, FileStatus};
use crate::load;
use crate::render::{html, markdown, HtmlOptions, Syntax, SyntaxTheme};
use crate::report::{self, DisplayOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Html,
    Md,
}

/// covlens — coverage and diff reports from directories of gcov records.
#[derive(Parser)]
#[command(name = "covlens", version, about)]
pub struct Cli {
    /// Directory of record-sets for run A.
    pub run_a: PathBuf,

    /// Directory of record-sets for run B. If omitted, single-run mode.
    pub run_b: Option<PathBuf>,

    /// Output format.
    #[arg(long, short, value_enum, default_value_t = Format::Html)]
    pub format: Format,

    /// Write the report to this file (default derived from the input
    /// directory names).
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// (HTML) Directory for per-file detail pages. Default: <output>_files.
    #[arg(long)]
    pub details_dir: Option<PathBuf>,

    /// In detail pages, show whitespace-only lines (non-exec/no-data only).
    #[arg(long)]
    pub display_blank: bool,

    /// In detail pages, hide comment-only lines (non-exec/no-data only;
    /// heuristic).
    #[arg(long)]
    pub strip_comments: bool,

    /// Syntax highlighting engine for detail pages.
    #[arg(long, value_enum, default_value_t = Syntax::Hljs)]
    pub syntax: Syntax,

    /// Syntax theme when --syntax=hljs.
    #[arg(long, value_enum, default_value_t = SyntaxTheme::Github)]
    pub syntax_theme: SyntaxTheme,

    /// Base UI font size in px (summary and detail pages).
    #[arg(long, default_value_t = 12)]
    pub ui_font_size: u32,

    /// Code font size in px (detail pages).
    #[arg(long, default_value_t = 13.0)]
    pub code_font_size: f64,

    /// Code line-height (detail pages).
    #[arg(long, default_value_t = 1.25)]
    pub code_line_height: f64,

    /// (Markdown diff) Include per-file line numbers whose coverage
    /// changed state.
    #[arg(long)]
    pub show_lines: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    if !cli.run_a.is_dir() {
        bail!("{} is not a directory", cli.run_a.display());
    }
    if let Some(run_b) = &cli.run_b {
        if !run_b.is_dir() {
            bail!("{} is not a directory", run_b.display());
        }
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.run_a, cli.run_b.as_deref(), cli.format));
    let details_dir = match cli.format {
        Format::Html => Some(
            cli.details_dir
                .clone()
                .unwrap_or_else(|| default_details_dir(&output)),
        ),
        Format::Md => None,
    };

    let display = DisplayOptions {
        display_blank: cli.display_blank,
        strip_comments: cli.strip_comments,
    };
    let html_options = HtmlOptions {
        syntax: cli.syntax,
        theme: cli.syntax_theme,
        ui_font_size: cli.ui_font_size,
        code_font_size: cli.code_font_size,
        code_line_height: cli.code_line_height,
    };
    let generated_at = chrono::Utc::now().to_rfc3339();

    let summary = match &cli.run_b {
        Some(run_b) => {
            let a = load::load_dir(&cli.run_a)?;
            let b = load::load_dir(run_b)?;
            let report = report::build_diff(diff_runs(&a, &b));

            match details_dir.as_deref() {
                Some(details) => {
                    let mut links = HashMap::new();
                    create_details_dir(details)?;
                    let breadcrumb = breadcrumb_href(details, &output);
                    for row in report
                        .files
                        .iter()
                        .filter(|row| row.status != FileStatus::Unchanged)
                    {
                        let name = html::detail_file_name(&row.path);
                        let page = html::detail_diff(row, display, &html_options, &breadcrumb);
                        write_file(&details.join(&name), &page)?;
                        links.insert(row.path.clone(), detail_href(details, &name));
                    }
                    html::summary_diff(&report, &links, &html_options, &generated_at)
                }
                None => markdown::diff(&report, cli.show_lines),
            }
        }
        None => {
            let run = load::load_dir(&cli.run_a)?;
            let report = report::build(run);

            match details_dir.as_deref() {
                Some(details) => {
                    let mut links = HashMap::new();
                    create_details_dir(details)?;
                    let breadcrumb = breadcrumb_href(details, &output);
                    for row in &report.files {
                        let name = html::detail_file_name(&row.path);
                        let page = html::detail_single(row, display, &html_options, &breadcrumb);
                        write_file(&details.join(&name), &page)?;
                        links.insert(row.path.clone(), detail_href(details, &name));
                    }
                    html::summary_single(&report, &links, &html_options, &generated_at)
                }
                None => markdown::single(&report),
            }
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    write_file(&output, &summary)?;
    // A copy inside the details directory lets the tree be browsed
    // standalone.
    if let Some(details) = details_dir.as_deref() {
        write_file(&details.join("index.html"), &summary)?;
    }

    let label = match cli.format {
        Format::Html => "HTML",
        Format::Md => "Markdown",
    };
    println!("Wrote {label} report to: {}", output.display());
    if let Some(details) = details_dir.as_deref() {
        println!("Wrote per-file details to: {}/", details.display());
    }

    Ok(())
}

/// Default output file name, derived from the run directory names.
fn default_output(run_a: &Path, run_b: Option<&Path>, format: Format) -> PathBuf {
    let ext = match format {
        Format::Html => "html",
        Format::Md => "md",
    };
    let base = match run_b {
        Some(run_b) => format!(
            "coverage_diff_{}_V_{}",
            dir_label(run_a),
            dir_label(run_b)
        ),
        None => format!("coverage_{}", dir_label(run_a)),
    };
    PathBuf::from(format!("{base}.{ext}"))
}

fn dir_label(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("run")
        .to_string()
}

fn default_details_dir(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("coverage");
    output.with_file_name(format!("{stem}_files"))
}

fn create_details_dir(details: &Path) -> Result<()> {
    fs::create_dir_all(details)
        .with_context(|| format!("failed to create details directory {}", details.display()))
}

/// Href from a detail page back to the summary file.
fn breadcrumb_href(details: &Path, output: &Path) -> String {
    let output_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("index.html");
    if details.parent() == output.parent() {
        format!("../{output_name}")
    } else {
        output.display().to_string()
    }
}

/// Href from the summary file to a detail page.
fn detail_href(details: &Path, name: &str) -> String {
    let dir = details
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("details");
    format!("{dir}/{name}")
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
