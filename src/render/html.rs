//! HTML output: summary pages with a client-side sortable table, plus
//! per-file detail pages annotating every retained source line.

use std::collections::HashMap;
use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::diff::{FileStatus, LineDelta};
use crate::model::{LineEntry, LineStatus};
use crate::report::{
    line_visible, pair_text, pair_visible, sort_diffs, sort_files, DiffReport, DiffRow,
    DiffSortKey, Direction, DisplayOptions, FileRow, FileSortKey, Report,
};

use super::{format_delta_pct, format_pct, HtmlOptions, Syntax, SyntaxTheme};

/// Escape HTML special characters.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Stable, filesystem-safe detail page name for a logical source path.
/// The truncated digest keeps distinct paths with equal basenames from
/// colliding.
pub fn detail_file_name(path: &str) -> String {
    let tail = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let safe: String = tail
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = Sha256::digest(path.as_bytes());
    let mut hash = String::with_capacity(16);
    for byte in &digest[..8] {
        write!(hash, "{byte:02x}").unwrap();
    }
    format!("{safe}__{hash}.html")
}

/// Best-effort mapping from file extension to a highlight.js language
/// class.
fn guess_language(path: &str) -> Option<&'static str> {
    let lower = path.to_lowercase();
    let ext = lower.rsplit('.').next()?;
    match ext {
        "f90" | "f95" | "f03" | "f08" | "f" | "for" | "f77" => Some("fortran"),
        "hpp" | "hh" | "hxx" | "cpp" | "cc" | "cxx" | "cuh" | "cu" => Some("cpp"),
        "h" | "c" => Some("c"),
        "py" => Some("python"),
        "sh" | "bash" => Some("bash"),
        "js" => Some("javascript"),
        "ts" => Some("typescript"),
        "java" => Some("java"),
        "go" => Some("go"),
        "rs" => Some("rust"),
        _ => None,
    }
}

const CSS: &str = "
body { font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; margin: 24px; font-size: {UI_FONT_SIZE}px; }
h1, h2 { margin: 0.6em 0 0.4em; }
table { border-collapse: collapse; width: 100%; margin: 1em 0; }
th, td { border: 1px solid #ddd; padding: 6px 8px; text-align: left; }
tr:nth-child(even) { background: #f9f9f9; }
td.num, th.num { text-align: right; }
.badge { display: inline-block; padding: 2px 8px; border-radius: 12px; background: #eee; margin-right: 8px; }
.pill { display: inline-block; padding: 2px 8px; border-radius: 999px; background: #eee; margin-left: 8px; font-weight: 600; }
.delta-pos { color: #006400; font-weight: 600; }
.delta-neg { color: #8B0000; font-weight: 600; }
.header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 10px; }
.breadcrumbs a, a.filelink { text-decoration: none; }
.generated { color: #777; margin: 0.4em 0 1em; }
tr.nonexec td, tr.nodata td { color: #555; }
tr.hit { background: #e6ffed; }
tr.miss { background: #ffebee; }
pre { margin: 0; white-space: pre-wrap; }
pre, code, pre code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: {CODE_FONT_SIZE}px; line-height: {CODE_LINE_HEIGHT}; }
code.hljs { padding: 0; background: transparent; }
th.sortable { cursor: pointer; user-select: none; }
th.sortable .caret { display: inline-block; margin-left: 6px; opacity: 0.7; }
th[aria-sort=\"asc\"] .caret::after { content: \"\\25B2\"; }
th[aria-sort=\"desc\"] .caret::after { content: \"\\25BC\"; }
";

const SORTER_JS: &str = "
(function(){
  function parseCell(td, type){
    var t = td ? td.textContent.trim() : '';
    if(type === 'percent' || type === 'num'){ return parseFloat(t.replace('%','')) || 0; }
    return t.toLowerCase();
  }
  function compare(a, b, type, dir){
    var order;
    if(type === 'alpha'){ order = a < b ? -1 : (a > b ? 1 : 0); }
    else { order = a - b; }
    return dir === 'asc' ? order : -order;
  }
  function sortBy(table, th, index, type, dir){
    var tbody = table.tBodies[0];
    var rows = Array.prototype.slice.call(tbody.rows);
    rows.sort(function(r1, r2){
      return compare(parseCell(r1.cells[index], type), parseCell(r2.cells[index], type), type, dir);
    });
    rows.forEach(function(r){ tbody.appendChild(r); });
    th.setAttribute('aria-sort', dir);
  }
  document.addEventListener('DOMContentLoaded', function(){
    document.querySelectorAll('table.sortable').forEach(function(table){
      if(!table.tHead) return;
      var headers = table.tHead.rows[0].cells;
      Array.prototype.forEach.call(headers, function(th, index){
        var type = th.getAttribute('data-sort');
        if(!type) return;
        th.classList.add('sortable');
        if(!th.querySelector('.caret')){
          var caret = document.createElement('span');
          caret.className = 'caret';
          th.appendChild(caret);
        }
        th.addEventListener('click', function(){
          var dir = th.getAttribute('aria-sort') === 'asc' ? 'desc' : 'asc';
          Array.prototype.forEach.call(headers, function(h){ h.removeAttribute('aria-sort'); });
          sortBy(table, th, index, type, dir);
        });
        var initial = th.getAttribute('data-initial-sort');
        if(initial){ sortBy(table, th, index, type, initial); }
      });
    });
  });
})();
";

fn head(title: &str, options: &HtmlOptions) -> String {
    let css = CSS
        .replace("{UI_FONT_SIZE}", &options.ui_font_size.to_string())
        .replace("{CODE_FONT_SIZE}", &options.code_font_size.to_string())
        .replace("{CODE_LINE_HEIGHT}", &options.code_line_height.to_string());

    let syntax = match options.syntax {
        Syntax::Off => String::new(),
        Syntax::Hljs => {
            let theme_file = match options.theme {
                SyntaxTheme::Github => "github.min.css",
                SyntaxTheme::GithubDark => "github-dark.min.css",
            };
            let base = "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0";
            let mut bits = format!("<link rel='stylesheet' href='{base}/styles/{theme_file}'>");
            write!(bits, "<script src='{base}/highlight.min.js'></script>").unwrap();
            for lang in ["fortran", "c", "cpp", "python", "bash"] {
                write!(bits, "<script src='{base}/languages/{lang}.min.js'></script>").unwrap();
            }
            bits.push_str(
                "<script>document.addEventListener('DOMContentLoaded', function(){ if(window.hljs){ hljs.highlightAll(); } });</script>",
            );
            bits
        }
    };

    format!(
        "<!DOCTYPE html><html><head><meta charset='utf-8'><title>{}</title><style>{css}</style><script>{SORTER_JS}</script>{syntax}</head>",
        escape(title)
    )
}

fn file_label(path: &str, detail_links: &HashMap<String, String>) -> String {
    let label = format!("<code>{}</code>", escape(path));
    match detail_links.get(path) {
        Some(link) => format!("<a class='filelink' href='{}'>{label}</a>", escape(link)),
        None => label,
    }
}

/// Summary page for single-run mode. `detail_links` maps logical paths to
/// their detail page hrefs (relative to the summary file).
pub fn summary_single(
    report: &Report,
    detail_links: &HashMap<String, String>,
    options: &HtmlOptions,
    generated_at: &str,
) -> String {
    let mut out = head("Coverage Report", options);
    out.push_str("<body><h1>Coverage Report</h1>");
    write!(
        out,
        "<p class='generated'>Generated {}</p>",
        escape(generated_at)
    )
    .unwrap();
    write!(
        out,
        "<div><span class='badge'>Coverage: {} ({}/{})</span><span class='badge'>Files: {}</span></div>",
        format_pct(report.totals.percent()),
        report.totals.hit,
        report.totals.executable,
        report.files.len()
    )
    .unwrap();

    out.push_str("<h2>File Summary</h2>");
    out.push_str(
        "<table class='sortable'><thead><tr>\
         <th data-sort='alpha' data-initial-sort='asc'>File</th>\
         <th class='num' data-sort='percent'>% Covered</th>\
         <th class='num' data-sort='num'>Covered</th>\
         <th class='num' data-sort='num'>Total</th>\
         <th class='num' data-sort='num'>Uncovered</th>\
         </tr></thead><tbody>",
    );

    if report.files.is_empty() {
        out.push_str("<tr><td colspan='5' style='text-align:center'>No executable lines found</td></tr>");
    } else {
        let rows = sort_files(report.files.clone(), FileSortKey::Path, Direction::Ascending);
        for row in &rows {
            write!(
                out,
                "<tr><td>{}</td><td class='num'>{}</td><td class='num'>{}</td><td class='num'>{}</td><td class='num'>{}</td></tr>",
                file_label(&row.path, detail_links),
                format_pct(row.percentage),
                row.hit,
                row.executable,
                row.missed
            )
            .unwrap();
        }
    }

    out.push_str("</tbody></table></body></html>");
    out
}

/// Summary page for diff mode; changed files only.
pub fn summary_diff(
    report: &DiffReport,
    detail_links: &HashMap<String, String>,
    options: &HtmlOptions,
    generated_at: &str,
) -> String {
    let mut out = head("Coverage Diff Report", options);
    out.push_str("<body><h1>Coverage Diff Report</h1>");
    write!(
        out,
        "<p class='generated'>Generated {}</p>",
        escape(generated_at)
    )
    .unwrap();

    let delta_class = if report.delta_percentage.unwrap_or(0.0) >= 0.0 {
        "delta-pos"
    } else {
        "delta-neg"
    };
    write!(
        out,
        "<div><span class='badge'>Run A: {} ({}/{})</span><span class='badge'>Run B: {} ({}/{})</span><span class='badge'>&Delta;: <span class='{delta_class}'>{}</span></span></div>",
        format_pct(report.totals_a.percent()),
        report.totals_a.hit,
        report.totals_a.executable,
        format_pct(report.totals_b.percent()),
        report.totals_b.hit,
        report.totals_b.executable,
        format_delta_pct(report.delta_percentage)
    )
    .unwrap();

    out.push_str("<h2>File Summary (changed only)</h2>");
    out.push_str(
        "<table class='sortable'><thead><tr>\
         <th data-sort='alpha' data-initial-sort='asc'>File</th>\
         <th class='num' data-sort='percent'>A %</th>\
         <th class='num' data-sort='percent'>B %</th>\
         <th class='num' data-sort='percent'>&Delta; %</th>\
         <th class='num' data-sort='num'>+covered</th>\
         <th class='num' data-sort='num'>+uncovered</th>\
         </tr></thead><tbody>",
    );

    let changed: Vec<DiffRow> = report
        .files
        .iter()
        .filter(|row| row.status != FileStatus::Unchanged)
        .cloned()
        .collect();
    if changed.is_empty() {
        out.push_str(
            "<tr><td colspan='6' style='text-align:center'>No coverage changes detected</td></tr>",
        );
    } else {
        let rows = sort_diffs(changed, DiffSortKey::Path, Direction::Ascending);
        for row in &rows {
            let class = if row.delta_percentage.unwrap_or(0.0) >= 0.0 {
                "delta-pos"
            } else {
                "delta-neg"
            };
            write!(
                out,
                "<tr><td>{}</td><td class='num'>{}</td><td class='num'>{}</td><td class='num {class}'>{}</td><td class='num'>{}</td><td class='num'>{}</td></tr>",
                file_label(&row.path, detail_links),
                format_pct(row.a_percentage),
                format_pct(row.b_percentage),
                format_delta_pct(row.delta_percentage),
                row.newly_hit,
                row.newly_missed
            )
            .unwrap();
        }
    }

    out.push_str("</tbody></table></body></html>");
    out
}

fn state_name(status: &LineStatus) -> &'static str {
    match status {
        LineStatus::Executed(0) => "uncovered",
        LineStatus::Executed(_) => "covered",
        LineStatus::NotExecutable => "non-exec",
        LineStatus::NoData => "no-data",
    }
}

fn side_state(entry: &Option<LineEntry>) -> &'static str {
    match entry {
        Some(e) => state_name(&e.status),
        None => "absent",
    }
}

fn side_count(entry: &Option<LineEntry>) -> String {
    match entry {
        Some(LineEntry {
            status: LineStatus::Executed(n),
            ..
        }) => n.to_string(),
        _ => String::new(),
    }
}

fn code_cell(text: &str, lang_class: &str) -> String {
    format!(
        "<td><pre><code class='hljs {lang_class}'>{}</code></pre></td>",
        escape(text)
    )
}

fn breadcrumb(href: &str, label: &str) -> String {
    format!(
        "<div class='breadcrumbs'><a href='{}'>Coverage Report</a> / <strong>{}</strong></div>",
        escape(href),
        escape(label)
    )
}

/// Detail page for one file in single-run mode.
pub fn detail_single(
    row: &FileRow,
    display: DisplayOptions,
    options: &HtmlOptions,
    breadcrumb_href: &str,
) -> String {
    let title = format!("Coverage Detail — {}", row.path);
    let mut out = head(&title, options);
    out.push_str("<body>");
    write!(out, "<h1>{}</h1>", escape(&title)).unwrap();
    write!(
        out,
        "<div class='header'>{}<div><span class='pill'>Coverage: {}</span><span class='pill'>Covered: {}</span><span class='pill'>Total: {}</span></div></div>",
        breadcrumb(breadcrumb_href, &row.path),
        format_pct(row.percentage),
        row.hit,
        row.executable
    )
    .unwrap();

    let lang_class = guess_language(&row.path)
        .map(|l| format!("language-{l}"))
        .unwrap_or_default();

    out.push_str(
        "<table class='sortable'><thead><tr>\
         <th class='num' data-sort='num' data-initial-sort='asc'>Line</th>\
         <th class='num' data-sort='num'>Count</th>\
         <th data-sort='alpha'>State</th>\
         <th data-sort='alpha'>Code</th>\
         </tr></thead><tbody>",
    );

    for entry in row.lines.iter().filter(|e| line_visible(e, display)) {
        let state = state_name(&entry.status);
        let row_class = match state {
            "covered" => " class='hit'",
            "uncovered" => " class='miss'",
            "non-exec" => " class='nonexec'",
            _ => " class='nodata'",
        };
        let count = match entry.status {
            LineStatus::Executed(n) => n.to_string(),
            _ => String::new(),
        };
        write!(
            out,
            "<tr{row_class} id='L{line}'><td class='num'>{line}</td><td class='num'>{count}</td><td>{state}</td>{}</tr>",
            code_cell(&entry.text, &lang_class),
            line = entry.line_number,
        )
        .unwrap();
    }

    out.push_str("</tbody></table></body></html>");
    out
}

/// Detail page for one file in diff mode: both runs side by side.
pub fn detail_diff(
    row: &DiffRow,
    display: DisplayOptions,
    options: &HtmlOptions,
    breadcrumb_href: &str,
) -> String {
    let title = format!("Coverage Detail — {}", row.path);
    let mut out = head(&title, options);
    out.push_str("<body>");
    write!(out, "<h1>{}</h1>", escape(&title)).unwrap();
    write!(
        out,
        "<div class='header'>{}<div><span class='pill'>A: {}</span><span class='pill'>B: {}</span><span class='pill'>&Delta;: {}</span></div></div>",
        breadcrumb(breadcrumb_href, &row.path),
        format_pct(row.a_percentage),
        format_pct(row.b_percentage),
        format_delta_pct(row.delta_percentage)
    )
    .unwrap();

    let lang_class = guess_language(&row.path)
        .map(|l| format!("language-{l}"))
        .unwrap_or_default();

    out.push_str(
        "<table class='sortable'><thead><tr>\
         <th class='num' data-sort='num' data-initial-sort='asc'>Line</th>\
         <th class='num' data-sort='num'>A count</th>\
         <th class='num' data-sort='num'>B count</th>\
         <th data-sort='alpha'>A state</th>\
         <th data-sort='alpha'>B state</th>\
         <th data-sort='alpha'>Code</th>\
         </tr></thead><tbody>",
    );

    for pair in row.lines.iter().filter(|p| pair_visible(p, display)) {
        let row_class = match pair.delta {
            Some(LineDelta::NewlyHit) => " class='hit'",
            Some(LineDelta::NewlyMissed) => " class='miss'",
            _ => match (side_state(&pair.a), side_state(&pair.b)) {
                ("non-exec", _) | (_, "non-exec") => " class='nonexec'",
                ("no-data", _) | (_, "no-data") => " class='nodata'",
                _ => "",
            },
        };
        write!(
            out,
            "<tr{row_class} id='L{line}'><td class='num'>{line}</td><td class='num'>{}</td><td class='num'>{}</td><td>{}</td><td>{}</td>{}</tr>",
            side_count(&pair.a),
            side_count(&pair.b),
            side_state(&pair.a),
            side_state(&pair.b),
            code_cell(pair_text(pair), &lang_class),
            line = pair.line_number,
        )
        .unwrap();
    }

    out.push_str("</tbody></table></body></html>");
    out
}
