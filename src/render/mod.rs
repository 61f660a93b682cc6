//! Renderers for the report model. All formatting lives here, including
//! rounding percentages to display precision; the model itself stays
//! unrounded.

pub mod html;
pub mod markdown;

use clap::ValueEnum;

/// Syntax highlighting engine for HTML detail pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Syntax {
    Off,
    Hljs,
}

/// highlight.js theme used when syntax highlighting is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyntaxTheme {
    Github,
    GithubDark,
}

/// Appearance knobs for the HTML renderer.
#[derive(Debug, Clone, Copy)]
pub struct HtmlOptions {
    pub syntax: Syntax,
    pub theme: SyntaxTheme,
    pub ui_font_size: u32,
    pub code_font_size: f64,
    pub code_line_height: f64,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            syntax: Syntax::Hljs,
            theme: SyntaxTheme::Github,
            ui_font_size: 12,
            code_font_size: 13.0,
            code_line_height: 1.25,
        }
    }
}

/// "66.7%", or "n/a" when the percentage is not applicable.
pub fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{p:.1}%"),
        None => "n/a".to_string(),
    }
}

/// Signed percentage delta: "+1.2%", "-0.4%", or "n/a".
pub fn format_delta_pct(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{d:+.1}%"),
        None => "n/a".to_string(),
    }
}
