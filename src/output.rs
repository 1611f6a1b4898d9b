//! # Terminal Output
//!
//! Colour handling and plain-text tables for command output.
//!
//! Colour is decided once per invocation from the `--color` flag and the
//! environment:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colours when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colours
//! - `CLICOLOR_FORCE=1` forces colours even when stdout is not a TTY
//! - `TERM=dumb` disables colours

use std::env;
use std::fmt::Write as _;

use console::{measure_text_width, style};

/// Whether command output may use ANSI styling.
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag value (`always`, `never` or `auto`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colours, even when empty.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// Green when colour is on.
    pub fn good(&self, text: &str) -> String {
        if self.use_color {
            style(text).green().to_string()
        } else {
            text.to_string()
        }
    }

    /// Yellow when colour is on.
    pub fn attention(&self, text: &str) -> String {
        if self.use_color {
            style(text).yellow().to_string()
        } else {
            text.to_string()
        }
    }

    /// Bold when colour is on.
    pub fn heading(&self, text: &str) -> String {
        if self.use_color {
            style(text).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Left-aligned columns separated by two spaces.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.rows
            .push(values.into_iter().map(|v| v.to_string()).collect());
    }

    /// Renders the table; cell widths ignore ANSI escape codes.
    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(measure_text_width(cell));
            }
        }

        let mut out = String::new();
        for line in std::iter::once(&self.headers).chain(&self.rows) {
            let mut rendered = String::new();
            for (i, cell) in line.iter().enumerate() {
                rendered.push_str(cell);
                if i + 1 < line.len() {
                    let pad = widths[i] - measure_text_width(cell) + 2;
                    rendered.push_str(&" ".repeat(pad));
                }
            }
            let _ = writeln!(out, "{}", rendered.trim_end());
        }
        out
    }
}
