//! Parsers for the text reports Joules writes.
//!
//! The caller picks the parser; nothing here sniffs the file contents. All
//! parsers are single-pass scanners that drop lines they do not recognize.

use std::fmt::Display;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::commands::ReportKind;
use crate::config::Segmentation;
use crate::Result;

pub mod hier;
pub mod power;
pub mod ppa;
pub mod profile;

pub use hier::{HierRow, HierTable};
pub use power::{PowerRow, PowerTable};
pub use ppa::{PpaRow, PpaTable};
pub use profile::{ColumnKey, FrameBounds, FrameIndex, TimeSeriesFrame};

/// Regex fragment matching a decimal or scientific number.
pub(crate) const NUM: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Flat per-category power table.
    Power,
    /// Per-instance power table.
    Hier,
    /// Power/performance/area table.
    Ppa,
    /// Time-series power profile matrix.
    Profile,
}

impl ReportFormat {
    /// The parser for the output of a report command, if there is one.
    pub fn for_kind(kind: ReportKind) -> Option<Self> {
        match kind {
            ReportKind::PowerReport => Some(Self::Power),
            ReportKind::HierPowerReport => Some(Self::Hier),
            ReportKind::Ppa => Some(Self::Ppa),
            ReportKind::WriteProfile => Some(Self::Profile),
            _ => None,
        }
    }

    /// Guesses the format from the report file name.
    ///
    /// Kept for command-line convenience; prefer [`ReportFormat::for_kind`]
    /// or an explicit selection.
    pub fn infer_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy();
        if path.contains("ppa") {
            Self::Ppa
        } else if path.contains("hier") {
            Self::Hier
        } else if path.contains(".profile") {
            Self::Profile
        } else {
            Self::Power
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Hier => "hier",
            Self::Ppa => "ppa",
            Self::Profile => "profile",
        }
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedReport {
    Power(PowerTable),
    Hier(HierTable),
    Ppa(PpaTable),
    /// `None` when the profile file holds no data.
    Profile(Option<TimeSeriesFrame>),
}

impl ParsedReport {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Profile(None))
    }
}

/// Parses an in-memory report.
///
/// Profiles parsed this way get midpoint frame boundaries. Use
/// [`parse_report_file`] to pick up the companion frame files.
pub fn parse_report(format: ReportFormat, text: &str) -> Result<ParsedReport> {
    let lines: Vec<&str> = text.lines().collect();
    Ok(match format {
        ReportFormat::Power => ParsedReport::Power(power::parse_power_table(&lines)),
        ReportFormat::Hier => ParsedReport::Hier(hier::parse_hier_table(&lines)),
        ReportFormat::Ppa => ParsedReport::Ppa(ppa::parse_ppa_table(&lines)),
        ReportFormat::Profile => ParsedReport::Profile(profile::parse_profile_text(
            &lines,
            &FrameBounds::Midpoint,
        )?),
    })
}

/// Reads and parses one report file.
///
/// `segmentation` is only consulted for profiles whose frame files are missing.
pub fn parse_report_file(
    format: ReportFormat,
    path: impl AsRef<Path>,
    segmentation: Option<&Segmentation>,
) -> Result<ParsedReport> {
    let path = path.as_ref();
    if format == ReportFormat::Profile {
        return Ok(ParsedReport::Profile(profile::parse_profile_file(
            path,
            segmentation,
        )?));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading report file {path:?}"))?;
    parse_report(format, &text)
}

/// Parses a numeric cell, ignoring a trailing `%`.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').parse().ok()
}

/// True for lines made only of rule characters, whitespace or box drawing.
pub(crate) fn is_separator(line: &str) -> bool {
    line.chars().all(|c| {
        c.is_whitespace()
            || matches!(c, '-' | '=' | '_' | '+' | '|' | '*')
            || ('\u{2500}'..='\u{257f}').contains(&c)
    })
}
