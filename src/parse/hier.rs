use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::{is_separator, parse_number, NUM};

lazy_static! {
    static ref POWER_UNIT: Regex = Regex::new(r"^\s*Power Unit\s*:\s*(\S+)").unwrap();
    static ref AREA_UNIT: Regex = Regex::new(r"^\s*Area Unit\s*:\s*(\S+)").unwrap();
    static ref FRAME_REF: Regex =
        Regex::new(r"^\s*(?:PDB Frames?|Frames?|Stimulus)\s*:\s*(\S+)").unwrap();
    static ref HEADER: Regex = Regex::new(r"(?i)^\s*cells\s+pct_?cells\b").unwrap();
    static ref ROW: Regex = Regex::new(&format!(
        r"^\s*(\d+)\s+({NUM})%?\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})\s+(\d+)\s+(\S.*?)\s*$"
    ))
    .unwrap();
}

/// One instance of a `report_power -by_hierarchy` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierRow {
    pub cells: u64,
    /// Share of the design's cells, without the `%` sign.
    pub pct_cells: f64,
    pub leakage: f64,
    pub internal: f64,
    pub switching: f64,
    pub total: f64,
    /// Depth below the reported instance; the root is level 0.
    pub level: u32,
    pub instance: String,
}

impl HierRow {
    pub const HEADER: [&'static str; 8] = [
        "cells",
        "pct_cells",
        "leakage",
        "internal",
        "switching",
        "total",
        "level",
        "instance",
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HierTable {
    pub power_unit: Option<String>,
    pub area_unit: Option<String>,
    /// Stimulus/frame the table was computed for, e.g. `/stim#0/frame#-1`.
    pub frame_reference: Option<String>,
    pub rows: Vec<HierRow>,
}

fn first_capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).map(|caps| caps[1].to_string())
}

pub fn parse_hier_table(lines: &[&str]) -> HierTable {
    let mut table = HierTable::default();

    for line in lines {
        if is_separator(line) || HEADER.is_match(line) {
            continue;
        }

        if let Some(unit) = first_capture(&POWER_UNIT, line) {
            table.power_unit.get_or_insert(unit);
            continue;
        }
        if let Some(unit) = first_capture(&AREA_UNIT, line) {
            table.area_unit.get_or_insert(unit);
            continue;
        }
        if let Some(frame) = first_capture(&FRAME_REF, line) {
            table.frame_reference.get_or_insert(frame);
            continue;
        }

        if let Some(row) = ROW.captures(line).and_then(|caps| parse_row(&caps)) {
            table.rows.push(row);
        }
    }

    table
}

fn parse_row(caps: &regex::Captures) -> Option<HierRow> {
    let num = |i: usize| parse_number(&caps[i]);
    Some(HierRow {
        cells: caps[1].parse().ok()?,
        pct_cells: num(2)?,
        leakage: num(3)?,
        internal: num(4)?,
        switching: num(5)?,
        total: num(6)?,
        level: caps[7].parse().ok()?,
        instance: caps[8].to_string(),
    })
}
