use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::{parse_number, NUM};

lazy_static! {
    static ref SUBTOTAL: Regex = Regex::new(&format!(
        r"^\s*Subtotal\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})%?\s*$"
    ))
    .unwrap();
    static ref PERCENTAGE: Regex = Regex::new(&format!(
        r"^\s*Percentage\s+({NUM})%?\s+({NUM})%?\s+({NUM})%?\s+({NUM})%?\s+({NUM})%?\s*$"
    ))
    .unwrap();
    static ref CATEGORY: Regex = Regex::new(&format!(
        r#"^\s*("[^"]*"|\S+)\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})\s+({NUM})%\s*$"#
    ))
    .unwrap();
}

/// One row of a flat power table. Power columns are in the report's power unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerRow {
    pub category: String,
    pub leakage: f64,
    pub internal: f64,
    pub switching: f64,
    pub total: f64,
    /// Percentage of the total, without the `%` sign.
    pub percent: f64,
}

impl PowerRow {
    pub const HEADER: [&'static str; 6] = [
        "category",
        "leakage",
        "internal",
        "switching",
        "total",
        "percent",
    ];

    /// Builds a row from five numeric captures starting at group `first`.
    fn from_captures(category: &str, caps: &regex::Captures, first: usize) -> Option<Self> {
        let num = |i: usize| caps.get(first + i).and_then(|m| parse_number(m.as_str()));
        Some(Self {
            category: category.trim_matches('"').to_string(),
            leakage: num(0)?,
            internal: num(1)?,
            switching: num(2)?,
            total: num(3)?,
            percent: num(4)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PowerTable {
    pub rows: Vec<PowerRow>,
    pub subtotal: Option<PowerRow>,
    pub percentage: Option<PowerRow>,
}

impl PowerTable {
    /// Category rows followed by the summary rows, in that order.
    pub fn all_rows(&self) -> impl Iterator<Item = &PowerRow> {
        self.rows
            .iter()
            .chain(self.subtotal.iter())
            .chain(self.percentage.iter())
    }
}

/// Scans the category rows of a `report_power` table.
///
/// The summary rows are matched first so that they never land among the categories.
pub fn parse_power_table(lines: &[&str]) -> PowerTable {
    let mut table = PowerTable::default();

    for line in lines {
        if let Some(caps) = SUBTOTAL.captures(line) {
            table.subtotal = PowerRow::from_captures("Subtotal", &caps, 1);
        } else if let Some(caps) = PERCENTAGE.captures(line) {
            table.percentage = PowerRow::from_captures("Percentage", &caps, 1);
        } else if let Some(caps) = CATEGORY.captures(line) {
            if let Some(row) = PowerRow::from_captures(&caps[1], &caps, 2) {
                table.rows.push(row);
            }
        }
    }

    table
}
