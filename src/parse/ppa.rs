use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref ROW: Regex = Regex::new(&format!(
        r"^\s*{}(\S.*?)\s*$",
        r"(\S+)\s+".repeat(PpaRow::POSITIONAL)
    ))
    .unwrap();
}

/// Cell text the tool prints for a metric it did not compute.
const NOT_AVAILABLE: [&str; 3] = ["n/a", "N/A", "-"];

/// One row of a `report_ppa` table.
///
/// Metrics the tool reports as not available are `None`, which is distinct
/// from a reported zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpaRow {
    pub category: String,
    pub bits: Option<u64>,
    pub pct_clock_gated: Option<f64>,
    pub static_power: Option<f64>,
    pub dynamic_power: Option<f64>,
    pub delay: Option<f64>,
    pub slack: Option<f64>,
    pub cell_area: Option<f64>,
    pub routing_area: Option<f64>,
    pub instance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PpaTable {
    pub rows: Vec<PpaRow>,
}

/// `Some(None)` for a not-available marker, `None` for anything else that is not a number.
fn cell<T: std::str::FromStr>(s: &str) -> Option<Option<T>> {
    if NOT_AVAILABLE.contains(&s) {
        return Some(None);
    }
    s.trim_end_matches('%').parse().ok().map(Some)
}

impl PpaRow {
    /// Whitespace-separated cells before the free-form instance path.
    const POSITIONAL: usize = 9;

    pub const HEADER: [&'static str; 10] = [
        "category",
        "bits",
        "pct_clock_gated",
        "static_power",
        "dynamic_power",
        "delay",
        "slack",
        "cell_area",
        "routing_area",
        "instance",
    ];

    fn from_captures(caps: &regex::Captures) -> Option<Self> {
        Some(Self {
            category: caps[1].to_string(),
            bits: cell(&caps[2])?,
            pct_clock_gated: cell(&caps[3])?,
            static_power: cell(&caps[4])?,
            dynamic_power: cell(&caps[5])?,
            delay: cell(&caps[6])?,
            slack: cell(&caps[7])?,
            cell_area: cell(&caps[8])?,
            routing_area: cell(&caps[9])?,
            instance: caps[10].to_string(),
        })
    }
}

pub fn parse_ppa_table(lines: &[&str]) -> PpaTable {
    let rows = lines
        .iter()
        .filter_map(|line| ROW.captures(line))
        .filter(|caps| !caps[1].eq_ignore_ascii_case("category"))
        .filter_map(|caps| PpaRow::from_captures(&caps))
        .collect();
    PpaTable { rows }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const REPORT: &str = "
Category  Bits  %ClkGated  Static  Dynamic  Delay  Slack  CellArea  RouteArea  Instance
-----------------------------------------------------------------------------------------
register    64     87.50%  1.2e-03  4.5e-02  0.35   0.12    410.2   n/a  TB/dut/core/regs
memory     n/a        n/a  0.0      2.0e-02  -      -       1200.0   0   TB/dut/sram (bank 0)
logic        0      0.00%  2.1e-03  9.1e-02  0.61  -0.03    880.5   N/A  TB/dut/core
";

    #[test]
    fn test_parse_ppa_table() {
        let lines: Vec<_> = REPORT.lines().collect();
        let table = parse_ppa_table(&lines);
        assert_eq!(table.rows.len(), 3);

        let reg = &table.rows[0];
        assert_eq!(reg.category, "register");
        assert_eq!(reg.bits, Some(64));
        assert_relative_eq!(reg.pct_clock_gated.unwrap(), 87.5);
        assert_eq!(reg.routing_area, None);
        assert_eq!(reg.instance, "TB/dut/core/regs");

        let mem = &table.rows[1];
        assert_eq!(mem.bits, None);
        assert_eq!(mem.delay, None);
        assert_eq!(mem.static_power, Some(0.0));
        assert_eq!(mem.routing_area, Some(0.0));
        assert_eq!(mem.instance, "TB/dut/sram (bank 0)");

        let logic = &table.rows[2];
        assert_eq!(logic.bits, Some(0));
        assert_relative_eq!(logic.slack.unwrap(), -0.03);
    }

    #[test]
    fn test_non_numeric_row_skipped() {
        let table = parse_ppa_table(&[
            "register 64 87.50% 1.2e-03 4.5e-02 0.35 0.12 410.2 n/a TB/dut/core/regs",
            "register 64 87.50% high 4.5e-02 0.35 0.12 410.2 n/a TB/dut/core/regs",
        ]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].static_power, Some(1.2e-03));
    }

    #[test]
    fn test_header_and_short_lines_skipped() {
        let table = parse_ppa_table(&[
            "category bits clk static dynamic delay slack cell route instance",
            "register 1 2 3",
            "",
        ]);
        assert!(table.rows.is_empty());
    }
}
