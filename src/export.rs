use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::parse::{HierRow, ParsedReport, PowerRow, PpaRow, TimeSeriesFrame};
use crate::Result;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Writes a parsed report as CSV.
///
/// Hierarchical metadata (units and frame reference) only appears in the JSON form.
pub fn write_csv<W: Write>(report: &ParsedReport, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    match report {
        ParsedReport::Power(table) => {
            wtr.write_record(PowerRow::HEADER)?;
            for row in table.all_rows() {
                wtr.serialize(row)?;
            }
        }
        ParsedReport::Hier(table) => {
            wtr.write_record(HierRow::HEADER)?;
            for row in table.rows.iter() {
                wtr.serialize(row)?;
            }
        }
        ParsedReport::Ppa(table) => {
            wtr.write_record(PpaRow::HEADER)?;
            for row in table.rows.iter() {
                wtr.serialize(row)?;
            }
        }
        ParsedReport::Profile(Some(frame)) => write_profile_csv(&mut wtr, frame)?,
        ParsedReport::Profile(None) => {}
    }

    wtr.flush()?;
    Ok(())
}

/// Lays the profile out with one header row per column level, then the row
/// index names, then one line per frame.
fn write_profile_csv<W: Write>(wtr: &mut csv::Writer<W>, frame: &TimeSeriesFrame) -> Result<()> {
    let levels: [(&str, fn(&crate::parse::ColumnKey) -> &str); 3] = [
        ("hier", |c| &c.hier),
        ("power_category", |c| &c.power_category),
        ("power_type", |c| &c.power_type),
    ];
    for (name, level) in levels {
        let record = ["", "", name]
            .into_iter()
            .chain(frame.columns.iter().map(level));
        wtr.write_record(record)?;
    }

    let names = ["time_ns", "start_ns", "end_ns"]
        .into_iter()
        .chain(frame.columns.iter().map(|_| ""));
    wtr.write_record(names)?;

    for (idx, values) in frame.index.iter().zip(frame.values.iter()) {
        let record = [idx.time_ns, idx.start_ns, idx.end_ns]
            .into_iter()
            .map(|v| v.to_string())
            .chain(values.iter().map(|v| v.to_string()));
        wtr.write_record(record)?;
    }
    Ok(())
}

pub fn write_json<W: Write>(report: &ParsedReport, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

pub fn write_to<W: Write>(report: &ParsedReport, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(report, writer),
        ExportFormat::Json => write_json(report, writer),
    }
}

/// Writes `report` to `path`, gzip-compressed if `compress` is set.
///
/// Parent directories are created as needed.
pub fn write_report(
    report: &ParsedReport,
    path: impl AsRef<Path>,
    format: ExportFormat,
    compress: bool,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).with_context(|| format!("Error creating {path:?}"))?;
    let mut file = BufWriter::new(file);

    if compress {
        let mut enc = GzEncoder::new(file, Compression::default());
        write_to(report, format, &mut enc)?;
        enc.finish()?.flush()?;
    } else {
        write_to(report, format, &mut file)?;
        file.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::*;
    use crate::parse::{parse_report, ColumnKey, FrameIndex, ReportFormat};

    const POWER_REPORT: &str = "
  Category  Leakage  Internal  Switching  Total  Row%
  \"top\" 1.0 2.0 3.0 6.0 50.0%
  Subtotal 1.0 2.0 3.0 6.0 100.0%
  Percentage 16.7% 33.3% 50.0% 100.0% 100.0%
";

    fn to_string(report: &ParsedReport, format: ExportFormat) -> Result<String> {
        let mut buf = Vec::new();
        write_to(report, format, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_power_csv() -> Result<()> {
        let report = parse_report(ReportFormat::Power, POWER_REPORT)?;
        let csv = to_string(&report, ExportFormat::Csv)?;
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "category,leakage,internal,switching,total,percent",
                "top,1.0,2.0,3.0,6.0,50.0",
                "Subtotal,1.0,2.0,3.0,6.0,100.0",
                "Percentage,16.7,33.3,50.0,100.0,100.0",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_ppa_csv_not_available() -> Result<()> {
        let report = parse_report(
            ReportFormat::Ppa,
            "memory n/a n/a 0.0 2.0 - - 12.5 0 TB/dut/sram\n",
        )?;
        let csv = to_string(&report, ExportFormat::Csv)?;
        assert_eq!(
            csv.lines().nth(1),
            Some("memory,,,0.0,2.0,,,12.5,0.0,TB/dut/sram")
        );
        Ok(())
    }

    #[test]
    fn test_profile_csv_layout() -> Result<()> {
        let frame = TimeSeriesFrame {
            index: vec![FrameIndex {
                time_ns: 5,
                start_ns: 0,
                end_ns: 10,
            }],
            columns: vec![
                ColumnKey::parse("TB/dut:__cat_memory:dynamic"),
                ColumnKey::parse("TB/dut:leakage"),
            ],
            values: vec![vec![1.5, 0.25]],
        };
        let csv = to_string(&ParsedReport::Profile(Some(frame)), ExportFormat::Csv)?;
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                ",,hier,TB/dut,TB/dut",
                ",,power_category,memory,total",
                ",,power_type,dynamic,leakage",
                "time_ns,start_ns,end_ns,,",
                "5,0,10,1.5,0.25",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_json() -> Result<()> {
        let report = parse_report(ReportFormat::Power, POWER_REPORT)?;
        let json = to_string(&report, ExportFormat::Json)?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["rows"][0]["category"], "top");
        assert_eq!(value["subtotal"]["total"], 6.0);
        Ok(())
    }

    #[test]
    fn test_write_report_gzip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("parsed/top.power.rpt.csv.gz");
        let report = parse_report(ReportFormat::Power, POWER_REPORT)?;
        write_report(&report, &path, ExportFormat::Csv, true)?;

        let mut text = String::new();
        GzDecoder::new(File::open(&path)?).read_to_string(&mut text)?;
        assert!(text.starts_with("category,leakage"));
        assert_eq!(text.lines().count(), 4);
        Ok(())
    }

    #[test]
    fn test_empty_profile() -> Result<()> {
        assert_eq!(to_string(&ParsedReport::Profile(None), ExportFormat::Csv)?, "");
        assert_eq!(to_string(&ParsedReport::Profile(None), ExportFormat::Json)?, "null");
        Ok(())
    }
}
