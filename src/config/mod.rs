use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;
use crate::Result;

pub mod report;

pub use report::{OutputFormat, ReportRequest, Segmentation};

/// Settings for one power-analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerConfig {
    /// Directory the tool runs in. Reports land in `<run_dir>/reports`.
    pub run_dir: PathBuf,
    pub top_module: String,
    /// Name of the testbench module.
    pub tb_name: String,
    /// Hierarchical path of the design under test inside the testbench.
    pub tb_dut: String,
    /// Clock ports of the design. The first is the default toggle signal.
    #[serde(default)]
    pub clocks: Vec<String>,
    #[serde(default)]
    pub waveforms: Vec<PathBuf>,
    #[serde(default)]
    pub saifs: Vec<PathBuf>,
    #[serde(default)]
    pub report_configs: Vec<ReportRequest>,
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    #[serde(default = "default_joules_bin")]
    pub joules_bin: String,
    #[serde(default)]
    pub export: ExportFormat,
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_max_threads() -> usize {
    1
}

fn default_joules_bin() -> String {
    "joules".to_string()
}

fn default_compress() -> bool {
    true
}

impl PowerConfig {
    /// Testbench-qualified DUT instance, with `.` separators replaced by `/`.
    pub fn dut_instance(&self) -> String {
        format!("{}/{}", self.tb_name, self.tb_dut.replace('.', "/"))
    }

    /// One default request per waveform and SAIF file, then the user-declared ones.
    pub fn report_requests(&self) -> Vec<ReportRequest> {
        self.waveforms
            .iter()
            .chain(self.saifs.iter())
            .map(ReportRequest::for_waveform)
            .chain(self.report_configs.iter().cloned())
            .collect()
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.run_dir.join("reports")
    }
}

pub fn parse_power_config(path: impl AsRef<Path>) -> Result<PowerConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Error reading configuration file {path:?}"))?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}
