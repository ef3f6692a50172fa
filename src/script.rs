use std::path::PathBuf;

use serde::Serialize;
use tera::Context;

use crate::commands::Synthesis;
use crate::config::PowerConfig;
use crate::paths::{FRAMES_DURATION_SUFFIX, FRAMES_END_SUFFIX, FRAMES_START_SUFFIX};
use crate::{Result, TEMPLATES};

pub const FRAME_INFO_PROC: &str = "dump_frame_info";

#[derive(Serialize)]
struct FrameInfoParams<'a> {
    proc_name: &'a str,
    start_suffix: &'a str,
    end_suffix: &'a str,
    duration_suffix: &'a str,
}

pub fn generate_frame_info_proc() -> Result<String> {
    let params = FrameInfoParams {
        proc_name: FRAME_INFO_PROC,
        start_suffix: FRAMES_START_SUFFIX,
        end_suffix: FRAMES_END_SUFFIX,
        duration_suffix: FRAMES_DURATION_SUFFIX,
    };
    Ok(TEMPLATES.render("dump_frame_info.tcl", &Context::from_serialize(params)?)?)
}

/// Settings reapplied at every tool invocation.
pub fn global_settings(cfg: &PowerConfig) -> Vec<String> {
    let threads = cfg.max_threads;
    vec![
        format!("set_multi_cpu_usage -local_cpu {threads}"),
        "set_db auto_super_thread 1".to_string(),
        format!("set_db max_cpus_per_server {threads}"),
        // The default of 1000 is too low for most time-based runs.
        "set_db max_frame_count 100000000".to_string(),
    ]
}

/// Renders the report-power step of the Joules script.
pub fn render_report_script(cfg: &PowerConfig, synthesis: &Synthesis) -> Result<String> {
    let mut lines = global_settings(cfg);
    lines.push("read_db pre_report_power".to_string());
    lines.push(generate_frame_info_proc()?);
    for power_cfg in synthesis.configs.iter() {
        lines.extend(power_cfg.commands().map(str::to_string));
    }
    lines.push("exit".to_string());
    Ok(lines.join("\n") + "\n")
}

/// Writes the report-power script into the run directory, creating the reports directory.
pub fn write_report_script(cfg: &PowerConfig, synthesis: &Synthesis) -> Result<PathBuf> {
    let script = render_report_script(cfg, synthesis)?;

    std::fs::create_dir_all(cfg.reports_dir())?;
    let path = cfg.run_dir.join("joules-report-power.tcl");
    std::fs::write(&path, script)?;

    Ok(path)
}
