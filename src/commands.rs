//! Turns report requests into Joules commands.
//!
//! Each request yields a [`CommandConfig`]: an optional stimulus load and power
//! computation (omitted when an earlier request already loaded the same
//! stimulus), a frame-metadata dump, and one [`ReportCommand`] per requested
//! output. Report commands carry the path the tool will write so that the
//! parsers never need to re-split command text.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::Serialize;

use crate::config::{OutputFormat, PowerConfig, ReportRequest, Segmentation};
use crate::error::PowerError;
use crate::paths;
use crate::stimulus::{StimAlias, StimulusRegistry};
use crate::Result;

/// What a report command produces.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub enum ReportKind {
    PowerReport,
    HierPowerReport,
    Activity,
    HierActivity,
    Ppa,
    Area,
    PlotProfile,
    WriteProfile,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportCommand {
    pub kind: ReportKind,
    pub text: String,
    /// File the tool writes, if any.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandConfig {
    pub alias: StimAlias,
    pub report_stem: PathBuf,
    pub segmentation: Option<Segmentation>,
    pub read_stim_cmd: Option<String>,
    pub compute_power_cmd: Option<String>,
    pub frame_info_cmd: String,
    pub report_cmds: Vec<ReportCommand>,
}

impl CommandConfig {
    /// All commands of this config in emission order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.read_stim_cmd
            .iter()
            .chain(self.compute_power_cmd.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.frame_info_cmd.as_str()))
            .chain(self.report_cmds.iter().map(|cmd| cmd.text.as_str()))
    }
}

/// Result of synthesizing a batch of requests.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub configs: Vec<CommandConfig>,
    /// Index of each rejected request with the reason.
    pub failures: Vec<(usize, PowerError)>,
}

impl Synthesis {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CommandSynthesizer {
    dut_instance: String,
    clocks: Vec<String>,
    reports_dir: PathBuf,
    cwd: PathBuf,
    registry: StimulusRegistry,
}

fn join_args<'a>(args: impl IntoIterator<Item = &'a str>) -> String {
    args.into_iter().filter(|arg| !arg.is_empty()).join(" ")
}

fn opt_flag(flag: &str, value: Option<&str>) -> String {
    value.map(|v| format!("{flag} {v}")).unwrap_or_default()
}

impl CommandSynthesizer {
    /// Creates a synthesizer resolving relative waveform and report paths against the current directory.
    pub fn new(cfg: &PowerConfig) -> Result<Self> {
        Ok(Self::with_cwd(cfg, std::env::current_dir()?))
    }

    pub fn with_cwd(cfg: &PowerConfig, cwd: impl AsRef<Path>) -> Self {
        let cwd = cwd.as_ref();
        Self {
            dut_instance: cfg.dut_instance(),
            clocks: cfg.clocks.clone(),
            // The tool runs inside the run directory, so report paths must not be relative.
            reports_dir: cwd.join(cfg.reports_dir()),
            cwd: cwd.to_owned(),
            registry: StimulusRegistry::new(),
        }
    }

    pub fn registry(&self) -> &StimulusRegistry {
        &self.registry
    }

    pub fn register_stimulus(&mut self, load_command: &str) -> (StimAlias, bool) {
        self.registry.register(load_command)
    }

    /// Renders the stimulus-load command of `req`, without alias.
    pub fn load_command(&self, req: &ReportRequest) -> std::result::Result<String, PowerError> {
        let waveform = self.cwd.join(&req.waveform_path);
        let mut cmd = format!(
            "read_stimulus -file {} -dut_instance {}",
            waveform.display(),
            self.dut_instance
        );
        if let Some(start) = req.start_time {
            cmd.push_str(&format!(" -start {start}"));
        }
        if let Some(end) = req.end_time {
            cmd.push_str(&format!(" -end {end}"));
        }

        if req.segmentation_count() > 1 {
            log::warn!(
                "More than one time-based analysis specified for {:?}, using first one in {{interval_size, interval_list, toggle_signal/num_toggles, frame_count}}",
                req.waveform_path
            );
        }
        match req.segmentation() {
            Some(Segmentation::IntervalSize(size)) => {
                cmd.push_str(&format!(" -interval_size {size}"));
            }
            Some(Segmentation::IntervalList(list)) => {
                cmd.push_str(&format!(" -interval_list {{{}}}", list.iter().join(" ")));
            }
            Some(Segmentation::Toggles { count, signal }) => {
                let signal = match signal {
                    Some(signal) => signal,
                    None => {
                        let clock = self.clocks.first().ok_or_else(|| {
                            PowerError::Config(
                                "num_toggles requires a toggle_signal or a declared clock port"
                                    .to_string(),
                            )
                        })?;
                        log::warn!(
                            "Unspecified toggle_signal for num_toggles, using {clock} signal"
                        );
                        clock.clone()
                    }
                };
                cmd.push_str(&format!(" -cycles {count} {signal}"));
            }
            Some(Segmentation::FrameCount(count)) => {
                cmd.push_str(&format!(" -frame_count {count}"));
            }
            None => (),
        }
        Ok(cmd)
    }

    fn resolve_stem(&self, req: &ReportRequest) -> PathBuf {
        let stem = PathBuf::from(req.stem());
        if stem.is_absolute() {
            stem
        } else {
            self.reports_dir.join(stem)
        }
    }

    pub fn build_commands(
        &mut self,
        req: &ReportRequest,
    ) -> std::result::Result<CommandConfig, PowerError> {
        let formats = req.formats();
        let wants = |group: &[OutputFormat]| {
            formats.contains(&OutputFormat::All) || group.iter().any(|f| formats.contains(f))
        };
        let time_based = req.segmentation().is_some();

        // Checked before registration so a rejected request never claims an alias.
        if !time_based
            && wants(&[
                OutputFormat::Profile,
                OutputFormat::PlotProfile,
                OutputFormat::WriteProfile,
            ])
        {
            return Err(PowerError::Config(format!(
                "profile output for {:?} requires interval_size, interval_list, num_toggles or frame_count (frame-based analysis)",
                req.waveform_path
            )));
        }

        let load = self.load_command(req)?;
        let (alias, new_stim) = self.register_stimulus(&load);
        let (read_stim_cmd, compute_power_cmd) = if new_stim {
            let mode = if time_based { "time_based" } else { "average" };
            (
                Some(format!("{load} -alias {alias} -append")),
                Some(format!("compute_power -mode {mode} -stim {alias} -append")),
            )
        } else {
            (None, None)
        };

        let report_stem = self.resolve_stem(req);
        let stem = report_stem.display().to_string();
        let frame_info_cmd = format!("dump_frame_info {alias} {stem}");

        let report_cmds = self.report_commands(req, alias, &report_stem, wants);

        Ok(CommandConfig {
            alias,
            report_stem,
            segmentation: req.segmentation(),
            read_stim_cmd,
            compute_power_cmd,
            frame_info_cmd,
            report_cmds,
        })
    }

    fn report_commands(
        &self,
        req: &ReportRequest,
        alias: StimAlias,
        stem: &Path,
        wants: impl Fn(&[OutputFormat]) -> bool,
    ) -> Vec<ReportCommand> {
        let stims = format!("-stims {alias}");
        let inst = opt_flag("-inst", req.inst.as_deref());
        let root = opt_flag("-root", req.inst.as_deref());
        let module = opt_flag("-module", req.module.as_deref());
        let levels = opt_flag("-levels", req.levels.as_deref());
        let h_levels = opt_flag("-levels", Some(req.levels.as_deref().unwrap_or("all")));
        let types = opt_flag("-types", Some(req.power_type.as_deref().unwrap_or("total")));
        let tcl_args = req.tcl_args.as_deref().unwrap_or_default();

        let out = |kind: ReportKind, path: PathBuf, redirect: bool, args: &[&str]| {
            let flag = if redirect { ">" } else { "-out" };
            let target = path.display().to_string();
            let text = join_args(args.iter().copied().chain([flag, target.as_str()]));
            ReportCommand {
                kind,
                text,
                output: Some(path),
            }
        };

        let mut cmds = Vec::new();
        if wants(&[OutputFormat::Report]) {
            cmds.push(out(
                ReportKind::PowerReport,
                paths::out_power_rpt(stem),
                false,
                &["report_power", &stims, &inst, &module, &levels, "-unit mW", tcl_args],
            ));
            cmds.push(out(
                ReportKind::HierPowerReport,
                paths::out_hier_power_rpt(stem),
                false,
                &[
                    "report_power",
                    &stims,
                    &inst,
                    &module,
                    "-by_hierarchy",
                    &h_levels,
                    "-unit mW",
                    tcl_args,
                ],
            ));
        }
        if wants(&[OutputFormat::Activity]) {
            cmds.push(out(
                ReportKind::Activity,
                paths::out_activity_rpt(stem),
                false,
                &["report_activity", &stims, &inst, &module, &levels, tcl_args],
            ));
            cmds.push(out(
                ReportKind::HierActivity,
                paths::out_hier_activity_rpt(stem),
                false,
                &["report_activity", &stims, "-by_hierarchy", &levels, tcl_args],
            ));
        }
        if wants(&[OutputFormat::Ppa]) {
            cmds.push(out(
                ReportKind::Ppa,
                paths::out_ppa_rpt(stem),
                true,
                &["report_ppa", &root, &module, tcl_args],
            ));
        }
        if wants(&[OutputFormat::Area]) {
            cmds.push(out(
                ReportKind::Area,
                paths::out_area_rpt(stem),
                true,
                &["report_area"],
            ));
        }
        if wants(&[OutputFormat::PlotProfile, OutputFormat::Profile]) {
            cmds.push(out(
                ReportKind::PlotProfile,
                paths::out_profile_png(stem),
                false,
                &[
                    "plot_power_profile",
                    &stims,
                    &inst,
                    &module,
                    &levels,
                    "-by_category {total}",
                    &types,
                    "-unit mW -format png",
                    tcl_args,
                ],
            ));
        }
        if wants(&[OutputFormat::WriteProfile, OutputFormat::Profile]) {
            cmds.push(out(
                ReportKind::WriteProfile,
                paths::out_profile(stem),
                false,
                &[
                    "write_power_profile",
                    &stims,
                    &root,
                    &levels,
                    "-unit mW -format fsdb",
                    tcl_args,
                ],
            ));
        }
        if let Some(tcl_cmd) = &req.tcl_cmd {
            cmds.push(ReportCommand {
                kind: ReportKind::Custom,
                text: join_args([tcl_cmd.as_str(), &stims, tcl_args]),
                output: None,
            });
        }
        cmds
    }

    /// Builds commands for every request. Rejected requests are logged and
    /// recorded in [`Synthesis::failures`]; the others are still processed.
    pub fn synthesize(&mut self, requests: &[ReportRequest]) -> Synthesis {
        let mut synthesis = Synthesis::default();
        for (i, req) in requests.iter().enumerate() {
            match self.build_commands(req) {
                Ok(cfg) => synthesis.configs.push(cfg),
                Err(e) => {
                    log::error!("Report request {i} ({:?}) failed: {e}", req.waveform_path);
                    synthesis.failures.push((i, e));
                }
            }
        }
        synthesis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use crate::units::TimeValue;

    fn config() -> PowerConfig {
        PowerConfig {
            run_dir: PathBuf::from("/run"),
            top_module: "Top".to_string(),
            tb_name: "TestDriver".to_string(),
            tb_dut: "testHarness.dut".to_string(),
            clocks: vec!["clock".to_string()],
            waveforms: Vec::new(),
            saifs: Vec::new(),
            report_configs: Vec::new(),
            max_threads: 1,
            joules_bin: "joules".to_string(),
            export: ExportFormat::Csv,
            compress: false,
        }
    }

    fn synth() -> CommandSynthesizer {
        CommandSynthesizer::with_cwd(&config(), "/work")
    }

    #[test]
    fn test_default_request() {
        let mut s = synth();
        let cfg = s
            .build_commands(&ReportRequest::for_waveform("waves/top.fsdb"))
            .unwrap();

        assert_eq!(
            cfg.read_stim_cmd.as_deref(),
            Some("read_stimulus -file /work/waves/top.fsdb -dut_instance TestDriver/testHarness/dut -alias stim0 -append")
        );
        assert_eq!(
            cfg.compute_power_cmd.as_deref(),
            Some("compute_power -mode average -stim stim0 -append")
        );
        assert_eq!(cfg.frame_info_cmd, "dump_frame_info stim0 /run/reports/top.fsdb");
        assert_eq!(cfg.report_cmds.len(), 2);
        assert_eq!(
            cfg.report_cmds[0].text,
            "report_power -stims stim0 -unit mW -out /run/reports/top.fsdb.power.rpt"
        );
        assert_eq!(
            cfg.report_cmds[1].text,
            "report_power -stims stim0 -by_hierarchy -levels all -unit mW -out /run/reports/top.fsdb.hier.power.rpt"
        );
        assert_eq!(
            cfg.report_cmds[1].output,
            Some(PathBuf::from("/run/reports/top.fsdb.hier.power.rpt"))
        );
        assert_eq!(cfg.commands().count(), 5);
    }

    #[test]
    fn test_dedup_across_requests() {
        let mut s = synth();
        let a = ReportRequest::for_waveform("top.fsdb");
        let b = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .inst("core")
            .report_stem("core")
            .output_formats(vec![OutputFormat::Ppa])
            .build()
            .unwrap();
        let synthesis = s.synthesize(&[a, b]);

        assert!(synthesis.is_success());
        let loads = synthesis
            .configs
            .iter()
            .filter(|cfg| cfg.read_stim_cmd.is_some())
            .count();
        let computes = synthesis
            .configs
            .iter()
            .filter(|cfg| cfg.compute_power_cmd.is_some())
            .count();
        assert_eq!(loads, 1);
        assert_eq!(computes, 1);
        assert_eq!(synthesis.configs[0].alias, synthesis.configs[1].alias);
        // Frame metadata is dumped for every request, reused stimulus or not.
        assert_eq!(
            synthesis.configs[1].frame_info_cmd,
            "dump_frame_info stim0 /run/reports/core"
        );
        assert_eq!(
            synthesis.configs[1].report_cmds[0].text,
            "report_ppa -root core > /run/reports/core.ppa.rpt"
        );
        assert_eq!(s.registry().len(), 1);
    }

    #[test]
    fn test_distinct_windows() {
        let mut s = synth();
        let a = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .start_time("0ns".parse().unwrap())
            .build()
            .unwrap();
        let b = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .start_time("10ns".parse().unwrap())
            .end_time("1us".parse().unwrap())
            .build()
            .unwrap();
        let synthesis = s.synthesize(&[a, b]);
        assert_eq!(synthesis.configs[0].alias.index(), 0);
        assert_eq!(synthesis.configs[1].alias.index(), 1);
        assert!(synthesis.configs[1]
            .read_stim_cmd
            .as_deref()
            .unwrap()
            .contains("-start 10ns -end 1000ns -alias stim1"));
    }

    #[test]
    fn test_segmentation_priority() {
        let mut s = synth();
        let req = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .interval_size("100ns".parse().unwrap())
            .num_toggles(8)
            .toggle_signal("clk")
            .build()
            .unwrap();
        let cfg = s.build_commands(&req).unwrap();
        let load = cfg.read_stim_cmd.unwrap();
        assert!(load.contains("-interval_size 100ns"));
        assert!(!load.contains("-cycles"));
        assert_eq!(
            cfg.compute_power_cmd.as_deref(),
            Some("compute_power -mode time_based -stim stim0 -append")
        );
    }

    #[test]
    fn test_segmentation_clauses() {
        let mut s = synth();
        let toggles = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .num_toggles(8)
            .build()
            .unwrap();
        assert!(s
            .load_command(&toggles)
            .unwrap()
            .ends_with("-cycles 8 clock"));

        let list = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .interval_list(vec![TimeValue::from_ns(0.0), TimeValue::from_ns(50.0)])
            .build()
            .unwrap();
        assert!(s
            .load_command(&list)
            .unwrap()
            .ends_with("-interval_list {0ns 50ns}"));

        let frames = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .frame_count(16)
            .build()
            .unwrap();
        assert!(s
            .load_command(&frames)
            .unwrap()
            .ends_with("-frame_count 16"));
    }

    #[test]
    fn test_toggles_without_clock() {
        let mut cfg = config();
        cfg.clocks.clear();
        let mut s = CommandSynthesizer::with_cwd(&cfg, "/work");
        let req = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .num_toggles(8)
            .build()
            .unwrap();
        assert!(matches!(
            s.build_commands(&req),
            Err(PowerError::Config(_))
        ));
    }

    #[test]
    fn test_profile_requires_segmentation() {
        let mut s = synth();
        let bad = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .output_formats(vec![OutputFormat::Profile])
            .build()
            .unwrap();
        let good = ReportRequest::for_waveform("top.fsdb");
        let synthesis = s.synthesize(&[bad, good]);

        assert!(!synthesis.is_success());
        assert_eq!(synthesis.failures.len(), 1);
        assert_eq!(synthesis.failures[0].0, 0);
        assert!(matches!(synthesis.failures[0].1, PowerError::Config(_)));
        assert_eq!(synthesis.configs.len(), 1);
        assert!(synthesis
            .configs
            .iter()
            .flat_map(|cfg| cfg.report_cmds.iter())
            .all(|cmd| !matches!(
                cmd.kind,
                ReportKind::PlotProfile | ReportKind::WriteProfile
            )));
        // The rejected request did not consume an alias.
        assert_eq!(synthesis.configs[0].alias.index(), 0);
        assert!(synthesis.configs[0].read_stim_cmd.is_some());
    }

    #[test]
    fn test_all_formats() {
        let mut s = synth();
        let req = ReportRequest::builder()
            .waveform_path("top.fsdb")
            .frame_count(4)
            .inst("core")
            .levels("2")
            .power_type("dynamic")
            .report_stem("/abs/top")
            .output_formats(vec![OutputFormat::All])
            .tcl_cmd("report_sdb_annotation")
            .build()
            .unwrap();
        let cfg = s.build_commands(&req).unwrap();
        let kinds: Vec<_> = cfg.report_cmds.iter().map(|cmd| cmd.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReportKind::PowerReport,
                ReportKind::HierPowerReport,
                ReportKind::Activity,
                ReportKind::HierActivity,
                ReportKind::Ppa,
                ReportKind::Area,
                ReportKind::PlotProfile,
                ReportKind::WriteProfile,
                ReportKind::Custom,
            ]
        );
        assert_eq!(cfg.report_stem, PathBuf::from("/abs/top"));
        assert_eq!(
            cfg.report_cmds[6].text,
            "plot_power_profile -stims stim0 -inst core -levels 2 -by_category {total} -types dynamic -unit mW -format png -out /abs/top.profile.png"
        );
        assert_eq!(
            cfg.report_cmds[7].text,
            "write_power_profile -stims stim0 -root core -levels 2 -unit mW -format fsdb -out /abs/top.profile"
        );
        assert_eq!(cfg.report_cmds[8].text, "report_sdb_annotation -stims stim0");
        assert_eq!(cfg.report_cmds[8].output, None);
    }
}
