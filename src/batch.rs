//! Parses and exports every report a synthesized script produces.
//!
//! Files are handled independently: one bad report is logged and recorded,
//! and the rest of the batch carries on.

use std::path::{Path, PathBuf};

use crate::commands::{CommandConfig, ReportCommand, ReportKind};
use crate::config::Segmentation;
use crate::error::PowerError;
use crate::export::{self, ExportFormat};
use crate::parse::{self, ReportFormat};
use crate::paths;
use crate::Result;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub compress: bool,
}

#[derive(Debug)]
pub enum FileOutcome {
    /// Parsed and written to the given path.
    Exported(PathBuf),
    /// The report parsed to no data; nothing was written.
    Empty,
    /// Not attempted: the file is missing or has no parser.
    Skipped(PowerError),
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct FileResult {
    pub report: PathBuf,
    pub format: Option<ReportFormat>,
    pub outcome: FileOutcome,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub files: Vec<FileResult>,
}

impl BatchSummary {
    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }

    pub fn exported(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Exported(_)))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Empty))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }
}

/// Progress hooks for [`collect_reports`].
pub trait BatchObserver {
    fn started(&mut self, _report: &Path, _format: Option<ReportFormat>) {}
    fn finished(&mut self, _result: &FileResult) {}
}

impl BatchObserver for () {}

/// The file a report command leaves for the parsers, if any.
fn parsed_input(cmd: &ReportCommand) -> Option<PathBuf> {
    let output = cmd.output.as_ref()?;
    Some(match cmd.kind {
        ReportKind::WriteProfile => paths::profile_data(output),
        _ => output.clone(),
    })
}

fn parse_and_export(
    report: &Path,
    format: ReportFormat,
    segmentation: Option<&Segmentation>,
    options: &ExportOptions,
) -> Result<Option<PathBuf>> {
    let parsed = parse::parse_report_file(format, report, segmentation)?;
    if parsed.is_empty() {
        return Ok(None);
    }
    let dest = paths::out_parsed(report, options.format.extension(), options.compress);
    export::write_report(&parsed, &dest, options.format, options.compress)?;
    Ok(Some(dest))
}

fn collect_one(
    report: PathBuf,
    kind: ReportKind,
    segmentation: Option<&Segmentation>,
    options: &ExportOptions,
) -> FileResult {
    let format = ReportFormat::for_kind(kind);

    let outcome = if !report.exists() {
        log::warn!("Output file {report:?} does not exist");
        FileOutcome::Skipped(PowerError::MissingOutput(report.clone()))
    } else if let Some(format) = format {
        match parse_and_export(&report, format, segmentation, options) {
            Ok(Some(dest)) => {
                log::info!("Parsed {report:?} into {dest:?}");
                FileOutcome::Exported(dest)
            }
            Ok(None) => {
                log::info!("No data in {report:?}");
                FileOutcome::Empty
            }
            Err(e) => {
                log::warn!("Error with {format} parser on output file {report:?}: {e:#}");
                FileOutcome::Failed(e)
            }
        }
    } else {
        log::warn!("No method to parse {kind:?} output {report:?}");
        FileOutcome::Skipped(PowerError::UnsupportedReport(report.clone()))
    };

    FileResult {
        report,
        format,
        outcome,
    }
}

/// Parses and exports the outputs of every report command in `configs`.
pub fn collect_reports(
    configs: &[CommandConfig],
    options: &ExportOptions,
    observer: &mut impl BatchObserver,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for cfg in configs {
        for cmd in cfg.report_cmds.iter() {
            let Some(report) = parsed_input(cmd) else {
                continue;
            };
            let format = ReportFormat::for_kind(cmd.kind);
            observer.started(&report, format);
            let result = collect_one(report, cmd.kind, cfg.segmentation.as_ref(), options);
            observer.finished(&result);
            summary.files.push(result);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use lazy_static::lazy_static;
    use log::{Level, LevelFilter, Metadata, Record};

    use super::*;
    use crate::stimulus::StimulusRegistry;

    lazy_static! {
        static ref LOG_RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
    }

    struct LogRecorder;

    impl log::Log for LogRecorder {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            if let Ok(mut records) = LOG_RECORDS.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: LogRecorder = LogRecorder;

    /// Log records whose message mentions `path`.
    fn logs_for(path: &Path) -> Vec<(Level, String)> {
        let needle = format!("{path:?}");
        LOG_RECORDS
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, msg)| msg.contains(&needle))
            .cloned()
            .collect()
    }

    const POWER_REPORT: &str = "
    register     1.0e-03  4.2e-02  5.2e-03  4.9e-02   23.05%
       logic     2.5e-03  1.1e-01  4.6e-02  1.6e-01   76.95%
    Subtotal     3.5e-03  1.5e-01  5.1e-02  2.1e-01  100.00%
";

    fn report_cmd(kind: ReportKind, output: PathBuf) -> ReportCommand {
        ReportCommand {
            kind,
            text: String::new(),
            output: Some(output),
        }
    }

    fn config(report_cmds: Vec<ReportCommand>, segmentation: Option<Segmentation>) -> CommandConfig {
        let mut registry = StimulusRegistry::new();
        let (alias, _) = registry.register("read_stimulus -file top.vcd");
        CommandConfig {
            alias,
            report_stem: PathBuf::from("top"),
            segmentation,
            read_stim_cmd: None,
            compute_power_cmd: None,
            frame_info_cmd: String::new(),
            report_cmds,
        }
    }

    #[test]
    fn test_failure_isolation() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("a.power.rpt");
        let profile = dir.path().join("b.profile");
        let last = dir.path().join("c.power.rpt");
        std::fs::write(&first, POWER_REPORT)?;
        // Matrix row with a non-numeric value.
        std::fs::write(
            paths::profile_data(&profile),
            "# -xlabel Time (ns) -ylabel Power (mW) -ykeylabel top:total\n5 bogus\n",
        )?;
        std::fs::write(&last, POWER_REPORT)?;

        let cfg = config(
            vec![
                report_cmd(ReportKind::PowerReport, first.clone()),
                report_cmd(ReportKind::WriteProfile, profile),
                report_cmd(ReportKind::PowerReport, last.clone()),
            ],
            Some(Segmentation::FrameCount(4)),
        );
        let summary = collect_reports(&[cfg], &ExportOptions::default(), &mut ());

        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.exported(), 2);
        assert_eq!(summary.failed(), 1);
        assert!(matches!(summary.files[1].outcome, FileOutcome::Failed(_)));
        assert!(dir.path().join("parsed/a.power.rpt.csv").is_file());
        assert!(dir.path().join("parsed/c.power.rpt.csv").is_file());
        Ok(())
    }

    #[test]
    fn test_missing_and_unsupported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let area = dir.path().join("top.area.rpt");
        std::fs::write(&area, "area report")?;

        let mut cmds = vec![
            report_cmd(ReportKind::PowerReport, dir.path().join("missing.power.rpt")),
            report_cmd(ReportKind::Area, area),
        ];
        cmds.push(ReportCommand {
            kind: ReportKind::Custom,
            text: "report_foo".to_string(),
            output: None,
        });
        let summary = collect_reports(&[config(cmds, None)], &ExportOptions::default(), &mut ());

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.skipped(), 2);
        assert!(matches!(
            summary.files[0].outcome,
            FileOutcome::Skipped(PowerError::MissingOutput(_))
        ));
        assert!(matches!(
            summary.files[1].outcome,
            FileOutcome::Skipped(PowerError::UnsupportedReport(_))
        ));
        Ok(())
    }

    #[test]
    fn test_unsupported_kind_warns() -> Result<()> {
        // Other tests may have installed the logger already.
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);

        let dir = tempfile::tempdir()?;
        let area = dir.path().join("top.area.rpt");
        std::fs::write(&area, "area report")?;

        let cfg = config(vec![report_cmd(ReportKind::Area, area.clone())], None);
        let summary = collect_reports(&[cfg], &ExportOptions::default(), &mut ());
        assert_eq!(summary.skipped(), 1);

        let records = logs_for(&area);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, Level::Warn);
        assert!(records[0].1.contains("Area"));
        Ok(())
    }

    #[test]
    fn test_empty_profile_and_observer() -> Result<()> {
        #[derive(Default)]
        struct Recorder {
            started: Vec<PathBuf>,
            finished: usize,
        }

        impl BatchObserver for Recorder {
            fn started(&mut self, report: &Path, _format: Option<ReportFormat>) {
                self.started.push(report.to_owned());
            }
            fn finished(&mut self, _result: &FileResult) {
                self.finished += 1;
            }
        }

        let dir = tempfile::tempdir()?;
        let profile = dir.path().join("top.profile");
        std::fs::write(paths::profile_data(&profile), "")?;

        let cfg = config(
            vec![report_cmd(ReportKind::WriteProfile, profile.clone())],
            Some(Segmentation::FrameCount(4)),
        );
        let options = ExportOptions {
            format: ExportFormat::Json,
            compress: true,
        };
        let mut recorder = Recorder::default();
        let summary = collect_reports(&[cfg], &options, &mut recorder);

        assert_eq!(summary.empty(), 1);
        assert_eq!(recorder.started, vec![paths::profile_data(&profile)]);
        assert_eq!(recorder.finished, 1);
        assert!(!dir.path().join("parsed").exists());
        Ok(())
    }
}
