use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::batch::{BatchObserver, BatchSummary, FileOutcome, FileResult};
use crate::parse::ReportFormat;

#[derive(PartialEq, Eq)]
pub enum FileStatus {
    InProgress,
    Done,
    Empty,
    Skipped,
    Failed,
}

impl From<&FileOutcome> for FileStatus {
    fn from(outcome: &FileOutcome) -> Self {
        match outcome {
            FileOutcome::Exported(_) => Self::Done,
            FileOutcome::Empty => Self::Empty,
            FileOutcome::Skipped(_) => Self::Skipped,
            FileOutcome::Failed(_) => Self::Failed,
        }
    }
}

/// One spinner line per report file.
pub struct CollectProgress {
    mp: MultiProgress,
    total: usize,
    counter: usize,
    current: Option<ProgressBar>,
}

impl CollectProgress {
    pub fn new(total: usize) -> Self {
        println!("Reports:");
        Self {
            mp: MultiProgress::new(),
            total,
            counter: 0,
            current: None,
        }
    }

    pub fn done(&self, summary: &BatchSummary) {
        println!(
            "\n\nExported {}, empty {}, skipped {}, failed {}",
            summary.exported(),
            summary.empty(),
            summary.skipped(),
            summary.failed()
        );
    }
}

fn format_template(spinner: bool, status: impl Display) -> String {
    if spinner {
        format!("{{spinner:.green}} {:16} {{msg}}", status)
    } else {
        format!("  {:16} {{msg}}", status)
    }
}

fn set_status(bar: &ProgressBar, status: FileStatus) {
    let template = match status {
        FileStatus::InProgress => format_template(true, "In Progress".bright_white().bold()),
        FileStatus::Done => format_template(false, "Done".green().bold()),
        FileStatus::Empty => format_template(false, "Empty".truecolor(120, 120, 120).bold()),
        FileStatus::Skipped => format_template(false, "Skipped".yellow().bold()),
        FileStatus::Failed => format_template(false, "Failed".bright_white().on_red().bold()),
    };
    let style = ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);

    if status == FileStatus::InProgress {
        bar.enable_steady_tick(Duration::from_millis(200));
    } else {
        bar.finish();
    }
}

impl BatchObserver for CollectProgress {
    fn started(&mut self, report: &Path, format: Option<ReportFormat>) {
        self.counter += 1;
        let width = format!("{}", self.total).len();
        let bar = self.mp.add(ProgressBar::new_spinner());
        let parser = format.map(|f| f.to_string()).unwrap_or_else(|| "-".to_string());
        bar.set_message(format!(
            "[{:width$}/{:width$}] {:8} {}",
            self.counter,
            self.total,
            parser,
            report.display()
        ));
        set_status(&bar, FileStatus::InProgress);
        self.current = Some(bar);
    }

    fn finished(&mut self, result: &FileResult) {
        if let Some(bar) = self.current.take() {
            set_status(&bar, FileStatus::from(&result.outcome));
        }
    }
}
