use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;
use crate::parse::ReportFormat;
use crate::units::TimeValue;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write the Joules report-power script for a configuration.
    Script {
        /// Path to TOML configuration file.
        #[arg(short, long, default_value = "power.toml")]
        config: PathBuf,
    },
    /// Parse and export every report the configured script writes.
    Collect {
        /// Path to TOML configuration file.
        #[arg(short, long, default_value = "power.toml")]
        config: PathBuf,
    },
    /// Parse a single report file.
    Parse(ParseArgs),
}

#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// Report file to parse.
    pub report: PathBuf,

    /// Report format. Guessed from the file name when omitted.
    #[arg(short, long, value_enum)]
    pub kind: Option<ReportFormat>,

    /// Write JSON instead of CSV.
    #[arg(long)]
    pub json: bool,

    /// Write plain text instead of gzip.
    #[arg(long)]
    pub no_compress: bool,

    /// Frame width used when a profile has no frame timing files, e.g. `10ns`.
    #[arg(long)]
    pub interval: Option<TimeValue>,

    /// Output file. Defaults to `parsed/<kind>.<ext>[.gz]`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ParseArgs {
    pub fn report_format(&self) -> ReportFormat {
        self.kind
            .unwrap_or_else(|| ReportFormat::infer_from_path(&self.report))
    }

    pub fn export_format(&self) -> ExportFormat {
        if self.json {
            ExportFormat::Json
        } else {
            ExportFormat::Csv
        }
    }

    pub fn destination(&self) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let gz = if self.no_compress { "" } else { ".gz" };
        PathBuf::from("parsed").join(format!(
            "{}.{}{gz}",
            self.report_format(),
            self.export_format().extension()
        ))
    }
}
