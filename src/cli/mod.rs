use std::fs::canonicalize;
use std::path::Path;

use anyhow::bail;
use clap::Parser;

use crate::batch::{collect_reports, ExportOptions};
use crate::cli::args::{Args, Command, ParseArgs};
use crate::cli::progress::CollectProgress;
use crate::commands::{CommandSynthesizer, Synthesis};
use crate::config::{parse_power_config, PowerConfig, Segmentation};
use crate::export::write_report;
use crate::parse::parse_report_file;
use crate::script::write_report_script;
use crate::Result;

pub mod args;
pub mod progress;

pub const BANNER: &str = "JOULES-POWER v0.1";

pub fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Script { config } => run_script(&config),
        Command::Collect { config } => run_collect(&config),
        Command::Parse(args) => run_parse(&args),
    }
}

fn synthesize(config_path: &Path) -> Result<(PowerConfig, Synthesis)> {
    let config_path = canonicalize(config_path)?;

    println!("{BANNER}\n");
    println!("Configuration file: {:?}", &config_path);
    let config = parse_power_config(&config_path)?;

    println!("Power analysis parameters:");
    println!("\tDUT instance: {}", config.dut_instance());
    println!("\tClocks: {}", config.clocks.join(", "));
    println!("\tWaveforms: {}", config.waveforms.len());
    println!("\tSAIF files: {}", config.saifs.len());
    println!("\tThreads: {}\n", config.max_threads);

    let mut synth = CommandSynthesizer::new(&config)?;
    let synthesis = synth.synthesize(&config.report_requests());
    Ok((config, synthesis))
}

fn run_script(config_path: &Path) -> Result<()> {
    let (config, synthesis) = synthesize(config_path)?;
    let path = write_report_script(&config, &synthesis)?;
    println!("Script saved to: {:?}", &path);

    if !synthesis.is_success() {
        for (idx, err) in synthesis.failures.iter() {
            println!("\tRequest {idx}: {err}");
        }
        bail!(
            "{} of {} report requests were rejected",
            synthesis.failures.len(),
            synthesis.failures.len() + synthesis.configs.len()
        );
    }
    Ok(())
}

fn run_collect(config_path: &Path) -> Result<()> {
    let (config, synthesis) = synthesize(config_path)?;
    let options = ExportOptions {
        format: config.export,
        compress: config.compress,
    };

    let total = synthesis
        .configs
        .iter()
        .flat_map(|cfg| cfg.report_cmds.iter())
        .filter(|cmd| cmd.output.is_some())
        .count();
    let mut progress = CollectProgress::new(total);
    let summary = collect_reports(&synthesis.configs, &options, &mut progress);
    progress.done(&summary);

    Ok(())
}

fn run_parse(args: &ParseArgs) -> Result<()> {
    let format = args.report_format();
    let segmentation = args.interval.map(Segmentation::IntervalSize);

    let report = parse_report_file(format, &args.report, segmentation.as_ref())?;
    if report.is_empty() {
        println!("No data in {:?}", &args.report);
        return Ok(());
    }

    let dest = args.destination();
    write_report(&report, &dest, args.export_format(), !args.no_compress)?;
    println!("Parsed {format} report saved to: {:?}", &dest);

    Ok(())
}
