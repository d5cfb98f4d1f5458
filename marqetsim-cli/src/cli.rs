//! Application definition.

#![allow(unused)]

extern crate simplelog;

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;

use marqetsim::summary::{Aggregate, SummaryReport};
use marqetsim::{run, ExperimentConfig, Settings};

use crate::exec::CommandEngine;
use crate::util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &'static str = env!("CARGO_PKG_AUTHORS");

/// Width of the longest frequency bar in summary output.
const FREQ_BAR_WIDTH: usize = 40;

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("marqetsim")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .version(VERSION)
        .author(AUTHORS)
        .about(
            "Launch and summarize market-simulation experiments \
             from the command line.",
        )
        .arg(
            Arg::with_name("verbosity")
                .long("verbosity")
                .short("v")
                .takes_value(true)
                .default_value("info")
                .value_name("verb")
                .global(true)
                .help("Set the verbosity of the log output"),
        )
        // launch subcommand
        .subcommand(
            SubCommand::with_name("launch")
                .display_order(10)
                .about("Run all variants of an experiment from a manifest file")
                .arg(
                    Arg::with_name("path")
                        .required(true)
                        .value_name("manifest-path")
                        .help("Path to the experiment manifest (yaml or toml)"),
                )
                .arg(
                    Arg::with_name("out-dir")
                        .long("out-dir")
                        .short("o")
                        .takes_value(true)
                        .value_name("path")
                        .help("Write result files here instead of the manifest's output_dir"),
                ),
        )
        // summarize subcommand
        .subcommand(
            SubCommand::with_name("summarize")
                .display_order(20)
                .about("Aggregate result files into a summary report")
                .arg(
                    Arg::with_name("paths")
                        .required(true)
                        .multiple(true)
                        .value_name("result-path")
                        .help("Result csv files, or directories containing them"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("path")
                        .default_value("summary.yaml")
                        .help("Where to write the summary report"),
                ),
        )
}

pub fn init() -> ArgMatches<'static> {
    app().get_matches()
}

/// Runs based on specified subcommand.
pub fn start(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("launch", Some(m)) => start_launch(m),
        ("summarize", Some(m)) => start_summarize(m),
        _ => Ok(()),
    }
}

fn start_launch(matches: &ArgMatches) -> Result<()> {
    setup_log_verbosity(matches);

    let path = resolve_path(matches.value_of("path"))?;
    let mut config = ExperimentConfig::from_path(path)?;
    if let Some(out_dir) = matches.value_of("out-dir") {
        config.output_dir = PathBuf::from(out_dir);
    }

    let settings = Settings::discover(config.dir())?;
    let mut engine = CommandEngine::from_settings(&settings)?;

    info!(
        "launching experiment \"{}\" with {} variants",
        config.name,
        config.agents.len()
    );
    let report = run::run_batch(&config, &mut engine, &settings)?;

    print!("{}", report);
    if report.has_failures() {
        println!(
            "{}{} of {} variants failed",
            "warning: ".yellow(),
            report.failed(),
            report.outcomes.len()
        );
    }
    Ok(())
}

fn start_summarize(matches: &ArgMatches) -> Result<()> {
    setup_log_verbosity(matches);

    let inputs = matches
        .values_of("paths")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_else(Vec::new);
    let paths = util::collect_result_paths(inputs)?;
    info!("summarizing {} result files", paths.len());

    let report = SummaryReport::from_paths(&paths)?;
    print_summary(&report);

    let output = PathBuf::from(matches.value_of("output").unwrap_or("summary.yaml"));
    report.write(&output)?;
    println!("Summary saved to {}", output.to_string_lossy());
    Ok(())
}

/// Prints per-column aggregates, frequency tables as proportional bars.
fn print_summary(report: &SummaryReport) {
    println!(
        "{} rows across {} result files",
        report.rows,
        report.inputs.len()
    );
    for (column, aggregate) in &report.columns {
        println!("\n{}", column.as_str().bold());
        match aggregate {
            Aggregate::Mean {
                mean,
                present,
                missing,
            } => {
                println!("   mean {:.4} ({} values, {} missing)", mean, present, missing);
            }
            Aggregate::Freq { counts, missing } => {
                let max_count = counts.values().max().cloned().unwrap_or(0);
                for (label, count) in counts {
                    let bar_len = match max_count {
                        0 => 0,
                        m => count * FREQ_BAR_WIDTH / m,
                    };
                    let bar = "\u{2588}".repeat(bar_len);
                    println!("   {:<24} {:>6} {}", label, count, bar.as_str().cyan());
                }
                if *missing > 0 {
                    println!("   {:<24} {:>6}", "(missing)", missing);
                }
            }
        }
    }
    println!();
}

/// Resolves a user-supplied path against the working directory.
fn resolve_path(arg: Option<&str>) -> Result<PathBuf> {
    let mut path = env::current_dir()?;
    if let Some(p_str) = arg {
        let p = PathBuf::from(p_str);
        if p.is_relative() {
            path = path.join(p);
        } else {
            path = p;
        }
    }
    Ok(path)
}

fn setup_log_verbosity(matches: &ArgMatches) {
    use self::simplelog::{LevelFilter, TermLogger};
    let level_filter = match matches.value_of("verbosity") {
        Some(s) => match s {
            "0" | "none" => LevelFilter::Off,
            "1" | "err" | "error" | "min" => LevelFilter::Error,
            "2" | "warn" | "warning" => LevelFilter::Warn,
            "3" | "info" | "default" => LevelFilter::Info,
            "4" | "debug" => LevelFilter::Debug,
            "5" | "trace" | "max" | "all" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        },
        _ => LevelFilter::Info,
    };
    let mut config_builder = simplelog::ConfigBuilder::new();
    let logger_conf = config_builder
        .set_time_level(LevelFilter::Error)
        .set_target_level(LevelFilter::Debug)
        .set_location_level(LevelFilter::Error)
        .set_time_format_str("%H:%M:%S%.6f")
        .build();
    TermLogger::init(level_filter, logger_conf, simplelog::TerminalMode::Mixed);
}
