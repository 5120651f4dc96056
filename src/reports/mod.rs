// LABSTATS: Aggregation and Reporting of Network Lab Simulation Results
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! The concrete reports, one per simulation type, and their shared command line interface.
use std::{
    io::{self, Write},
    path::PathBuf,
    process,
};

use clap::{Args, Parser, ValueEnum};
use serde::Serialize;

use crate::{
    aggregate::SummaryTable,
    render::{renderer, OutputFormat, Renderer},
    util, Result,
};

pub mod arq;
pub mod csma;
pub mod detection;
pub mod stations;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Report {
    /// Detection rate per error type and detection scheme.
    Detection,
    /// Average acknowledgement time per ARQ scheme and success probability.
    Arq,
    /// Throughput, delay, efficiency, and collisions of p-persistent CSMA-CD.
    Csma,
    /// Latency, throughput, and correctness per station.
    Stations,
}

/// Arguments common to all reports.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Input file (or data directory for reports reading one file per parameter). Uses the
    /// default lab layout if omitted.
    pub input: Option<PathBuf>,
    /// Overwrite the output directory. Defaults to the directory of the input.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Format of the generated charts.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct SingleReport {
    #[command(flatten)]
    args: ReportArgs,
}

/// Everything a report produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub summary: SummaryTable,
    /// All files written, summary table first.
    pub written: Vec<PathBuf>,
    /// Human-readable analysis to print to the terminal.
    pub analysis: Option<String>,
}

/// Run `report` with the given arguments.
pub fn run(report: Report, args: &ReportArgs) -> Result<Outcome> {
    let renderer = renderer(args.format);
    run_with(report, args, renderer.as_ref())
}

pub fn run_with(report: Report, args: &ReportArgs, renderer: &dyn Renderer) -> Result<Outcome> {
    log::info!("Generating the {report} report");
    match report {
        Report::Detection => detection::run(&detection::Config::from_args(args), renderer),
        Report::Arq => arq::run(&arq::Config::from_args(args), renderer),
        Report::Csma => csma::run(&csma::Config::from_args(args), renderer),
        Report::Stations => stations::run(&stations::Config::from_args(args), renderer),
    }
}

/// Write the analysis and the generated files to `out`, or the error to `err`. Returns whether
/// the report succeeded.
pub fn print_outcome(result: &Result<Outcome>, out: &mut impl Write, err: &mut impl Write) -> io::Result<bool> {
    match result {
        Ok(outcome) => {
            if let Some(analysis) = &outcome.analysis {
                writeln!(out, "{analysis}")?;
            }
            for path in &outcome.written {
                writeln!(out, "Generated {}", path.display())?;
            }
            Ok(true)
        }
        Err(e) => {
            log::error!("{e}");
            // printed regardless of the log level
            writeln!(err, "Error: {e}")?;
            Ok(false)
        }
    }
}

/// Print the outcome of a report, exiting with status 1 if it failed.
pub fn finish(result: Result<Outcome>) {
    match print_outcome(&result, &mut io::stdout(), &mut io::stderr()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            log::error!("Cannot print the report: {e}");
            process::exit(1)
        }
    }
}

/// Entry point of the standalone report binaries.
pub fn cli_main(report: Report) {
    util::init_logging();
    let SingleReport { args } = SingleReport::parse();
    finish(run(report, &args));
}
