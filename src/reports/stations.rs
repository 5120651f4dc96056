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
//! Latency, throughput, and detection correctness of every station of the CDMA simulation.
use std::path::PathBuf;

use crate::{
    aggregate::{aggregate, summarize, Metric, SortPolicy},
    chart::{to_chart_spec, ChartKind, Figure, SeriesDef},
    dataset::{load, Sources},
    persist::persist,
    render::Renderer,
    util::{parent_dir, PathBufExt},
    Error, Result,
};

use super::{Outcome, ReportArgs};

pub const STATION: &str = "stationId";
pub const LATENCY: &str = "latency_ms";
pub const THROUGHPUT: &str = "throughput_bps";
pub const CORRECTNESS: &str = "correctness";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub summary: PathBuf,
    pub histogram: PathBuf,
    pub bins: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("Assignments/Assignment4/raw_results.csv", None)
    }
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let input = input.into();
        let output_dir = output_dir.unwrap_or_else(|| parent_dir(&input));
        Self {
            summary: output_dir.clone().then("performance_metrics.csv"),
            histogram: output_dir.then("detection_histogram.png"),
            input,
            bins: 10,
        }
    }

    pub fn from_args(args: &ReportArgs) -> Self {
        let input = args.input.clone().unwrap_or_else(|| Self::default().input);
        Self::new(input, args.output_dir.clone())
    }
}

fn overview(stations: usize, averages: &[(String, Option<f64>)]) -> String {
    let avg = |i: usize| averages.get(i).and_then(|(_, v)| *v).unwrap_or(f64::NAN);
    format!(
        "Stations: {stations}  Avg latency: {:.2} ms  Throughput: {:.2} bps  Correctness: {:.3}",
        avg(0),
        avg(1),
        avg(2)
    )
}

pub fn run(config: &Config, renderer: &dyn Renderer) -> Result<Outcome> {
    if !config.input.exists() {
        return Err(Error::MissingInput(config.input.clone()));
    }
    let dataset = load(
        Sources::File(config.input.clone()),
        &[STATION, LATENCY, THROUGHPUT, CORRECTNESS],
    )?;
    let metrics = [LATENCY, THROUGHPUT, CORRECTNESS].map(Metric::mean);

    let averages = summarize(&dataset, &metrics)?;
    let summary = aggregate(&dataset, STATION, &metrics)?.sorted(&SortPolicy::Ascending);

    let histogram = to_chart_spec(
        &summary,
        ChartKind::Histogram,
        &[SeriesDef::new(CORRECTNESS, "Detection correctness")],
    )?
    .title("Per-station detection histogram")
    .y_label("Stations")
    .bins(config.bins);

    persist(&summary, &config.summary)?;
    let histogram = renderer.render(&Figure::from(histogram), &config.histogram)?;

    Ok(Outcome {
        analysis: Some(overview(dataset.len(), &averages)),
        summary,
        written: vec![config.summary.clone(), histogram],
    })
}
