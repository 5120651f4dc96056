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
//! Performance of p-persistent CSMA-CD over the persistence probability `p`.
use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use crate::{
    aggregate::{aggregate, Extremum, GroupKey, Metric, SortPolicy, SummaryRow, SummaryTable},
    chart::{to_chart_spec, AxisBounds, ChartKind, ChartSpec, Figure, SeriesDef},
    dataset::{load, Dataset, Sources},
    persist::persist,
    render::Renderer,
    util::{parent_dir, PathBufExt},
    Error, Result,
};

use super::{Outcome, ReportArgs};

pub const P: &str = "p";
pub const THROUGHPUT: &str = "Throughput";
pub const DELAY: &str = "Average_Delay";
pub const EFFICIENCY: &str = "Efficiency";
pub const COLLISION_RATE: &str = "Collision_Rate";

const P_LABEL: &str = "Persistence Probability (p)";
const THROUGHPUT_LABEL: &str = "Throughput (bits/sec)";
const DELAY_LABEL: &str = "Average Forwarding Delay (ms)";

/// Where the simulation results come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// One pre-combined file with one row per `p`.
    Combined(PathBuf),
    /// One raw simulator output file per `p`, named `csma_cd_results_{p:.1}.csv`.
    PerRun { dir: PathBuf, probabilities: Vec<f64> },
}

impl Input {
    pub fn per_run(dir: impl Into<PathBuf>) -> Self {
        Self::PerRun {
            dir: dir.into(),
            probabilities: (1..=10).map(|i| i as f64 / 10.0).collect(),
        }
    }

    fn output_dir(&self) -> PathBuf {
        match self {
            Self::Combined(path) => parent_dir(path),
            Self::PerRun { dir, .. } => dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: Input,
    pub comparison: PathBuf,
    pub throughput_delay: PathBuf,
    pub summary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            Input::Combined("Assignments/Assignment3/combined_results.csv".into()),
            None,
        )
    }
}

impl Config {
    pub fn new(input: Input, output_dir: Option<PathBuf>) -> Self {
        let output_dir = output_dir.unwrap_or_else(|| input.output_dir());
        Self {
            comparison: output_dir.clone().then("performance_comparison.png"),
            throughput_delay: output_dir.clone().then("throughput_delay_analysis.png"),
            summary: output_dir.then("csma_summary.csv"),
            input,
        }
    }

    /// A directory as input selects the per-run files, anything else the combined file.
    pub fn from_args(args: &ReportArgs) -> Self {
        let input = match &args.input {
            Some(path) if path.is_dir() => Input::per_run(path),
            Some(path) => Input::Combined(path.clone()),
            None => Self::default().input,
        };
        Self::new(input, args.output_dir.clone())
    }
}

fn load_combined(path: &Path) -> Result<SummaryTable> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let dataset = load(
        Sources::File(path.to_path_buf()),
        &[P, THROUGHPUT, DELAY, EFFICIENCY, COLLISION_RATE],
    )?;
    log::info!("Loaded data for {} p values", dataset.len());
    aggregate(
        &dataset,
        P,
        &[THROUGHPUT, DELAY, EFFICIENCY, COLLISION_RATE].map(Metric::mean),
    )
}

fn load_per_run(dir: &Path, probabilities: &[f64]) -> Result<SummaryTable> {
    let pattern = dir.then("csma_cd_results_{}.csv");
    let sources = Sources::pattern(
        pattern.to_string_lossy(),
        P,
        probabilities.iter().map(|p| format!("{p:.1}")),
    );
    let dataset = load(
        sources,
        &["bitsSuccessful", "bitsAttempted", "throughputBps", "avgDelayMs"],
    )?;
    let metrics = [
        Metric::mean("throughputBps").named(THROUGHPUT),
        Metric::mean("avgDelayMs").named(DELAY),
        Metric::ratio("bitsSuccessful", "bitsAttempted").named(EFFICIENCY),
    ];
    let table = aggregate(&dataset, P, &metrics)?;
    let collisions = collision_rate(&dataset, &table)?;
    table.join([collisions])
}

/// Collisions per delivered frame, absent for every `p` if the simulator did not record them.
fn collision_rate(dataset: &Dataset, table: &SummaryTable) -> Result<SummaryTable> {
    if dataset.has_column("collisions") && dataset.has_column("framesDelivered") {
        let metric = Metric::ratio("collisions", "framesDelivered").named(COLLISION_RATE);
        aggregate(dataset, P, &[metric])
    } else {
        log::warn!("No collision counts in the per-run results, collision rate is left empty");
        let rows = table
            .keys()
            .map(|key| SummaryRow {
                key: key.clone(),
                values: vec![None],
            })
            .collect();
        Ok(SummaryTable::new(P, vec![COLLISION_RATE.to_string()], rows))
    }
}

fn line(table: &SummaryTable, series: SeriesDef, title: &str, y_label: &str) -> Result<ChartSpec> {
    Ok(to_chart_spec(table, ChartKind::SingleLineSeries, &[series])?
        .title(title)
        .x_label(P_LABEL)
        .y_label(y_label)
        .x_range(0.0, 1.0))
}

fn performance_comparison(table: &SummaryTable) -> Result<Figure> {
    let panels = vec![
        line(
            table,
            SeriesDef::new(THROUGHPUT, "Throughput"),
            "Throughput vs Persistence Probability",
            THROUGHPUT_LABEL,
        )?,
        line(
            table,
            SeriesDef::new(DELAY, "Avg Delay"),
            "Average Forwarding Delay vs Persistence Probability",
            DELAY_LABEL,
        )?,
        line(
            table,
            SeriesDef::new(EFFICIENCY, "Efficiency").scaled(100.0),
            "Channel Efficiency vs Persistence Probability",
            "Channel Efficiency (%)",
        )?
        .y_bounds(AxisBounds::Fixed { min: 0.0, max: 100.0 }),
        line(
            table,
            SeriesDef::new(COLLISION_RATE, "Collision Rate").scaled(100.0),
            "Collision Rate vs Persistence Probability",
            "Collision Rate (%)",
        )?
        .y_bounds(AxisBounds::Headroom {
            ceiling: 100.0,
            factor: 1.1,
        }),
    ];
    Ok(Figure::grid("p-persistent CSMA-CD Performance Analysis", panels, 2).size(1500, 1000))
}

fn throughput_delay_analysis(table: &SummaryTable) -> Result<Figure> {
    let trade_off = to_chart_spec(
        table,
        ChartKind::MultiLineSeries,
        &[
            SeriesDef::new(THROUGHPUT, "Throughput"),
            SeriesDef::new(DELAY, "Delay").secondary(),
        ],
    )?
    .title("Throughput vs Delay Trade-off")
    .x_label(P_LABEL)
    .y_label(THROUGHPUT_LABEL)
    .y2_label("Average Delay (ms)");

    let mut correlation = to_chart_spec(
        table,
        ChartKind::ScatterWithColorDimension,
        &[
            SeriesDef::new(DELAY, DELAY_LABEL),
            SeriesDef::new(THROUGHPUT, THROUGHPUT_LABEL),
        ],
    )?
    .title("Throughput vs Delay Correlation");
    if let Some(color) = correlation.color.as_mut() {
        color.label = P_LABEL.to_string();
    }

    Ok(Figure::grid("Throughput and Delay Analysis", vec![trade_off, correlation], 2).size(1500, 600))
}

fn format_p(key: &GroupKey) -> String {
    match key.as_number() {
        Some(p) => format!("{p:.1}"),
        None => key.to_string(),
    }
}

fn cell(value: Option<f64>, scale: f64, width: usize) -> String {
    match value {
        Some(v) => format!("{:<width$.2}", v * scale),
        None => format!("{:<width$}", "-"),
    }
}

/// Textual analysis: the optimal `p` per metric and the full table.
pub fn analysis(table: &SummaryTable) -> Result<String> {
    let mut out = String::new();
    let rule = "=".repeat(60);
    // writing to a String cannot fail
    let _ = writeln!(out, "{rule}\nDETAILED PERFORMANCE ANALYSIS\n{rule}");

    let _ = writeln!(out, "\nOptimal p values:");
    let optima = [
        ("Maximum Throughput", THROUGHPUT, Extremum::Max, 1.0, " bits/sec"),
        ("Minimum Delay", DELAY, Extremum::Min, 1.0, " ms"),
        ("Maximum Efficiency", EFFICIENCY, Extremum::Max, 100.0, "%"),
        ("Minimum Collisions", COLLISION_RATE, Extremum::Min, 100.0, "%"),
    ];
    for (name, metric, which, scale, unit) in optima {
        match table.extremum(metric, which)? {
            Some((key, value)) => {
                let _ = writeln!(out, "  {name}: p = {} ({:.2}{unit})", format_p(key), value * scale);
            }
            None => {
                let _ = writeln!(out, "  {name}: no data");
            }
        }
    }

    let _ = writeln!(out, "\nPerformance Summary:");
    let _ = writeln!(
        out,
        "{:<5} {:<12} {:<10} {:<12} {:<12}",
        "p", "Throughput", "Delay(ms)", "Efficiency(%)", "Collisions(%)"
    );
    let _ = writeln!(out, "{}", "-".repeat(55));
    let columns = [(THROUGHPUT, 1.0, 12), (DELAY, 1.0, 10), (EFFICIENCY, 100.0, 12), (COLLISION_RATE, 100.0, 12)];
    for key in table.keys() {
        let cells = columns
            .iter()
            .map(|(metric, scale, width)| cell(table.value(key, metric), *scale, *width))
            .collect::<Vec<_>>();
        let _ = writeln!(out, "{:<5} {}", format_p(key), cells.join(" ").trim_end());
    }

    if let Some((key, _)) = table.extremum(EFFICIENCY, Extremum::Max)? {
        let _ = writeln!(
            out,
            "\nRecommendation: Consider p = {} for optimal efficiency",
            format_p(key)
        );
    }
    Ok(out)
}

pub fn run(config: &Config, renderer: &dyn Renderer) -> Result<Outcome> {
    let summary = match &config.input {
        Input::Combined(path) => load_combined(path)?,
        Input::PerRun { dir, probabilities } => load_per_run(dir, probabilities)?,
    }
    .sorted(&SortPolicy::Ascending);

    let comparison = performance_comparison(&summary)?;
    let throughput_delay = throughput_delay_analysis(&summary)?;

    persist(&summary, &config.summary)?;
    let written = vec![
        config.summary.clone(),
        renderer.render(&comparison, &config.comparison)?,
        renderer.render(&throughput_delay, &config.throughput_delay)?,
    ];

    Ok(Outcome {
        analysis: Some(analysis(&summary)?),
        summary,
        written,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> SummaryTable {
        let row = |p: f64, values: [f64; 4]| SummaryRow {
            key: GroupKey::number(p).unwrap(),
            values: values.map(Some).to_vec(),
        };
        SummaryTable::new(
            P,
            vec![
                THROUGHPUT.to_string(),
                DELAY.to_string(),
                EFFICIENCY.to_string(),
                COLLISION_RATE.to_string(),
            ],
            vec![
                row(0.1, [1000.0, 50.0, 0.4, 0.1]),
                row(0.5, [3000.0, 20.0, 0.8, 0.3]),
                row(1.0, [2000.0, 10.0, 0.6, 1.5]),
            ],
        )
    }

    #[test]
    fn optimal_p_values() {
        let text = analysis(&table()).unwrap();
        assert!(text.contains("Maximum Throughput: p = 0.5 (3000.00 bits/sec)"));
        assert!(text.contains("Minimum Delay: p = 1.0 (10.00 ms)"));
        assert!(text.contains("Maximum Efficiency: p = 0.5 (80.00%)"));
        assert!(text.contains("Minimum Collisions: p = 0.1 (10.00%)"));
        assert!(text.contains("Recommendation: Consider p = 0.5 for optimal efficiency"));
        assert!(text.contains("0.1   1000.00      50.00      40.00        10.00"));
    }

    #[test]
    fn collision_axis_grows_with_data() {
        let figure = performance_comparison(&table()).unwrap();
        assert_eq!(figure.panels.len(), 4);
        assert_eq!(figure.rows(), 2);
        assert_eq!(figure.panels[2].y_range(), Some((0.0, 100.0)));
        let (_, max) = figure.panels[3].y_range().unwrap();
        assert!((max - 165.0).abs() < 1e-9);
    }

    #[test]
    fn scatter_labels_points_by_p() {
        let figure = throughput_delay_analysis(&table()).unwrap();
        let scatter = &figure.panels[1];
        assert_eq!(scatter.point_labels, vec!["p=0.1", "p=0.5", "p=1"]);
        assert_eq!(scatter.color.as_ref().unwrap().values, vec![0.1, 0.5, 1.0]);
        assert!(figure.panels[0].has_secondary_axis());
    }

    #[test]
    fn directory_selects_per_run_files() {
        let dir = tempfile::tempdir().unwrap();
        let args = ReportArgs {
            input: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = Config::from_args(&args);
        assert!(matches!(config.input, Input::PerRun { ref probabilities, .. } if probabilities.len() == 10));
        assert_eq!(config.summary, dir.path().join("csma_summary.csv"));
    }
}
