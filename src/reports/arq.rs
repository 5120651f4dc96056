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
//! Average acknowledgement time of the ARQ schemes for different transmission success
//! probabilities. Every (scheme, probability) pair is simulated into its own file.
use std::path::PathBuf;

use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::{
    aggregate::{aggregate, Metric, SortPolicy, SummaryTable},
    chart::{to_chart_spec, AxisBounds, ChartKind, Figure, SeriesDef},
    dataset::{load, SourceSpec, Sources},
    persist::persist,
    render::Renderer,
    util::PathBufExt,
    Result,
};

use super::{Outcome, ReportArgs};

pub const PROBABILITY: &str = "Probability(%)";
pub const SCHEME: &str = "scheme";
pub const ACK_TIME: &str = "AckTime(ms)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum Scheme {
    StopAndWait,
    GoBackN,
    SelectiveRepeat,
}

impl Scheme {
    /// File name pattern of the per-probability simulation output.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::StopAndWait => "csvframe_times_stop_and_wait{}.csv",
            Self::GoBackN => "csvframe_times_go_back_n{}.csv",
            Self::SelectiveRepeat => "csvframe_times_selective_repeat{}.csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StopAndWait => "Stop & Wait",
            Self::GoBackN => "Go-Back-N",
            Self::SelectiveRepeat => "Selective Repeat",
        }
    }

    /// Column of this scheme in the summary table.
    pub fn metric(&self) -> String {
        format!("{self}_avgAck(ms)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub probabilities: Vec<u32>,
    pub histogram: PathBuf,
    pub summary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("Assignments/Assignment2", None)
    }
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let output_dir = output_dir.unwrap_or_else(|| data_dir.clone());
        Self {
            probabilities: vec![80, 85, 90, 95, 100],
            histogram: output_dir.clone().then("arq_comparison_histogram.png"),
            summary: output_dir.then("performance_metrics.csv"),
            data_dir,
        }
    }

    pub fn from_args(args: &ReportArgs) -> Self {
        let data_dir = args
            .input
            .clone()
            .unwrap_or_else(|| Self::default().data_dir);
        Self::new(data_dir, args.output_dir.clone())
    }

    /// One source per scheme and probability, tagged with both.
    fn sources(&self) -> Sources {
        Sources::Tagged(
            Scheme::iter()
                .cartesian_product(&self.probabilities)
                .map(|(scheme, prob)| {
                    let path = self.data_dir.as_path().then_fmt(scheme.pattern(), &prob.to_string());
                    SourceSpec::new(path)
                        .tag(SCHEME, scheme.to_string())
                        .tag(PROBABILITY, prob.to_string())
                })
                .collect(),
        )
    }
}

pub fn run(config: &Config, renderer: &dyn Renderer) -> Result<Outcome> {
    let dataset = load(config.sources(), &[ACK_TIME])?;

    let per_scheme = Scheme::iter()
        .map(|scheme| {
            let subset = dataset.filter(SCHEME, &scheme.to_string())?;
            aggregate(&subset, PROBABILITY, &[Metric::mean(ACK_TIME).named(scheme.metric())])
        })
        .collect::<Result<Vec<_>>>()?;
    let summary = SummaryTable::new(PROBABILITY, Vec::new(), Vec::new())
        .join(per_scheme)?
        .sorted(&SortPolicy::Ascending);

    let series = Scheme::iter()
        .map(|scheme| SeriesDef::new(scheme.metric(), scheme.label()))
        .collect_vec();
    let chart = to_chart_spec(&summary, ChartKind::GroupedBar, &series)?
        .title("Comparison of ARQ Schemes at Different Probabilities")
        .x_label("Transmission Success Probability (%)")
        .y_label("Average Acknowledgement Time (ms)")
        .value_labels(true)
        .y_bounds(AxisBounds::Tiered {
            tiers: vec![(10.0, 15.0), (5000.0, 5500.0)],
            fallback: 10500.0,
        });

    persist(&summary, &config.summary)?;
    let histogram = renderer.render(&Figure::from(chart).size(1200, 600), &config.histogram)?;

    Ok(Outcome {
        summary,
        written: vec![config.summary.clone(), histogram],
        analysis: None,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scheme_columns() {
        assert_eq!(Scheme::GoBackN.metric(), "GoBackN_avgAck(ms)");
        assert_eq!(Scheme::StopAndWait.to_string(), "StopAndWait");
    }

    #[test]
    fn one_source_per_scheme_and_probability() {
        let config = Config::new("lab", None);
        let Sources::Tagged(specs) = config.sources() else {
            panic!("expected tagged sources")
        };
        assert_eq!(specs.len(), 15);
        assert_eq!(specs[1].path, PathBuf::from("lab/csvframe_times_stop_and_wait85.csv"));
        assert_eq!(
            specs[1].tags,
            vec![
                (SCHEME.to_string(), "StopAndWait".to_string()),
                (PROBABILITY.to_string(), "85".to_string())
            ]
        );
    }
}
