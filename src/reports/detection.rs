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
//! Detection rate of checksum and CRC schemes per injected error type.
use std::path::PathBuf;

use itertools::Itertools;

use crate::{
    aggregate::{aggregate, GroupKey, Metric, SortPolicy},
    chart::{to_chart_spec, AxisBounds, ChartKind, Figure, SeriesDef},
    dataset::{load, Sources},
    persist::persist,
    render::Renderer,
    util::{parent_dir, PathBufExt},
    Error, Result,
};

use super::{Outcome, ReportArgs};

pub const ERROR_TYPE: &str = "errorType";
pub const SCHEMES: [&str; 5] = ["checksum", "crc8", "crc10", "crc16", "crc32"];
/// Display names of the error type codes, in display order.
pub const ERROR_TYPES: [&str; 5] = ["None", "Single", "Two", "Odd", "Burst"];

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub histogram: PathBuf,
    pub summary: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::new("Assignments/Assignment1/detected_frames.csv", None)
    }
}

impl Config {
    /// Outputs go to `output_dir`, or next to the input.
    pub fn new(input: impl Into<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        let input = input.into();
        let output_dir = output_dir.unwrap_or_else(|| parent_dir(&input));
        Self {
            histogram: output_dir.clone().then("detection_histogram.png"),
            summary: output_dir.then("performance_metrics.csv"),
            input,
        }
    }

    pub fn from_args(args: &ReportArgs) -> Self {
        match &args.input {
            Some(input) => Self::new(input, args.output_dir.clone()),
            None if args.output_dir.is_some() => {
                Self::new(Self::default().input, args.output_dir.clone())
            }
            None => Self::default(),
        }
    }
}

/// Map error type codes to their names. Unknown codes are kept.
fn error_type_name(key: &GroupKey) -> GroupKey {
    key.as_number()
        .filter(|x| x.fract() == 0.0 && *x >= 0.0)
        .and_then(|x| ERROR_TYPES.get(x as usize))
        .map_or_else(|| key.clone(), |name| GroupKey::label(*name))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn run(config: &Config, renderer: &dyn Renderer) -> Result<Outcome> {
    if !config.input.exists() {
        return Err(Error::MissingInput(config.input.clone()));
    }
    let required = std::iter::once(ERROR_TYPE).chain(SCHEMES).collect_vec();
    let dataset = load(Sources::File(config.input.clone()), &required)?;

    let metrics = SCHEMES.map(Metric::percentage);
    let summary = aggregate(&dataset, ERROR_TYPE, &metrics)?
        .relabel(error_type_name)
        .sorted(&SortPolicy::rank(ERROR_TYPES));

    let series = SCHEMES
        .iter()
        .map(|scheme| SeriesDef::new(*scheme, capitalize(scheme)))
        .collect_vec();
    let chart = to_chart_spec(&summary, ChartKind::GroupedBar, &series)?
        .title("Detection Rate per Error Type and Scheme")
        .x_label("Error Type")
        .y_label("Detection Rate (%)")
        .y_bounds(AxisBounds::Fixed { min: 0.0, max: 110.0 });

    persist(&summary, &config.summary)?;
    let histogram = renderer.render(&Figure::from(chart), &config.histogram)?;

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
    fn error_type_names() {
        let name = |x: f64| error_type_name(&GroupKey::number(x).unwrap());
        assert_eq!(name(0.0), GroupKey::label("None"));
        assert_eq!(name(4.0), GroupKey::label("Burst"));
        assert_eq!(name(7.0), GroupKey::number(7.0).unwrap());
        assert_eq!(name(1.5), GroupKey::number(1.5).unwrap());
    }

    #[test]
    fn scheme_labels() {
        assert_eq!(capitalize("crc16"), "Crc16");
        assert_eq!(capitalize("checksum"), "Checksum");
    }

    #[test]
    fn outputs_next_to_input() {
        let config = Config::new("data/detected_frames.csv", None);
        assert_eq!(config.summary, PathBuf::from("data/performance_metrics.csv"));
        let config = Config::new("detected_frames.csv", Some("out".into()));
        assert_eq!(config.histogram, PathBuf::from("out/detection_histogram.png"));
    }
}
