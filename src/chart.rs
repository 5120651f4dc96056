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
//! Declarative chart descriptions derived from a [`SummaryTable`].
//!
//! A [`ChartSpec`] holds everything a renderer needs (kind, axis labels, data series, bounds), but
//! does not render anything itself. One or more specs are arranged on a [`Figure`], which is what
//! a [`Renderer`](crate::render::Renderer) writes to a file.
use itertools::Itertools;
use serde::Serialize;

use crate::{aggregate::SummaryTable, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
pub enum ChartKind {
    /// One cluster of bars per row, one bar per series.
    GroupedBar,
    /// A single line over the (numeric) keys.
    SingleLineSeries,
    /// Several lines over the (numeric) keys, optionally on two y-axes.
    MultiLineSeries,
    /// First series on x, second on y, the key as colour.
    ScatterWithColorDimension,
    /// Distribution of the first series over all rows.
    Histogram,
}

/// Selects a metric of the table as a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDef {
    pub metric: String,
    pub label: String,
    /// Factor applied to every value, e.g., `100.0` to show a fraction as percentage.
    pub scale: f64,
    pub secondary_axis: bool,
}

impl SeriesDef {
    pub fn new(metric: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            label: label.into(),
            scale: 1.0,
            secondary_axis: false,
        }
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn secondary(mut self) -> Self {
        self.secondary_axis = true;
        self
    }
}

/// Policy for the bounds of the (primary) y-axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AxisBounds {
    /// Let the renderer decide.
    Auto,
    Fixed { min: f64, max: f64 },
    /// `[0, max(ceiling, observed_max * factor)]`.
    Headroom { ceiling: f64, factor: f64 },
    /// `[0, bound]` of the first `(threshold, bound)` with `observed_max <= threshold`, and
    /// `[0, fallback]` above all thresholds.
    Tiered { tiers: Vec<(f64, f64)>, fallback: f64 },
}

impl AxisBounds {
    pub fn resolve(&self, observed_max: Option<f64>) -> Option<(f64, f64)> {
        match self {
            Self::Auto => None,
            Self::Fixed { min, max } => Some((*min, *max)),
            Self::Headroom { ceiling, factor } => Some((
                0.0,
                observed_max.map_or(*ceiling, |m| ceiling.max(m * factor)),
            )),
            Self::Tiered { tiers, fallback } => {
                let max = observed_max?;
                let bound = tiers
                    .iter()
                    .find(|(threshold, _)| max <= *threshold)
                    .map_or(*fallback, |(_, bound)| *bound);
                Some((0.0, bound))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum XValues {
    Categories(Vec<String>),
    Numbers(Vec<f64>),
    /// Histograms have no x values of their own.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<Option<f64>>,
    pub secondary_axis: bool,
}

/// Third dimension of a scatter plot, encoded as point colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorDimension {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub y2_label: Option<String>,
    pub x: XValues,
    pub series: Vec<Series>,
    pub x_range: Option<(f64, f64)>,
    pub y_bounds: AxisBounds,
    pub color: Option<ColorDimension>,
    pub point_labels: Vec<String>,
    /// Print the value above every bar.
    pub value_labels: bool,
    pub bins: Option<usize>,
}

impl ChartSpec {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    pub fn y2_label(mut self, label: impl Into<String>) -> Self {
        self.y2_label = Some(label.into());
        self
    }

    pub fn x_range(mut self, min: f64, max: f64) -> Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn y_bounds(mut self, bounds: AxisBounds) -> Self {
        self.y_bounds = bounds;
        self
    }

    pub fn value_labels(mut self, value_labels: bool) -> Self {
        self.value_labels = value_labels;
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    /// Largest value plotted on the primary y-axis.
    pub fn observed_max(&self) -> Option<f64> {
        self.series
            .iter()
            .filter(|s| !s.secondary_axis)
            .flat_map(|s| s.values.iter().flatten())
            .copied()
            .max_by(f64::total_cmp)
    }

    /// Resolved bounds of the primary y-axis.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        self.y_bounds.resolve(self.observed_max())
    }

    pub fn has_secondary_axis(&self) -> bool {
        self.series.iter().any(|s| s.secondary_axis)
    }
}

/// Build a chart description of `kind` for the `series` of `table`.
///
/// Fails with [`Error::Schema`] if a series refers to a metric that is not in the table, and with
/// [`Error::Chart`] if the number of series does not fit the chart kind.
pub fn to_chart_spec(table: &SummaryTable, kind: ChartKind, series: &[SeriesDef]) -> Result<ChartSpec> {
    let columns = series
        .iter()
        .map(|def| {
            Ok(table
                .column(&def.metric)?
                .into_iter()
                .map(|v| v.map(|x| x * def.scale))
                .collect_vec())
        })
        .collect::<Result<Vec<_>>>()?;
    let required = match kind {
        ChartKind::ScatterWithColorDimension => 2,
        _ => 1,
    };
    if series.len() < required {
        return Err(Error::Chart(format!(
            "{kind} requires at least {required} series, got {}",
            series.len()
        )));
    }

    let mut spec = ChartSpec {
        kind,
        title: String::new(),
        x_label: table.key_column().to_string(),
        y_label: series[0].label.clone(),
        y2_label: None,
        x: XValues::Empty,
        series: Vec::new(),
        x_range: None,
        y_bounds: AxisBounds::Auto,
        color: None,
        point_labels: Vec::new(),
        value_labels: false,
        bins: None,
    };

    let as_series = |(def, values): (&SeriesDef, Vec<Option<f64>>)| Series {
        label: def.label.clone(),
        values,
        secondary_axis: def.secondary_axis,
    };

    match kind {
        ChartKind::GroupedBar => {
            spec.x = XValues::Categories(table.keys().map(|k| k.to_string()).collect());
            spec.series = series.iter().zip(columns).map(as_series).collect();
        }
        ChartKind::SingleLineSeries | ChartKind::MultiLineSeries => {
            let numbers: Option<Vec<f64>> = table.keys().map(|k| k.as_number()).collect();
            spec.x = match numbers {
                Some(numbers) => XValues::Numbers(numbers),
                None => XValues::Categories(table.keys().map(|k| k.to_string()).collect()),
            };
            let take = if kind == ChartKind::SingleLineSeries { 1 } else { series.len() };
            spec.series = series.iter().zip(columns).take(take).map(as_series).collect();
        }
        ChartKind::ScatterWithColorDimension => {
            let (x, y, color, labels): (Vec<f64>, Vec<Option<f64>>, Vec<f64>, Vec<String>) = table
                .keys()
                .zip(&columns[0])
                .zip(&columns[1])
                .filter_map(|((key, x), y)| {
                    let label = format!("{}={key}", table.key_column());
                    Some(((*x)?, Some((*y)?), key.as_number()?, label))
                })
                .multiunzip();
            spec.x = XValues::Numbers(x);
            spec.x_label = series[0].label.clone();
            spec.y_label = series[1].label.clone();
            spec.series = vec![Series {
                label: series[1].label.clone(),
                values: y,
                secondary_axis: false,
            }];
            spec.color = Some(ColorDimension {
                label: table.key_column().to_string(),
                values: color,
            });
            spec.point_labels = labels;
        }
        ChartKind::Histogram => {
            spec.x_label = series[0].label.clone();
            spec.y_label = "Count".to_string();
            spec.series = vec![Series {
                label: series[0].label.clone(),
                values: columns[0].iter().flatten().map(|x| Some(*x)).collect(),
                secondary_axis: false,
            }];
            spec.bins = Some(10);
        }
    }

    Ok(spec)
}

/// One or more charts rendered into a single output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: Option<String>,
    pub panels: Vec<ChartSpec>,
    /// Number of panels per row of the grid.
    pub columns: usize,
    pub width: usize,
    pub height: usize,
}

impl Figure {
    pub fn grid(title: impl Into<String>, panels: Vec<ChartSpec>, columns: usize) -> Self {
        Self {
            title: Some(title.into()),
            panels,
            columns: columns.max(1),
            width: 1000,
            height: 600,
        }
    }

    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn rows(&self) -> usize {
        self.panels.len().div_ceil(self.columns)
    }
}

impl From<ChartSpec> for Figure {
    fn from(spec: ChartSpec) -> Self {
        Self {
            title: None,
            panels: vec![spec],
            columns: 1,
            width: 1000,
            height: 600,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aggregate::{GroupKey, SummaryRow};

    fn csma() -> SummaryTable {
        SummaryTable::new(
            "p",
            vec!["Throughput".into(), "Average_Delay".into(), "Efficiency".into()],
            [
                (0.1, Some(100.0), Some(50.0), Some(0.9)),
                (0.5, Some(300.0), None, Some(0.7)),
                (0.9, Some(250.0), Some(10.0), Some(0.4)),
            ]
            .into_iter()
            .map(|(p, t, d, e)| SummaryRow {
                key: GroupKey::number(p).unwrap(),
                values: vec![t, d, e],
            })
            .collect(),
        )
    }

    #[test]
    fn bounds() {
        let headroom = AxisBounds::Headroom {
            ceiling: 100.0,
            factor: 1.1,
        };
        assert_eq!(headroom.resolve(Some(50.0)), Some((0.0, 100.0)));
        let (_, max) = headroom.resolve(Some(200.0)).unwrap();
        assert!((max - 220.0).abs() < 1e-9);
        assert_eq!(headroom.resolve(None), Some((0.0, 100.0)));

        let tiered = AxisBounds::Tiered {
            tiers: vec![(10.0, 15.0), (5000.0, 5500.0)],
            fallback: 10500.0,
        };
        assert_eq!(tiered.resolve(Some(8.0)), Some((0.0, 15.0)));
        assert_eq!(tiered.resolve(Some(10.0)), Some((0.0, 15.0)));
        assert_eq!(tiered.resolve(Some(4200.0)), Some((0.0, 5500.0)));
        assert_eq!(tiered.resolve(Some(8000.0)), Some((0.0, 10500.0)));
        assert_eq!(tiered.resolve(None), None);
    }

    #[test]
    fn grouped_bar() {
        let spec = to_chart_spec(
            &csma(),
            ChartKind::GroupedBar,
            &[
                SeriesDef::new("Throughput", "Throughput"),
                SeriesDef::new("Efficiency", "Efficiency (%)").scaled(100.0),
            ],
        )
        .unwrap()
        .y_bounds(AxisBounds::Fixed { min: 0.0, max: 110.0 });
        assert_eq!(
            spec.x,
            XValues::Categories(vec!["0.1".into(), "0.5".into(), "0.9".into()])
        );
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[1].values, vec![Some(90.0), Some(70.0), Some(40.0)]);
        assert_eq!(spec.y_range(), Some((0.0, 110.0)));
        assert_eq!(spec.observed_max(), Some(300.0));
    }

    #[test]
    fn scatter_with_color_dimension() {
        let spec = to_chart_spec(
            &csma(),
            ChartKind::ScatterWithColorDimension,
            &[
                SeriesDef::new("Average_Delay", "Average Forwarding Delay (ms)"),
                SeriesDef::new("Throughput", "Throughput (bits/sec)"),
            ],
        )
        .unwrap();
        // the row with an absent delay is left out
        assert_eq!(spec.x, XValues::Numbers(vec![50.0, 10.0]));
        assert_eq!(spec.series[0].values, vec![Some(100.0), Some(250.0)]);
        assert_eq!(spec.color.as_ref().unwrap().values, vec![0.1, 0.9]);
        assert_eq!(spec.point_labels, vec!["p=0.1", "p=0.9"]);
        assert_eq!(spec.x_label, "Average Forwarding Delay (ms)");
    }

    #[test]
    fn scatter_requires_two_series() {
        let result = to_chart_spec(
            &csma(),
            ChartKind::ScatterWithColorDimension,
            &[SeriesDef::new("Throughput", "Throughput")],
        );
        assert!(matches!(result, Err(Error::Chart(_))));
    }

    #[test]
    fn line_series_and_histogram() {
        let spec = to_chart_spec(
            &csma(),
            ChartKind::MultiLineSeries,
            &[
                SeriesDef::new("Throughput", "Throughput"),
                SeriesDef::new("Average_Delay", "Delay").secondary(),
            ],
        )
        .unwrap();
        assert_eq!(spec.x, XValues::Numbers(vec![0.1, 0.5, 0.9]));
        assert!(spec.has_secondary_axis());
        assert_eq!(spec.observed_max(), Some(300.0));

        let hist = to_chart_spec(
            &csma(),
            ChartKind::Histogram,
            &[SeriesDef::new("Average_Delay", "Delay")],
        )
        .unwrap();
        assert_eq!(hist.series[0].values, vec![Some(50.0), Some(10.0)]);
        assert_eq!(hist.bins, Some(10));
    }

    #[test]
    fn unknown_metric() {
        let result = to_chart_spec(
            &csma(),
            ChartKind::GroupedBar,
            &[SeriesDef::new("Collision_Rate", "Collisions")],
        );
        assert!(matches!(result, Err(Error::Schema { column }) if column == "Collision_Rate"));
    }

    #[test]
    fn figure_grid() {
        let spec = to_chart_spec(
            &csma(),
            ChartKind::SingleLineSeries,
            &[SeriesDef::new("Throughput", "T")],
        )
        .unwrap();
        let figure = Figure::grid("CSMA-CD", vec![spec.clone(), spec.clone(), spec], 2);
        assert_eq!(figure.rows(), 2);
    }
}
