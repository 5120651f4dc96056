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
//! Grouping of a [`Dataset`] by a key column and aggregation of metrics per group.
use std::{collections::BTreeMap, fmt};

use itertools::Itertools;
use ordered_float::NotNan;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::{
    dataset::{Cell, Dataset, Record},
    Error, Result,
};

/// Value used to partition a dataset. Numbers are ordered before labels.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(NotNan<f64>),
    Label(String),
}

impl GroupKey {
    pub fn number(x: f64) -> Option<Self> {
        NotNan::new(x).ok().map(Self::Number)
    }

    pub fn label(s: impl Into<String>) -> Self {
        Self::Label(s.into())
    }

    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Number(x) => Self::number(*x),
            Cell::Text(s) => Some(Self::Label(s.clone())),
            Cell::Missing => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(x.into_inner()),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => f.write_str(&format_number(x.into_inner())),
            Self::Label(s) => f.write_str(s),
        }
    }
}

/// Format a number without a fractional part if it is integral (`80`), and with the shortest
/// representation that round-trips otherwise (`0.1`).
pub fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Aggregation {
    /// Arithmetic mean over all numeric cells.
    Mean,
    /// Arithmetic mean multiplied by 100.
    PercentageOfMean,
    /// Sum of the column divided by the sum of `denominator`, over records where both are numeric.
    RatioOfSums { denominator: String },
}

/// A metric to compute for every group. The metric is reported under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: String,
    pub column: String,
    pub aggregation: Aggregation,
}

impl Metric {
    pub fn new(column: impl Into<String>, aggregation: Aggregation) -> Self {
        let column = column.into();
        Self {
            name: column.clone(),
            column,
            aggregation,
        }
    }

    pub fn mean(column: impl Into<String>) -> Self {
        Self::new(column, Aggregation::Mean)
    }

    pub fn percentage(column: impl Into<String>) -> Self {
        Self::new(column, Aggregation::PercentageOfMean)
    }

    pub fn ratio(numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        Self::new(
            numerator,
            Aggregation::RatioOfSums {
                denominator: denominator.into(),
            },
        )
    }

    /// Report the metric under a different name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Resolve the column indices this metric reads from.
    fn resolve(&self, dataset: &Dataset) -> Result<(usize, Option<usize>)> {
        let idx = dataset
            .column_index(&self.column)
            .ok_or_else(|| Error::schema(&self.column))?;
        let den = match &self.aggregation {
            Aggregation::RatioOfSums { denominator } => Some(
                dataset
                    .column_index(denominator)
                    .ok_or_else(|| Error::schema(denominator))?,
            ),
            _ => None,
        };
        Ok((idx, den))
    }

    fn compute(&self, records: &[&Record], (idx, den): (usize, Option<usize>)) -> Option<f64> {
        match (&self.aggregation, den) {
            (Aggregation::RatioOfSums { .. }, Some(den)) => {
                let (num_sum, den_sum, count) = records
                    .iter()
                    .filter_map(|r| Some((r.cells()[idx].as_number()?, r.cells()[den].as_number()?)))
                    .fold((0.0, 0.0, 0usize), |(n, d, c), (x, y)| (n + x, d + y, c + 1));
                (count > 0 && den_sum != 0.0).then(|| num_sum / den_sum)
            }
            (aggregation, _) => {
                let values = records
                    .iter()
                    .filter_map(|r| r.cells()[idx].as_number())
                    .collect_vec();
                if values.is_empty() {
                    return None;
                }
                let mean = values.iter().mean();
                Some(match aggregation {
                    Aggregation::PercentageOfMean => mean * 100.0,
                    _ => mean,
                })
            }
        }
    }
}

/// One row of a [`SummaryTable`]. `values` are aligned to [`SummaryTable::metrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub key: GroupKey,
    pub values: Vec<Option<f64>>,
}

/// Ordering applied to the rows of a [`SummaryTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortPolicy {
    /// Ascending by key: numbers first (ascending), then labels (lexicographic).
    Ascending,
    /// Explicit display order. Keys not in the list follow in ascending order.
    Rank(Vec<GroupKey>),
}

impl SortPolicy {
    pub fn rank(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Rank(labels.into_iter().map(GroupKey::label).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Aggregated metrics, one row per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    key_column: String,
    metrics: Vec<String>,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(key_column: impl Into<String>, metrics: Vec<String>, rows: Vec<SummaryRow>) -> Self {
        Self {
            key_column: key_column.into(),
            metrics,
            rows,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.rows.iter().map(|r| &r.key)
    }

    pub fn metric_index(&self, metric: &str) -> Result<usize> {
        self.metrics
            .iter()
            .position(|m| m == metric)
            .ok_or_else(|| Error::schema(metric))
    }

    /// All values of `metric`, in row order.
    pub fn column(&self, metric: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.metric_index(metric)?;
        Ok(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Value of `metric` for the group `key`.
    pub fn value(&self, key: &GroupKey, metric: &str) -> Option<f64> {
        let idx = self.metric_index(metric).ok()?;
        self.rows.iter().find(|r| r.key == *key)?.values[idx]
    }

    pub fn sorted(mut self, order: &SortPolicy) -> Self {
        match order {
            SortPolicy::Ascending => self.rows.sort_by(|a, b| a.key.cmp(&b.key)),
            SortPolicy::Rank(rank) => self.rows.sort_by_cached_key(|r| {
                let pos = rank.iter().position(|k| *k == r.key).unwrap_or(usize::MAX);
                (pos, r.key.clone())
            }),
        }
        self
    }

    /// Replace every key by `f(key)`, e.g., to map numeric codes to display names.
    pub fn relabel(mut self, f: impl Fn(&GroupKey) -> GroupKey) -> Self {
        for row in self.rows.iter_mut() {
            row.key = f(&row.key);
        }
        self
    }

    /// Outer join on the key: the result has the union of all keys (ascending) and the metrics of
    /// all tables concatenated. Keys missing in one of the tables get absent values.
    pub fn join(self, others: impl IntoIterator<Item = SummaryTable>) -> Result<Self> {
        let mut metrics = self.metrics;
        let mut joined: BTreeMap<GroupKey, Vec<Option<f64>>> = self
            .rows
            .into_iter()
            .map(|r| (r.key, r.values))
            .collect();
        for other in others {
            if other.key_column != self.key_column {
                return Err(Error::schema(other.key_column));
            }
            let offset = metrics.len();
            let width = other.metrics.len();
            metrics.extend(other.metrics);
            for row in other.rows {
                let values = joined.entry(row.key).or_insert_with(|| vec![None; offset]);
                values.resize(offset, None);
                values.extend(row.values);
            }
            for values in joined.values_mut() {
                values.resize(offset + width, None);
            }
        }
        let rows = joined
            .into_iter()
            .map(|(key, values)| SummaryRow { key, values })
            .collect();
        Ok(Self {
            key_column: self.key_column,
            metrics,
            rows,
        })
    }

    /// Key and value of the row with the smallest (largest) value of `metric`. Absent values are
    /// ignored, ties resolve to the first row.
    pub fn extremum(&self, metric: &str, which: Extremum) -> Result<Option<(&GroupKey, f64)>> {
        let idx = self.metric_index(metric)?;
        let candidates = self
            .rows
            .iter()
            .filter_map(|r| Some((&r.key, r.values[idx]?)));
        Ok(match which {
            Extremum::Min => candidates.min_by(|a, b| a.1.total_cmp(&b.1)),
            Extremum::Max => candidates.rev().max_by(|a, b| a.1.total_cmp(&b.1)),
        })
    }
}

/// Partition `dataset` by `group_by` and compute all `metrics` for every group.
///
/// Every distinct key in the data yields a row. Sources that are tagged with a value for
/// `group_by` declare their key even if they could not be loaded, such that missing files show up
/// as rows with absent metrics. Rows are sorted ascending.
pub fn aggregate(dataset: &Dataset, group_by: &str, metrics: &[Metric]) -> Result<SummaryTable> {
    let key_idx = dataset
        .column_index(group_by)
        .ok_or_else(|| Error::schema(group_by))?;
    let resolved = metrics
        .iter()
        .map(|m| m.resolve(dataset))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<GroupKey, Vec<&Record>> = dataset
        .sources()
        .iter()
        .filter_map(|s| GroupKey::from_cell(s.tag(group_by)?))
        .map(|key| (key, Vec::new()))
        .collect();

    for record in dataset.records() {
        match GroupKey::from_cell(&record.cells()[key_idx]) {
            Some(key) => groups.entry(key).or_default().push(record),
            None => log::debug!("Skipping record without `{group_by}`: {record:?}"),
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, records)| SummaryRow {
            key,
            values: metrics
                .iter()
                .zip(&resolved)
                .map(|(metric, idx)| metric.compute(&records, *idx))
                .collect(),
        })
        .collect();

    Ok(SummaryTable {
        key_column: group_by.to_string(),
        metrics: metrics.iter().map(|m| m.name.clone()).collect(),
        rows,
    })
}

/// Compute all `metrics` over the entire dataset.
pub fn summarize(dataset: &Dataset, metrics: &[Metric]) -> Result<Vec<(String, Option<f64>)>> {
    let records = dataset.records().iter().collect_vec();
    metrics
        .iter()
        .map(|metric| {
            let idx = metric.resolve(dataset)?;
            Ok((metric.name.clone(), metric.compute(&records, idx)))
        })
        .collect()
}
