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
//! Aggregation and charting of the CSV results of network lab simulations.
//!
//! Every report runs the same pipeline: [`load`](dataset::load) the raw CSV files into a
//! [`Dataset`](dataset::Dataset), [`aggregate`](aggregate::aggregate) it into a
//! [`SummaryTable`](aggregate::SummaryTable), [`persist`](persist::persist) the table, and render
//! the charts built by [`to_chart_spec`](chart::to_chart_spec).

pub mod aggregate;
pub mod chart;
pub mod dataset;
pub mod error;
pub mod persist;
pub mod render;
pub mod reports;
pub mod util;

pub use error::{Error, Result};

pub mod prelude {
    pub use super::{
        aggregate::{aggregate, summarize, Aggregation, Extremum, GroupKey, Metric, SortPolicy, SummaryTable},
        chart::{to_chart_spec, AxisBounds, ChartKind, ChartSpec, Figure, SeriesDef},
        dataset::{load, Cell, Dataset, SourceSpec, Sources},
        persist::persist,
        render::{renderer, JsonRenderer, OutputFormat, PlotlyRenderer, Renderer},
        Error, Result,
    };
}
