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
//! Error type shared by all pipeline stages and reports.
use std::path::PathBuf;

use itertools::Itertools;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Could not load any input from: {}", .attempted.iter().map(|p| p.display()).join(", "))]
    Load { attempted: Vec<PathBuf> },
    #[error("Required column `{column}` is absent from all loaded inputs")]
    Schema { column: String },
    #[error("Invalid chart definition: {0}")]
    Chart(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn schema(column: impl Into<String>) -> Self {
        Self::Schema {
            column: column.into(),
        }
    }
}
