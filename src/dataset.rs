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
//! Module to load the CSV files written by the simulators into a single, tagged [`Dataset`].
//!
//! A dataset can be merged from many files. Every file is described by a [`SourceSpec`], which
//! may carry tags (e.g., the success probability encoded in a file name). Tags are added as
//! additional columns to every row of that file. Files that do not exist are recorded as
//! [`SourceStatus::Missing`] instead of aborting the whole batch.
use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::Serialize;

use crate::{Error, Result};

/// The value of a record in one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Parse a raw CSV field. Booleans become `1`/`0`, non-finite numbers are treated as missing.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Missing;
        }
        if raw.eq_ignore_ascii_case("true") {
            return Self::Number(1.0);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Self::Number(0.0);
        }
        match raw.parse::<f64>() {
            Ok(x) if x.is_finite() => Self::Number(x),
            Ok(_) => Self::Missing,
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Numeric value of the cell, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Missing => Ok(()),
        }
    }
}

/// One input file together with the tags attached to all of its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub tags: Vec<(String, String)>,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tags: Vec::new(),
        }
    }

    /// Tag every row of this source with `column = value`.
    pub fn tag(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((column.into(), value.into()));
        self
    }
}

/// Selection of the input files of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sources {
    /// A single file.
    File(PathBuf),
    /// A list of files with a shared schema, merged without tags.
    Files(Vec<PathBuf>),
    /// One file per parameter value. The first `{}` in `pattern` is replaced by the value, and
    /// every row is tagged with `column = value`.
    Pattern {
        pattern: String,
        column: String,
        values: Vec<String>,
    },
    /// Explicit list of tagged files.
    Tagged(Vec<SourceSpec>),
}

impl Sources {
    pub fn pattern(
        pattern: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl ToString>,
    ) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            column: column.into(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    fn into_specs(self) -> Vec<SourceSpec> {
        match self {
            Self::File(path) => vec![SourceSpec::new(path)],
            Self::Files(paths) => paths.into_iter().map(SourceSpec::new).collect(),
            Self::Pattern {
                pattern,
                column,
                values,
            } => values
                .into_iter()
                .map(|value| {
                    SourceSpec::new(pattern.replacen("{}", &value, 1)).tag(column.clone(), value)
                })
                .collect(),
            Self::Tagged(specs) => specs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceStatus {
    Loaded { rows: usize },
    Missing,
}

/// A declared source of a [`Dataset`], after loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub path: PathBuf,
    pub tags: Vec<(String, Cell)>,
    pub status: SourceStatus,
}

impl Source {
    /// Value of the tag `column`, if this source carries one.
    pub fn tag(&self, column: &str) -> Option<&Cell> {
        self.tags
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, value)| value)
    }

    pub fn is_missing(&self) -> bool {
        self.status == SourceStatus::Missing
    }
}

/// One row of raw input, aligned to the columns of its [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    source: usize,
    cells: Vec<Cell>,
}

impl Record {
    /// Index of the originating source in [`Dataset::sources`].
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Ordered, immutable sequence of records sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    sources: Vec<Source>,
}

impl Dataset {
    /// Build a dataset from rows that are already in memory. All rows belong to a single source.
    pub fn from_rows(
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = Vec<Cell>>,
    ) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let records = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(columns.len(), Cell::Missing);
                Record { source: 0, cells }
            })
            .collect_vec();
        let sources = vec![Source {
            path: PathBuf::from("<memory>"),
            tags: Vec::new(),
            status: SourceStatus::Loaded {
                rows: records.len(),
            },
        }];
        Self {
            columns,
            records,
            sources,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sources that are declared but could not be loaded.
    pub fn missing_sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(|s| s.is_missing())
    }

    /// All cells of `column`, in record order.
    pub fn column(&self, column: &str) -> Result<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(column).ok_or_else(|| Error::schema(column))?;
        Ok(self.records.iter().map(move |r| &r.cells[idx]))
    }

    /// Restrict the dataset to the rows where `column` equals `value`. Sources tagged with a
    /// different value for `column` are dropped, so that missing sources stay declared only in
    /// the matching subset.
    pub fn filter(&self, column: &str, value: &str) -> Result<Dataset> {
        let idx = self.column_index(column).ok_or_else(|| Error::schema(column))?;
        let value = Cell::parse(value);

        let kept_sources = self
            .sources
            .iter()
            .enumerate()
            .filter(|(i, source)| match source.tag(column) {
                Some(tag) => *tag == value,
                None => self
                    .records
                    .iter()
                    .any(|r| r.source == *i && r.cells[idx] == value),
            })
            .map(|(i, _)| i)
            .collect_vec();

        let records = self
            .records
            .iter()
            .filter(|r| r.cells[idx] == value)
            .filter_map(|r| {
                let source = kept_sources.iter().position(|i| *i == r.source)?;
                Some(Record {
                    source,
                    cells: r.cells.clone(),
                })
            })
            .collect_vec();

        Ok(Dataset {
            columns: self.columns.clone(),
            records,
            sources: kept_sources
                .into_iter()
                .map(|i| self.sources[i].clone())
                .collect(),
        })
    }
}

/// Raw content of a single CSV file.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

fn read_table(path: &Path) -> Result<Table> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);
    let headers = csv.headers()?.iter().map(str::to_string).collect_vec();
    // cells that are not valid UTF-8 are missing, the rest of the row is kept
    let rows = csv
        .byte_records()
        .map(|record| {
            Ok(record?
                .iter()
                .map(|field| std::str::from_utf8(field).map_or(Cell::Missing, Cell::parse))
                .collect_vec())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table { headers, rows })
}

/// Load all `sources` into one dataset.
///
/// Missing or unreadable files are logged and recorded as [`SourceStatus::Missing`]. Fails with
/// [`Error::Load`] if no source could be loaded, and with [`Error::Schema`] if one of the
/// `required` columns is absent from every loaded source.
pub fn load(sources: Sources, required: &[&str]) -> Result<Dataset> {
    let specs = sources.into_specs();

    let tables = specs
        .iter()
        .map(|spec| {
            if !spec.path.exists() {
                log::warn!("Missing file: {:?}", spec.path);
                return None;
            }
            match read_table(&spec.path) {
                Ok(table) => {
                    log::info!("Loaded {} rows from {:?}", table.rows.len(), spec.path);
                    Some(table)
                }
                Err(e) => {
                    log::warn!("Could not read {:?}: {e}", spec.path);
                    None
                }
            }
        })
        .collect_vec();

    if tables.iter().all(Option::is_none) {
        return Err(Error::Load {
            attempted: specs.into_iter().map(|s| s.path).collect(),
        });
    }

    // union of all headers and tags, in order of first appearance
    let columns = specs
        .iter()
        .zip(&tables)
        .flat_map(|(spec, table)| {
            let headers = table.iter().flat_map(|t| t.headers.iter().cloned());
            headers.chain(spec.tags.iter().map(|(c, _)| c.clone()))
        })
        .unique()
        .collect_vec();

    for column in required {
        let present = specs.iter().zip(&tables).any(|(spec, table)| {
            table.as_ref().is_some_and(|t| {
                t.headers.iter().any(|h| h == column) || spec.tags.iter().any(|(c, _)| c == column)
            })
        });
        if !present {
            return Err(Error::schema(*column));
        }
    }

    let mut records = Vec::new();
    let mut loaded = Vec::with_capacity(specs.len());
    for (source, (spec, table)) in specs.into_iter().zip(tables).enumerate() {
        let tags = spec
            .tags
            .into_iter()
            .map(|(c, v)| (c, Cell::parse(&v)))
            .collect_vec();
        let status = match table {
            Some(Table { headers, rows }) => {
                let positions = headers
                    .iter()
                    .map(|h| columns.iter().position(|c| c == h))
                    .collect_vec();
                let num_rows = rows.len();
                for row in rows {
                    let mut cells = vec![Cell::Missing; columns.len()];
                    for (cell, pos) in row.into_iter().zip(&positions) {
                        if let Some(pos) = pos {
                            cells[*pos] = cell;
                        }
                    }
                    for (column, value) in tags.iter() {
                        if let Some(pos) = columns.iter().position(|c| c == column) {
                            cells[pos] = value.clone();
                        }
                    }
                    records.push(Record { source, cells });
                }
                SourceStatus::Loaded { rows: num_rows }
            }
            None => SourceStatus::Missing,
        };
        loaded.push(Source {
            path: spec.path,
            tags,
            status,
        });
    }

    Ok(Dataset {
        columns,
        records,
        sources: loaded,
    })
}
