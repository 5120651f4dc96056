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
//! Module to write a [`SummaryTable`] to CSV.
use std::{fs, path::Path};

use crate::{
    aggregate::{format_number, SummaryTable},
    Result,
};

/// Format a metric value. Integral values keep one fractional digit (`50.0`), absent values are
/// written as empty cells.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(x) if x.fract() == 0.0 && x.abs() < 1e15 => format!("{x:.1}"),
        Some(x) => format_number(x),
        None => String::new(),
    }
}

/// Write `table` to `path`, overwriting any existing file. The key column comes first, followed by
/// the metrics in the order they were requested.
pub fn persist(table: &SummaryTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut csv = csv::WriterBuilder::new().from_writer(
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(false)
            .truncate(true)
            .open(path)?,
    );

    csv.write_record(std::iter::once(table.key_column()).chain(table.metrics().iter().map(String::as_str)))?;
    for row in table.rows() {
        csv.write_record(
            std::iter::once(row.key.to_string()).chain(row.values.iter().map(|v| format_value(*v))),
        )?;
    }
    csv.flush()?;

    log::debug!("Wrote {} rows to {path:?}", table.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aggregate::{GroupKey, SummaryRow};

    fn table() -> SummaryTable {
        SummaryTable::new(
            "Probability(%)",
            vec!["StopAndWait_avgAck(ms)".into(), "GoBackN_avgAck(ms)".into()],
            vec![
                SummaryRow {
                    key: GroupKey::number(80.0).unwrap(),
                    values: vec![Some(12.25), Some(3.0)],
                },
                SummaryRow {
                    key: GroupKey::number(95.0).unwrap(),
                    values: vec![None, Some(0.5)],
                },
            ],
        )
    }

    #[test]
    fn write_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("performance_metrics.csv");
        persist(&table(), &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Probability(%),StopAndWait_avgAck(ms),GoBackN_avgAck(ms)\n80,12.25,3.0\n95,,0.5\n"
        );
    }

    #[test]
    fn overwrite_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        fs::write(&path, "stale content that is longer than the table itself\n".repeat(10)).unwrap();
        persist(&table(), &path).unwrap();
        let first = fs::read(&path).unwrap();
        persist(&table(), &path).unwrap();
        assert_eq!(first, fs::read(&path).unwrap());
    }
}
