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
//! Utility module collection of functions

use std::{
    env,
    path::{Path, PathBuf},
};

/// Install `pretty_env_logger` on stderr. Logs at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a logger may already be installed, e.g., when running several reports in tests
    let _ = builder.try_init();
}

/// Directory containing `path`, or the current directory for bare file names.
pub fn parent_dir(path: impl AsRef<Path>) -> PathBuf {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;

    /// Append `p` after substituting the first `{}` with `value`.
    fn then_fmt(self, p: impl AsRef<str>, value: &str) -> PathBuf {
        self.then(p.as_ref().replacen("{}", value, 1))
    }
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(parent_dir("raw_results.csv"), PathBuf::from("."));
        assert_eq!(
            parent_dir("Assignments/Assignment4/raw_results.csv"),
            PathBuf::from("Assignments/Assignment4")
        );
        assert_eq!(
            Path::new("data").then_fmt("csvframe_times_go_back_n{}.csv", "85"),
            PathBuf::from("data/csvframe_times_go_back_n85.csv")
        );
    }
}
