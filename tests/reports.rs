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
use std::{fs, path::Path};

use labstats::{
    aggregate::GroupKey,
    render::JsonRenderer,
    reports::{arq, csma, detection, run_with, stations, Report, ReportArgs},
    Error,
};

fn write(path: impl AsRef<Path>, content: &str) {
    fs::write(path, content).unwrap();
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn detection_rates_per_error_type() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("detected_frames.csv");
    write(
        &input,
        "errorType,checksum,crc8,crc10,crc16,crc32\n\
         0,1,1,1,1,1\n\
         1,1,1,1,1,1\n\
         1,0,1,1,1,1\n\
         4,0,0,1,1,1\n\
         4,1,0,0,1,1\n",
    );

    let outcome = detection::run(&detection::Config::new(&input, None), &JsonRenderer).unwrap();
    assert_eq!(
        read(dir.path().join("performance_metrics.csv")),
        "errorType,checksum,crc8,crc10,crc16,crc32\n\
         None,100.0,100.0,100.0,100.0,100.0\n\
         Single,50.0,100.0,100.0,100.0,100.0\n\
         Burst,50.0,0.0,50.0,100.0,100.0\n"
    );

    let chart = read(dir.path().join("detection_histogram.json"));
    assert!(chart.contains("\"GroupedBar\""));
    assert!(chart.contains("\"Crc32\""));
    assert!(chart.contains("Detection Rate per Error Type and Scheme"));
    assert_eq!(outcome.written.len(), 2);
}

#[test]
fn detection_requires_its_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("detected_frames.csv");
    let result = detection::run(&detection::Config::new(&input, None), &JsonRenderer);
    assert!(matches!(result, Err(Error::MissingInput(p)) if p == input));
}

#[test]
fn detection_requires_scheme_columns() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("detected_frames.csv");
    write(&input, "errorType,checksum,crc8,crc10,crc16\n0,1,1,1,1\n");
    let result = detection::run(&detection::Config::new(&input, None), &JsonRenderer);
    assert!(matches!(result, Err(Error::Schema { column }) if column == "crc32"));
}

#[test]
fn arq_missing_files_leave_empty_cells() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path().join("csvframe_times_stop_and_wait80.csv"),
        "Frame,AckTime(ms)\n1,2\n2,4\n",
    );
    write(
        dir.path().join("csvframe_times_go_back_n80.csv"),
        "Frame,AckTime(ms)\n1,5\n",
    );
    write(
        dir.path().join("csvframe_times_selective_repeat100.csv"),
        "Frame,AckTime(ms)\n1,1.5\n2,NA\n",
    );

    let outcome = arq::run(&arq::Config::new(dir.path(), None), &JsonRenderer).unwrap();
    assert_eq!(outcome.summary.len(), 5);
    assert_eq!(
        read(dir.path().join("performance_metrics.csv")),
        "Probability(%),StopAndWait_avgAck(ms),GoBackN_avgAck(ms),SelectiveRepeat_avgAck(ms)\n\
         80,3.0,5.0,\n\
         85,,,\n\
         90,,,\n\
         95,,,\n\
         100,,,1.5\n"
    );
    assert!(read(dir.path().join("arq_comparison_histogram.json")).contains("\"Go-Back-N\""));
}

#[test]
fn arq_excludes_non_numeric_ack_times() {
    let dir = tempfile::tempdir().unwrap();
    let files = [
        (80, "1,4\n2,timeout\n"),
        (85, "1,NA\n2,6\n"),
        (90, "1,2.5\n2,-\n"),
        (95, "1,lost\n2,8\n"),
        (100, "1,1\n2,\n"),
    ];
    for (prob, rows) in files {
        write(
            dir.path().join(format!("csvframe_times_go_back_n{prob}.csv")),
            &format!("Frame,AckTime(ms)\n{rows}"),
        );
    }

    let outcome = arq::run(&arq::Config::new(dir.path(), None), &JsonRenderer).unwrap();
    assert_eq!(
        outcome.summary.column("GoBackN_avgAck(ms)").unwrap(),
        vec![Some(4.0), Some(6.0), Some(2.5), Some(8.0), Some(1.0)]
    );
    assert_eq!(
        read(dir.path().join("performance_metrics.csv")),
        "Probability(%),StopAndWait_avgAck(ms),GoBackN_avgAck(ms),SelectiveRepeat_avgAck(ms)\n\
         80,,4.0,\n\
         85,,6.0,\n\
         90,,2.5,\n\
         95,,8.0,\n\
         100,,1.0,\n"
    );
}

#[test]
fn arq_without_any_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = arq::run(&arq::Config::new(dir.path(), None), &JsonRenderer);
    assert!(matches!(result, Err(Error::Load { attempted }) if attempted.len() == 15));
}

#[test]
fn csma_combined_results() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("combined_results.csv");
    write(
        &input,
        "p,Throughput,Average_Delay,Efficiency,Collision_Rate\n\
         0.5,3000,20,0.8,0.3\n\
         0.1,1000,50,0.4,0.1\n",
    );

    let config = csma::Config::new(csma::Input::Combined(input), None);
    let outcome = csma::run(&config, &JsonRenderer).unwrap();
    assert_eq!(
        read(dir.path().join("csma_summary.csv")),
        "p,Throughput,Average_Delay,Efficiency,Collision_Rate\n\
         0.1,1000.0,50.0,0.4,0.1\n\
         0.5,3000.0,20.0,0.8,0.3\n"
    );
    let analysis = outcome.analysis.unwrap();
    assert!(analysis.contains("Maximum Throughput: p = 0.5 (3000.00 bits/sec)"));
    assert!(analysis.contains("Minimum Delay: p = 0.5 (20.00 ms)"));
    assert!(dir.path().join("performance_comparison.json").exists());
    let analysis_chart = read(dir.path().join("throughput_delay_analysis.json"));
    assert!(analysis_chart.contains("\"p=0.1\""));
    assert_eq!(outcome.written.len(), 3);
}

#[test]
fn csma_per_run_results() {
    let dir = tempfile::tempdir().unwrap();
    let header = "bitsAttempted,bitsSuccessful,collisions,framesDelivered,avgDelayMs,throughputBps,simTimeMs\n";
    write(
        dir.path().join("csma_cd_results_0.1.csv"),
        &format!("{header}1000,800,2,8,12.5,400,2000\n"),
    );
    write(
        dir.path().join("csma_cd_results_0.5.csv"),
        &format!("{header}1000,500,5,5,20,250,2000\n"),
    );

    let outcome = csma::run(&csma::Config::new(csma::Input::per_run(dir.path()), None), &JsonRenderer).unwrap();
    let summary = &outcome.summary;
    assert_eq!(summary.len(), 10);
    let p = |x: f64| GroupKey::number(x).unwrap();
    assert_eq!(summary.value(&p(0.1), csma::EFFICIENCY), Some(0.8));
    assert_eq!(summary.value(&p(0.1), csma::COLLISION_RATE), Some(0.25));
    assert_eq!(summary.value(&p(0.5), csma::COLLISION_RATE), Some(1.0));
    assert_eq!(summary.value(&p(0.5), csma::THROUGHPUT), Some(250.0));
    assert_eq!(summary.value(&p(0.7), csma::THROUGHPUT), None);
    assert!(read(dir.path().join("csma_summary.csv")).contains("\n0.1,400.0,12.5,0.8,0.25\n"));
}

#[test]
fn station_overview() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw_results.csv");
    write(
        &input,
        "stationId,latency_ms,throughput_bps,correctness\n2,20,2000,0.5\n1,10,1000,1\n",
    );

    let outcome = stations::run(&stations::Config::new(&input, None), &JsonRenderer).unwrap();
    assert_eq!(
        outcome.analysis.as_deref(),
        Some("Stations: 2  Avg latency: 15.00 ms  Throughput: 1500.00 bps  Correctness: 0.750")
    );
    assert_eq!(
        read(dir.path().join("performance_metrics.csv")),
        "stationId,latency_ms,throughput_bps,correctness\n1,10.0,1000.0,1.0\n2,20.0,2000.0,0.5\n"
    );
    let chart = read(dir.path().join("detection_histogram.json"));
    assert!(chart.contains("\"Histogram\""));
    assert!(chart.contains("Per-station detection histogram"));
}

#[test]
fn reruns_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw_results.csv");
    write(&input, "stationId,latency_ms,throughput_bps,correctness\n1,10.25,1000,0.9\n");
    let out = dir.path().join("out");
    let args = ReportArgs {
        input: Some(input),
        output_dir: Some(out.clone()),
        ..Default::default()
    };

    run_with(Report::Stations, &args, &JsonRenderer).unwrap();
    let first = read(out.join("performance_metrics.csv"));
    run_with(Report::Stations, &args, &JsonRenderer).unwrap();
    assert_eq!(read(out.join("performance_metrics.csv")), first);
    assert_eq!(first, "stationId,latency_ms,throughput_bps,correctness\n1,10.25,1000.0,0.9\n");
}
