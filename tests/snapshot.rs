mod common;

use std::io::Write;
use tls_probe_engine::model::{DetailLevel, OutputFormat, ScanConfig};
use tls_probe_engine::output::write_plan;
use tls_probe_engine::plan::{plan_invalid_curve, total_trials};
use tls_probe_engine::report::Report;

#[tokio::test]
async fn plans_from_a_snapshot_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string_pretty(&common::full_report()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let report = Report::load(file.path()).await.unwrap();
    assert_eq!(report.host, "example.com");

    let cfg = ScanConfig {
        host: report.host.clone(),
        detail: DetailLevel::Detailed,
        ..ScanConfig::default()
    };
    let plan = plan_invalid_curve(&report, &cfg);
    assert!(!plan.is_empty());
    assert!(plan.iter().all(|vector| vector.trials.is_some()));
    assert!(total_trials(&plan) >= plan.len() as u64);

    let mut out = Vec::new();
    write_plan(OutputFormat::Jsonl, &mut out, &plan).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), plan.len());
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value["version"].is_string());
        assert!(value["trials"].as_u64().unwrap() >= 1);
    }
}

#[tokio::test]
async fn malformed_snapshot_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"host\": 42}").unwrap();
    let err = Report::load(file.path()).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse snapshot"));
}

#[tokio::test]
async fn missing_snapshot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = Report::load(&dir.path().join("absent.json")).await.unwrap_err();
    assert!(format!("{err:#}").contains("failed to read snapshot"));
}

#[tokio::test]
async fn empty_report_plans_nothing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{\"host\": \"example.org\"}").unwrap();
    let report = Report::load(file.path()).await.unwrap();
    let plan = plan_invalid_curve(&report, &ScanConfig::default());
    assert!(plan.is_empty());

    let mut out = Vec::new();
    write_plan(OutputFormat::Pretty, &mut out, &plan).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "0 vectors, 0 handshakes\n");
}
