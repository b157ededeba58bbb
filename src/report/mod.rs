mod property;

pub use property::Property;

use crate::model::TestResult;
use crate::oracle::pattern::CheckPattern;
use crate::probe::invalid_curve::InvalidCurveResponse;
use crate::probe::{ProbeKind, ProbeResult};
use crate::tls::{CipherSuite, ExtensionType, NamedGroup, ProtocolVersion};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Start and end of one probe run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub probe: ProbeKind,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Everything known about one scan target.
///
/// Supported dimensions are `None` until the probe that discovers them has
/// run; dependent probes treat `None` as a missing dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    results: BTreeMap<Property, TestResult>,
    #[serde(default)]
    pub executed_probes: BTreeSet<ProbeKind>,
    #[serde(default)]
    pub performance: Vec<PerformanceRecord>,

    #[serde(default)]
    pub versions: Option<Vec<ProtocolVersion>>,
    #[serde(default)]
    pub supported_groups: Option<Vec<NamedGroup>>,
    #[serde(default)]
    pub supported_tls13_groups: Option<Vec<NamedGroup>>,
    #[serde(default)]
    pub version_suites: Option<BTreeMap<ProtocolVersion, Vec<CipherSuite>>>,
    #[serde(default)]
    pub supported_extensions: Option<Vec<ExtensionType>>,

    #[serde(default)]
    pub invalid_curve_responses: Vec<InvalidCurveResponse>,
    #[serde(default)]
    pub mac_check_pattern_app_data: Option<CheckPattern>,
    #[serde(default)]
    pub mac_check_pattern_finished: Option<CheckPattern>,
}

impl Report {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            created_at: Some(crate::util::now_utc()),
            ..Self::default()
        }
    }

    /// Verdict for `property`, `NotTestedYet` when nothing was written.
    pub fn result(&self, property: Property) -> TestResult {
        self.results.get(&property).copied().unwrap_or_default()
    }

    pub fn put_result(&mut self, property: Property, result: impl Into<TestResult>) {
        self.results.insert(property, result.into());
    }

    pub fn results(&self) -> &BTreeMap<Property, TestResult> {
        &self.results
    }

    /// Union of all suites seen across versions.
    pub fn cipher_suites(&self) -> BTreeSet<CipherSuite> {
        self.version_suites
            .iter()
            .flat_map(|map| map.values())
            .flatten()
            .copied()
            .collect()
    }

    pub fn is_probe_executed(&self, kind: ProbeKind) -> bool {
        self.executed_probes.contains(&kind)
    }

    pub fn mark_probe_executed(&mut self, kind: ProbeKind) {
        self.executed_probes.insert(kind);
    }

    /// Scalars overwrite, typed lists append.
    pub fn merge(&mut self, result: ProbeResult) {
        result.merge_into(self);
    }

    /// Reads a report previously written as JSON.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }
}

/// Shared handle to the one report of a scan; every access takes the same
/// lock, so readers never see a half-applied merge.
#[derive(Clone, Debug, Default)]
pub struct ReportStore {
    inner: Arc<Mutex<Report>>,
}

impl ReportStore {
    pub fn new(host: impl Into<String>) -> Self {
        Self::from_report(Report::new(host))
    }

    pub fn from_report(report: Report) -> Self {
        Self {
            inner: Arc::new(Mutex::new(report)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Report> {
        // Every mutation is a single insert or append, so a poisoned lock
        // still holds a consistent report.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn result(&self, property: Property) -> TestResult {
        self.lock().result(property)
    }

    pub fn put_result(&self, property: Property, result: impl Into<TestResult>) {
        self.lock().put_result(property, result);
    }

    pub fn is_probe_executed(&self, kind: ProbeKind) -> bool {
        self.lock().is_probe_executed(kind)
    }

    /// Marks `kind` executed unless it already was. Returns false when some
    /// other scan of this report got there first.
    pub fn claim_probe(&self, kind: ProbeKind) -> bool {
        let mut report = self.lock();
        if report.is_probe_executed(kind) {
            return false;
        }
        report.mark_probe_executed(kind);
        true
    }

    pub fn merge(&self, result: ProbeResult) {
        self.lock().merge(result);
    }

    /// Point-in-time copy for `can_run` and `adjust_config`.
    pub fn snapshot(&self) -> Report {
        self.lock().clone()
    }

    /// Applies a batch of writes under one lock acquisition.
    pub fn update<R>(&self, f: impl FnOnce(&mut Report) -> R) -> R {
        f(&mut self.lock())
    }

    /// Hands the report over at the end of the scan.
    pub fn into_report(self) -> Report {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => shared
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::sni::SniResult;

    #[test]
    fn unknown_properties_read_not_tested_yet() {
        let store = ReportStore::new("example.com");
        assert_eq!(store.result(Property::SupportsTls13), TestResult::NotTestedYet);
        assert_eq!(
            store.result(Property::VulnerableToInvalidCurveTwist),
            TestResult::NotTestedYet
        );
    }

    #[test]
    fn last_write_wins() {
        let store = ReportStore::new("example.com");
        store.put_result(Property::SupportsTls12, TestResult::True);
        assert_eq!(store.result(Property::SupportsTls12), TestResult::True);
        store.put_result(Property::SupportsTls12, false);
        assert_eq!(store.result(Property::SupportsTls12), TestResult::False);
    }

    #[test]
    fn merge_writes_probe_properties_and_marks_nothing_else() {
        let store = ReportStore::new("example.com");
        store.merge(ProbeResult::Sni(SniResult {
            requires_sni: TestResult::True,
        }));
        let report = store.into_report();
        assert_eq!(report.result(Property::RequiresSni), TestResult::True);
        assert_eq!(report.results().len(), 1);
    }

    #[test]
    fn a_probe_kind_is_claimed_once() {
        let store = ReportStore::new("example.com");
        assert!(store.claim_probe(ProbeKind::Mac));
        assert!(!store.claim_probe(ProbeKind::Mac));
        assert!(store.is_probe_executed(ProbeKind::Mac));
        assert!(store.claim_probe(ProbeKind::Sni));
    }

    #[test]
    fn collects_suites_across_versions() {
        let mut report = Report::new("example.com");
        let mut map = BTreeMap::new();
        map.insert(
            ProtocolVersion::Tls12,
            vec![
                CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            ],
        );
        map.insert(
            ProtocolVersion::Tls11,
            vec![CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA],
        );
        report.version_suites = Some(map);
        assert_eq!(report.cipher_suites().len(), 2);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut report = Report::new("example.com");
        report.put_result(Property::SupportsTls13, TestResult::True);
        report.supported_groups = Some(vec![NamedGroup::Secp256r1, NamedGroup::X25519]);
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back.result(Property::SupportsTls13), TestResult::True);
        assert_eq!(back.supported_groups, report.supported_groups);
    }
}
