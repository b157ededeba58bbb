pub mod handshake;
pub mod scripted;

use crate::model::ScanConfig;
use crate::probe::{Probe, ProbeKind, ProbeState};
use crate::report::{PerformanceRecord, ReportStore};
use crate::util::{now_millis, now_utc};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Final state of every probe handed to [`Scheduler::run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub states: BTreeMap<ProbeKind, ProbeState>,
}

impl ScanSummary {
    pub fn state(&self, kind: ProbeKind) -> Option<ProbeState> {
        self.states.get(&kind).copied()
    }

    pub fn count(&self, state: ProbeState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }
}

/// Runs probes against one shared report as soon as their dependencies are
/// met, at most `concurrency` at a time.
pub struct Scheduler {
    cfg: ScanConfig,
    store: ReportStore,
    sem: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(cfg: ScanConfig, store: ReportStore) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self {
            sem: Arc::new(Semaphore::new(cfg.concurrency)),
            cfg,
            store,
        })
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Launches every runnable probe, and re-checks the rest each time one
    /// finishes. When nothing is running and nothing is runnable the rest are
    /// skipped with their not-executed result.
    ///
    /// Each probe kind runs at most once per report: duplicates are dropped
    /// and kinds the report already marks executed are skipped.
    #[instrument(skip(self, probes), fields(target = %self.cfg.host, probes = probes.len()))]
    pub async fn run(&self, probes: Vec<Box<dyn Probe>>) -> anyhow::Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        let mut pending: Vec<Box<dyn Probe>> = Vec::with_capacity(probes.len());
        for probe in probes {
            let kind = probe.kind();
            if summary.states.contains_key(&kind) {
                warn!(probe = %kind, "duplicate probe kind, dropping it");
                continue;
            }
            if self.store.is_probe_executed(kind) {
                info!(probe = %kind, "probe already ran against this report");
                summary.states.insert(kind, ProbeState::Skipped);
                continue;
            }
            summary.states.insert(kind, ProbeState::Pending);
            pending.push(probe);
        }

        let mut tasks = FuturesUnordered::new();
        loop {
            let snapshot = self.store.snapshot();
            let mut waiting = Vec::with_capacity(pending.len());
            for mut probe in pending {
                if !probe.can_run(&snapshot) {
                    waiting.push(probe);
                    continue;
                }
                let kind = probe.kind();
                if !self.store.claim_probe(kind) {
                    info!(probe = %kind, "probe claimed by another scan of this report");
                    summary.states.insert(kind, ProbeState::Skipped);
                    continue;
                }
                summary.states.insert(kind, ProbeState::Adjusting);
                probe.adjust_config(&snapshot);
                summary.states.insert(kind, ProbeState::Executing);
                debug!(probe = %kind, "launching probe");
                tasks.push(self.launch(probe));
            }
            pending = waiting;

            let Some((kind, state)) = tasks.next().await else {
                break;
            };
            summary.states.insert(kind, state);
        }

        if !pending.is_empty() {
            self.store.update(|report| {
                for probe in &pending {
                    let kind = probe.kind();
                    if report.is_probe_executed(kind) {
                        continue;
                    }
                    info!(probe = %kind, "dependencies never met, skipping probe");
                    report.merge(probe.not_executed_result());
                }
            });
            for probe in &pending {
                summary.states.insert(probe.kind(), ProbeState::Skipped);
            }
        }

        info!(
            completed = summary.count(ProbeState::Completed),
            failed = summary.count(ProbeState::Failed),
            skipped = summary.count(ProbeState::Skipped),
            "scan finished"
        );
        Ok(summary)
    }

    /// Spawns one probe; resolves to its kind and final state once its result
    /// is merged.
    fn launch(&self, probe: Box<dyn Probe>) -> BoxFuture<'static, (ProbeKind, ProbeState)> {
        let kind = probe.kind();
        let sem = self.sem.clone();
        let store = self.store.clone();
        let probe_timeout = self.cfg.probe_timeout;

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await;
            let started = now_utc();
            let start = now_millis();

            let outcome = timeout(
                probe_timeout,
                AssertUnwindSafe(probe.execute_test()).catch_unwind(),
            )
            .await;
            let (result, state) = match outcome {
                Ok(Ok(result)) => (result, ProbeState::Completed),
                Ok(Err(_)) => {
                    error!(probe = %kind, "probe panicked");
                    (probe.error_result(), ProbeState::Failed)
                }
                Err(_) => {
                    warn!(probe = %kind, "probe timed out");
                    (probe.error_result(), ProbeState::Failed)
                }
            };

            let record = PerformanceRecord {
                probe: kind,
                started,
                finished: now_utc(),
            };
            store.update(|report| {
                report.merge(result);
                report.performance.push(record);
            });
            debug!(probe = %kind, ms = now_millis() - start, "probe finished");
            state
        });

        async move {
            match handle.await {
                Ok(state) => (kind, state),
                Err(err) => {
                    error!(probe = %kind, error = %err, "probe task aborted");
                    (kind, ProbeState::Failed)
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TestResult;
    use crate::probe::sni::SniResult;
    use crate::probe::ProbeResult;
    use crate::report::{Property, Report};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedProbe {
        wants: Option<Property>,
        answer: TestResult,
    }

    #[async_trait]
    impl Probe for FixedProbe {
        fn kind(&self) -> ProbeKind {
            ProbeKind::Sni
        }

        fn can_run(&self, report: &Report) -> bool {
            self.wants
                .map(|property| report.result(property).is_true())
                .unwrap_or(true)
        }

        fn adjust_config(&mut self, _report: &Report) {}

        async fn execute_test(&self) -> ProbeResult {
            ProbeResult::Sni(SniResult {
                requires_sni: self.answer,
            })
        }

        fn not_executed_result(&self) -> ProbeResult {
            ProbeResult::Sni(SniResult {
                requires_sni: TestResult::CouldNotTest,
            })
        }

        fn error_result(&self) -> ProbeResult {
            ProbeResult::Sni(SniResult {
                requires_sni: TestResult::ErrorDuringTest,
            })
        }
    }

    #[tokio::test]
    async fn runs_probe_and_records_performance() {
        let store = ReportStore::new("example.com");
        let scheduler = Scheduler::new(ScanConfig::default(), store.clone()).unwrap();
        let probe = FixedProbe {
            wants: None,
            answer: TestResult::True,
        };
        let summary = scheduler.run(vec![Box::new(probe)]).await.unwrap();
        assert_eq!(summary.state(ProbeKind::Sni), Some(ProbeState::Completed));

        let report = store.snapshot();
        assert_eq!(report.result(Property::RequiresSni), TestResult::True);
        assert!(report.is_probe_executed(ProbeKind::Sni));
        assert_eq!(report.performance.len(), 1);
    }

    #[tokio::test]
    async fn skips_probe_whose_dependency_never_appears() {
        let store = ReportStore::new("example.com");
        let scheduler = Scheduler::new(ScanConfig::default(), store.clone()).unwrap();
        let probe = FixedProbe {
            wants: Some(Property::SupportsHttps),
            answer: TestResult::True,
        };
        let summary = scheduler.run(vec![Box::new(probe)]).await.unwrap();
        assert_eq!(summary.state(ProbeKind::Sni), Some(ProbeState::Skipped));
        let report = store.snapshot();
        assert_eq!(report.result(Property::RequiresSni), TestResult::CouldNotTest);
        assert!(!report.is_probe_executed(ProbeKind::Sni));
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = ScanConfig {
            probe_timeout: Duration::ZERO,
            ..ScanConfig::default()
        };
        assert!(Scheduler::new(cfg, ReportStore::default()).is_err());
    }
}
