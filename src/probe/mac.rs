//! Record MAC verification oracle.
//!
//! Flips one bit per MAC byte of a client record and checks whether the peer
//! notices. A peer that verifies only part of the tag lets an attacker forge
//! records with far less work than the tag length suggests.

use super::{Probe, ProbeKind, ProbeResult};
use crate::engine::handshake::{
    run_scoped, ExchangePlan, HandshakeEngine, MacTamper, ProtocolOptions, TamperedRecord,
    Workflow,
};
use crate::model::ScanConfig;
use crate::oracle::{CheckPattern, MessageKind, ResponseFingerprint};
use crate::report::{Property, Report};
use crate::tls::{CipherSuite, ExtensionType, ProtocolVersion};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

const TAMPER_MASK: u8 = 0x01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacResult {
    pub app_data: CheckPattern,
    pub finished: CheckPattern,
}

impl MacResult {
    pub(crate) fn merge_into(self, report: &mut Report) {
        report.put_result(Property::ChecksMacAppdata, self.app_data.verdict());
        report.put_result(Property::ChecksMacFinished, self.finished.verdict());
        report.mac_check_pattern_app_data = Some(self.app_data);
        report.mac_check_pattern_finished = Some(self.finished);
    }
}

pub struct MacProbe {
    config: ScanConfig,
    engine: Arc<dyn HandshakeEngine>,
    suite: Option<CipherSuite>,
    version: ProtocolVersion,
}

impl MacProbe {
    pub fn new(config: ScanConfig, engine: Arc<dyn HandshakeEngine>) -> Self {
        Self {
            config,
            engine,
            suite: None,
            version: ProtocolVersion::Tls12,
        }
    }

    fn plan(&self, suite: CipherSuite, workflow: Workflow) -> ExchangePlan {
        let mut options = ProtocolOptions::new(self.version)
            .with_extension(ExtensionType::RenegotiationInfo)
            .with_extension(ExtensionType::ServerNameIndication);
        options.cipher_suites = vec![suite];
        options.server_name = Some(self.config.host.clone());
        options.application_data =
            Some(format!("GET / HTTP/1.0\nHost: {}\n\n\n", self.config.host).into_bytes());
        ExchangePlan::new(options, workflow)
    }

    async fn scan(&self) -> anyhow::Result<MacResult> {
        let suite = self.suite.context("no cipher suite with a record MAC was selected")?;
        let mac_size = suite
            .mac_size()
            .with_context(|| format!("{suite} has no record MAC"))?;

        let reference = run_scoped(self.engine.as_ref(), &self.plan(suite, Workflow::Full))
            .await
            .context("reference exchange failed")?
            .fingerprint;

        let app_data = self
            .byte_check_map(suite, TamperedRecord::ApplicationData, mac_size, &reference)
            .await;
        let finished = self
            .byte_check_map(suite, TamperedRecord::Finished, mac_size, &reference)
            .await;
        Ok(MacResult { app_data, finished })
    }

    /// One exchange per MAC byte. An offset counts as checked when the peer
    /// reacted differently from the reference, or for Finished when it never
    /// sent its own Finished.
    async fn byte_check_map(
        &self,
        suite: CipherSuite,
        record: TamperedRecord,
        mac_size: usize,
        reference: &ResponseFingerprint,
    ) -> CheckPattern {
        let workflow = match record {
            TamperedRecord::ApplicationData => Workflow::Full,
            TamperedRecord::Finished => Workflow::Handshake,
        };
        let mut checked = Vec::with_capacity(mac_size);
        for offset in 0..mac_size {
            let plan = self.plan(suite, workflow.clone()).with_tamper(MacTamper {
                record,
                offset,
                mask: TAMPER_MASK,
            });
            let execution = match run_scoped(self.engine.as_ref(), &plan).await {
                Ok(execution) => execution,
                Err(err) => {
                    warn!(offset, ?record, error = %err, "tampered exchange failed");
                    return CheckPattern::erroneous();
                }
            };
            checked.push(match record {
                TamperedRecord::ApplicationData => {
                    !execution.fingerprint.compare(reference).is_none()
                }
                TamperedRecord::Finished => !execution.received(MessageKind::Finished),
            });
        }
        debug!(?record, ?checked, "byte check map");
        CheckPattern::classify(checked)
    }
}

#[async_trait]
impl Probe for MacProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Mac
    }

    fn can_run(&self, report: &Report) -> bool {
        report.cipher_suites().into_iter().any(CipherSuite::uses_mac)
    }

    fn adjust_config(&mut self, report: &Report) {
        self.suite = report.cipher_suites().into_iter().find(|suite| suite.uses_mac());
        let Some(suite) = self.suite else {
            return;
        };
        // highest legacy version that offered the suite
        if let Some(map) = &report.version_suites {
            if let Some(version) = ProtocolVersion::LEGACY_DESCENDING
                .into_iter()
                .find(|version| map.get(version).is_some_and(|list| list.contains(&suite)))
            {
                self.version = version;
            }
        }
    }

    #[instrument(skip(self), fields(target = %self.config.host))]
    async fn execute_test(&self) -> ProbeResult {
        match self.scan().await {
            Ok(result) => ProbeResult::Mac(result),
            Err(err) => {
                error!(error = %err, "could not scan for mac checks");
                self.error_result()
            }
        }
    }

    fn not_executed_result(&self) -> ProbeResult {
        ProbeResult::Mac(MacResult {
            app_data: CheckPattern::unknown(),
            finished: CheckPattern::unknown(),
        })
    }

    fn error_result(&self) -> ProbeResult {
        ProbeResult::Mac(MacResult {
            app_data: CheckPattern::erroneous(),
            finished: CheckPattern::erroneous(),
        })
    }
}
