//! HTTP false start: send the request before the server's Finished and see
//! whether the server answers it.

use super::{Probe, ProbeKind, ProbeResult};
use crate::engine::handshake::{run_scoped, ExchangePlan, HandshakeEngine, ProtocolOptions, Workflow};
use crate::model::{ScanConfig, TestResult};
use crate::oracle::MessageKind;
use crate::report::{Property, Report};
use crate::tls::{CipherSuite, ExtensionType, NamedGroup, PointFormat, ProtocolVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};

/// Offered when the report has no suite list yet.
const FALLBACK_SUITES: [CipherSuite; 4] = [
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
];

const FALLBACK_GROUPS: [NamedGroup; 3] = [
    NamedGroup::X25519,
    NamedGroup::Secp256r1,
    NamedGroup::Secp384r1,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpFalseStartResult {
    pub supports_false_start: TestResult,
}

impl HttpFalseStartResult {
    pub(crate) fn merge_into(self, report: &mut Report) {
        report.put_result(Property::SupportsHttpFalseStart, self.supports_false_start);
    }
}

pub struct HttpFalseStartProbe {
    config: ScanConfig,
    engine: Arc<dyn HandshakeEngine>,
    suites: Vec<CipherSuite>,
    groups: Vec<NamedGroup>,
}

impl HttpFalseStartProbe {
    pub fn new(config: ScanConfig, engine: Arc<dyn HandshakeEngine>) -> Self {
        Self {
            config,
            engine,
            suites: FALLBACK_SUITES.to_vec(),
            groups: FALLBACK_GROUPS.to_vec(),
        }
    }

    fn plan(&self) -> ExchangePlan {
        let mut options = ProtocolOptions::new(ProtocolVersion::Tls12)
            .with_extension(ExtensionType::EcPointFormats)
            .with_extension(ExtensionType::SupportedGroups)
            .with_extension(ExtensionType::SignatureAndHashAlgorithms)
            .with_extension(ExtensionType::RenegotiationInfo)
            .with_extension(ExtensionType::ServerNameIndication);
        options.cipher_suites = self.suites.clone();
        options.groups = self.groups.clone();
        options.point_formats = vec![PointFormat::Uncompressed];
        options.server_name = Some(self.config.host.clone());
        options.application_data =
            Some(format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", self.config.host).into_bytes());
        ExchangePlan::new(options, Workflow::FalseStart)
    }
}

#[async_trait]
impl Probe for HttpFalseStartProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::HttpFalseStart
    }

    fn can_run(&self, report: &Report) -> bool {
        report.result(Property::SupportsHttps).is_true()
    }

    fn adjust_config(&mut self, report: &Report) {
        let suites: Vec<_> = report
            .cipher_suites()
            .into_iter()
            .filter(|suite| !suite.is_tls13())
            .collect();
        if !suites.is_empty() {
            self.suites = suites;
        }
        if let Some(groups) = report.supported_groups.as_ref().filter(|g| !g.is_empty()) {
            self.groups = groups.clone();
        }
    }

    #[instrument(skip(self), fields(target = %self.config.host))]
    async fn execute_test(&self) -> ProbeResult {
        let supports_false_start = match run_scoped(self.engine.as_ref(), &self.plan()).await {
            Ok(execution) if execution.received(MessageKind::HttpResponse) => TestResult::True,
            // no Finished means the early request broke the handshake
            Ok(execution) if !execution.received(MessageKind::Finished) => TestResult::False,
            // Finished but no answer; the server may not have understood the request
            Ok(_) => TestResult::Uncertain,
            Err(err) => {
                error!(error = %err, "false start exchange failed");
                TestResult::ErrorDuringTest
            }
        };
        ProbeResult::HttpFalseStart(HttpFalseStartResult {
            supports_false_start,
        })
    }

    fn not_executed_result(&self) -> ProbeResult {
        ProbeResult::HttpFalseStart(HttpFalseStartResult {
            supports_false_start: TestResult::CouldNotTest,
        })
    }

    fn error_result(&self) -> ProbeResult {
        ProbeResult::HttpFalseStart(HttpFalseStartResult {
            supports_false_start: TestResult::ErrorDuringTest,
        })
    }
}
