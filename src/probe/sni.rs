//! Checks whether the server only answers hellos that name it.

use super::{Probe, ProbeKind, ProbeResult};
use crate::engine::handshake::{run_scoped, ExchangePlan, HandshakeEngine, ProtocolOptions, Workflow};
use crate::model::{ScanConfig, TestResult};
use crate::oracle::MessageKind;
use crate::report::{Property, Report};
use crate::tls::{ExtensionType, ProtocolVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SniResult {
    pub requires_sni: TestResult,
}

impl SniResult {
    pub(crate) fn merge_into(self, report: &mut Report) {
        report.put_result(Property::RequiresSni, self.requires_sni);
    }
}

pub struct SniProbe {
    config: ScanConfig,
    engine: Arc<dyn HandshakeEngine>,
    version: ProtocolVersion,
}

impl SniProbe {
    pub fn new(config: ScanConfig, engine: Arc<dyn HandshakeEngine>) -> Self {
        Self {
            config,
            engine,
            version: ProtocolVersion::Tls12,
        }
    }

    async fn server_hello(&self, with_sni: bool) -> bool {
        let mut options =
            ProtocolOptions::new(self.version).with_extension(ExtensionType::RenegotiationInfo);
        if with_sni {
            options = options.with_extension(ExtensionType::ServerNameIndication);
            options.server_name = Some(self.config.host.clone());
        }
        let plan = ExchangePlan::new(options, Workflow::Hello);
        match run_scoped(self.engine.as_ref(), &plan).await {
            Ok(execution) => execution.received(MessageKind::ServerHello),
            Err(err) => {
                debug!(with_sni, error = %err, "hello exchange failed");
                false
            }
        }
    }
}

#[async_trait]
impl Probe for SniProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Sni
    }

    fn can_run(&self, _report: &Report) -> bool {
        true
    }

    fn adjust_config(&mut self, report: &Report) {
        if let Some(version) = report
            .versions
            .as_ref()
            .and_then(|versions| versions.iter().max())
        {
            self.version = *version;
        }
    }

    #[instrument(skip(self), fields(target = %self.config.host))]
    async fn execute_test(&self) -> ProbeResult {
        let requires_sni = if self.server_hello(false).await {
            TestResult::False
        } else if self.server_hello(true).await {
            TestResult::True
        } else {
            warn!("no server hello with or without sni");
            TestResult::ErrorDuringTest
        };
        ProbeResult::Sni(SniResult { requires_sni })
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
