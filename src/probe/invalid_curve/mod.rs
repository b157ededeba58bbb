//! Invalid-curve and twist attack probe.
//!
//! Sends key shares carrying low-order points and checks whether the peer
//! completes the handshake with them while reusing its ephemeral key, which
//! would let an attacker recover the private key one residue at a time.

pub mod evaluate;
pub mod vector;

pub use evaluate::{Attempt, EvaluationContext, InvalidCurveResponse, Verdicts};
pub use vector::{generate_vectors, InvalidCurveScope, ParameterSet};

use super::{Probe, ProbeKind, ProbeResult};
use crate::engine::handshake::HandshakeEngine;
use crate::model::{ScanConfig, TestResult};
use crate::report::{Property, Report};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidCurveResult {
    pub vulnerable_classic: TestResult,
    pub vulnerable_ephemeral: TestResult,
    pub vulnerable_twist: TestResult,
    pub key_reuse: TestResult,
    pub finished_key_reuse: TestResult,
    #[serde(default)]
    pub responses: Vec<InvalidCurveResponse>,
}

impl InvalidCurveResult {
    fn uniform(result: TestResult) -> Self {
        Self {
            vulnerable_classic: result,
            vulnerable_ephemeral: result,
            vulnerable_twist: result,
            key_reuse: result,
            finished_key_reuse: result,
            responses: Vec::new(),
        }
    }

    pub fn from_responses(responses: Vec<InvalidCurveResponse>) -> Self {
        let verdicts = evaluate::aggregate(&responses);
        Self {
            vulnerable_classic: verdicts.classic,
            vulnerable_ephemeral: verdicts.ephemeral,
            vulnerable_twist: verdicts.twist,
            key_reuse: verdicts.key_reuse,
            finished_key_reuse: verdicts.finished_key_reuse,
            responses,
        }
    }

    pub(crate) fn merge_into(self, report: &mut Report) {
        report.put_result(Property::VulnerableToInvalidCurve, self.vulnerable_classic);
        report.put_result(
            Property::VulnerableToInvalidCurveEphemeral,
            self.vulnerable_ephemeral,
        );
        report.put_result(Property::VulnerableToInvalidCurveTwist, self.vulnerable_twist);
        report.put_result(Property::InvalidCurveKeyReuse, self.key_reuse);
        report.put_result(
            Property::InvalidCurveFinishedKeyReuse,
            self.finished_key_reuse,
        );
        report.invalid_curve_responses.extend(self.responses);
    }
}

pub struct InvalidCurveProbe {
    config: ScanConfig,
    engine: Arc<dyn HandshakeEngine>,
    scope: Option<InvalidCurveScope>,
}

impl InvalidCurveProbe {
    pub fn new(config: ScanConfig, engine: Arc<dyn HandshakeEngine>) -> Self {
        Self {
            config,
            engine,
            scope: None,
        }
    }

    /// Scope derived by the last `adjust_config`.
    pub fn scope(&self) -> Option<&InvalidCurveScope> {
        self.scope.as_ref()
    }

    async fn scan(&self) -> anyhow::Result<InvalidCurveResult> {
        let scope = self
            .scope
            .as_ref()
            .context("probe was executed before its configuration was adjusted")?;
        let vectors = generate_vectors(scope, self.config.detail);
        info!(vectors = vectors.len(), detail = %self.config.detail, "running invalid curve vectors");

        let context = EvaluationContext {
            error_probability: self.config.error_probability,
            secure_renegotiation: scope.supports_secure_renegotiation,
            server_name: self.config.host.clone(),
        };
        let responses = evaluate::evaluate_vectors(self.engine.as_ref(), vectors, &context).await;
        Ok(InvalidCurveResult::from_responses(responses))
    }
}

#[async_trait]
impl Probe for InvalidCurveProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::InvalidCurve
    }

    fn can_run(&self, report: &Report) -> bool {
        const DEPENDENCIES: [Property; 7] = [
            Property::SupportsClientSideSecureRenegotiation,
            Property::SupportsClientSideInsecureRenegotiation,
            Property::SupportsTls13,
            Property::SupportsTls12,
            Property::SupportsTls11,
            Property::SupportsTls10,
            Property::SupportsUncompressedPoint,
        ];
        if DEPENDENCIES
            .iter()
            .any(|property| report.result(*property) == TestResult::NotTestedYet)
            || report.supported_groups.is_none()
            || report.version_suites.is_none()
        {
            return false;
        }
        [
            Property::SupportsEcdh,
            Property::SupportsStaticEcdh,
            Property::SupportsTls13,
        ]
        .iter()
        .any(|property| report.result(*property).is_true())
    }

    fn adjust_config(&mut self, report: &Report) {
        self.scope = Some(InvalidCurveScope::from_report(report, self.config.detail));
    }

    #[instrument(skip(self), fields(target = %self.config.host))]
    async fn execute_test(&self) -> ProbeResult {
        match self.scan().await {
            Ok(result) => ProbeResult::InvalidCurve(result),
            Err(err) => {
                error!(error = %err, "could not scan for invalid curve");
                self.error_result()
            }
        }
    }

    fn not_executed_result(&self) -> ProbeResult {
        ProbeResult::InvalidCurve(InvalidCurveResult::uniform(TestResult::CouldNotTest))
    }

    fn error_result(&self) -> ProbeResult {
        ProbeResult::InvalidCurve(InvalidCurveResult::uniform(TestResult::ErrorDuringTest))
    }
}
