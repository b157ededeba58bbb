//! Runs invalid-curve vectors against the handshake engine and turns the
//! observed key exchanges into verdicts.

use super::vector::ParameterSet;
use crate::engine::handshake::{
    run_scoped, CraftedKeyShare, ExchangePlan, HandshakeEngine, ProtocolOptions, Workflow,
};
use crate::model::TestResult;
use crate::oracle::{fold_verdicts, trial_count, MessageKind, ResponseFingerprint};
use crate::tls::{
    AttackPoint, EcPoint, ExtensionType, PointFormat, ProtocolVersion, PskKeyExchangeMode,
    SignatureScheme,
};
use anyhow::Context;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, instrument, warn};

/// Inputs shared by every vector of one probe run.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub error_probability: f64,
    pub secure_renegotiation: bool,
    pub server_name: String,
}

/// What one handshake attempt showed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ResponseFingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_public_key: Option<EcPoint>,
    pub crafted_point_negotiated: bool,
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Attempt {
    fn failed(err: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{err:#}")),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Attempts and verdicts for one vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidCurveResponse {
    pub parameter_set: ParameterSet,
    pub attempts: Vec<Attempt>,
    /// The crafted point was accepted and the handshake completed.
    pub points_not_validated: TestResult,
    pub reuses_key: TestResult,
    pub finished_handshake_reused_key: TestResult,
    pub shows_vulnerability: TestResult,
}

impl InvalidCurveResponse {
    /// Builds the verdicts for `parameter_set` from its attempts.
    pub fn from_attempts(parameter_set: ParameterSet, attempts: Vec<Attempt>) -> Self {
        let points_not_validated = validation_bypass(&attempts);
        let (reuses_key, finished_handshake_reused_key) = key_reuse(&attempts);
        let mut response = Self {
            parameter_set,
            attempts,
            points_not_validated,
            reuses_key,
            finished_handshake_reused_key,
            shows_vulnerability: TestResult::NotTestedYet,
        };
        response.shows_vulnerability = response.vulnerability_verdict();
        response
    }

    /// Vector whose evaluation failed before any verdict could be derived.
    pub fn errored(parameter_set: ParameterSet) -> Self {
        Self {
            parameter_set,
            attempts: Vec::new(),
            points_not_validated: TestResult::ErrorDuringTest,
            reuses_key: TestResult::ErrorDuringTest,
            finished_handshake_reused_key: TestResult::ErrorDuringTest,
            shows_vulnerability: TestResult::ErrorDuringTest,
        }
    }

    fn vulnerability_verdict(&self) -> TestResult {
        match (self.points_not_validated, self.reuses_key) {
            (TestResult::True, TestResult::True) => {
                let set = &self.parameter_set;
                TestResult::from(!set.twist || set.group.is_twist_vulnerable())
            }
            (TestResult::ErrorDuringTest, _) => TestResult::ErrorDuringTest,
            (TestResult::True, reuse) if !reuse.is_conclusive() => TestResult::Uncertain,
            _ => TestResult::False,
        }
    }
}

/// `True` once any attempt negotiated the crafted point through Finished.
pub fn validation_bypass(attempts: &[Attempt]) -> TestResult {
    if attempts.iter().all(Attempt::is_failed) {
        return TestResult::ErrorDuringTest;
    }
    TestResult::from(
        attempts
            .iter()
            .any(|attempt| attempt.crafted_point_negotiated && attempt.finished),
    )
}

/// Whether two distinct attempts saw the same peer key, overall and for
/// attempts whose handshake completed.
pub fn key_reuse(attempts: &[Attempt]) -> (TestResult, TestResult) {
    let keys: Vec<(&EcPoint, bool)> = attempts
        .iter()
        .filter_map(|attempt| {
            attempt
                .peer_public_key
                .as_ref()
                .map(|key| (key, attempt.finished))
        })
        .collect();
    if keys.is_empty() {
        return (TestResult::ErrorDuringTest, TestResult::ErrorDuringTest);
    }

    let mut reused = false;
    let mut reused_finished = false;
    for (i, (key, finished)) in keys.iter().enumerate() {
        for (other, _) in keys.iter().skip(i + 1) {
            if key.numerically_equal(other) {
                reused = true;
                reused_finished |= *finished;
            }
        }
        if *finished {
            reused_finished |= keys[..i].iter().any(|(other, _)| key.numerically_equal(other));
        }
    }
    (reused.into(), reused_finished.into())
}

fn attack_point(set: &ParameterSet) -> anyhow::Result<AttackPoint> {
    if set.twist {
        set.group.twisted_curve_point()
    } else {
        set.group.invalid_curve_point()
    }
    .with_context(|| format!("no attack point configured for {}", set.group))
}

/// Number of handshakes needed for `set` at `error_probability`.
pub fn attempts_for(set: &ParameterSet, error_probability: f64) -> anyhow::Result<u32> {
    let point = attack_point(set)?;
    if set.twist && set.group.is_x_curve() {
        return Ok(1);
    }
    Ok(trial_count(point, error_probability))
}

/// Hello options for `set`.
pub fn protocol_options(set: &ParameterSet, context: &EvaluationContext) -> ProtocolOptions {
    let mut options = ProtocolOptions::new(set.version)
        .with_extension(ExtensionType::ServerNameIndication)
        .with_extension(ExtensionType::SupportedGroups);
    options.cipher_suites = set.cipher_suites.clone();
    options.groups = vec![set.group];
    options.server_name = Some(context.server_name.clone());

    if set.version.is_tls13() {
        options = options
            .with_extension(ExtensionType::KeyShare)
            .with_extension(ExtensionType::SupportedVersions)
            .with_extension(ExtensionType::PskKeyExchangeModes)
            .with_extension(ExtensionType::SignatureAndHashAlgorithms);
        options.psk_modes = vec![PskKeyExchangeMode::PskDheKe];
        options.signature_schemes = SignatureScheme::TLS13.to_vec();
    } else {
        options = options.with_extension(ExtensionType::EcPointFormats);
        if set.version == ProtocolVersion::Tls12 {
            options = options.with_extension(ExtensionType::SignatureAndHashAlgorithms);
        }
    }
    if context.secure_renegotiation {
        options = options.with_extension(ExtensionType::RenegotiationInfo);
    }
    options
}

fn crafted_key_share(set: &ParameterSet, point_order: u32) -> CraftedKeyShare {
    CraftedKeyShare {
        group: set.group,
        twist: set.twist,
        // classic points are always sent uncompressed
        format: if set.twist {
            set.point_format
        } else {
            PointFormat::Uncompressed
        },
        point_order,
        in_renegotiation: set.renegotiation,
    }
}

/// Runs every attempt of one vector, one connection per attempt.
#[instrument(skip(engine, set, context), fields(vector = %set))]
pub async fn execute_vector(
    engine: &dyn HandshakeEngine,
    set: &ParameterSet,
    context: &EvaluationContext,
) -> anyhow::Result<InvalidCurveResponse> {
    let point = attack_point(set)?;
    let trials = attempts_for(set, context.error_probability)?;
    let plan = ExchangePlan::new(
        protocol_options(set, context),
        Workflow::CraftedKeyShare(crafted_key_share(set, point.order)),
    );

    let mut attempts = Vec::with_capacity(trials as usize);
    for attempt in 0..trials {
        match run_scoped(engine, &plan).await {
            Ok(execution) => {
                let finished = execution.received(MessageKind::Finished);
                attempts.push(Attempt {
                    fingerprint: Some(execution.fingerprint),
                    peer_public_key: execution.peer_public_key,
                    crafted_point_negotiated: execution.crafted_point_negotiated,
                    finished,
                    error: None,
                });
            }
            Err(err) => {
                debug!(attempt, error = %err, "handshake attempt failed");
                attempts.push(Attempt::failed(&err));
            }
        }
    }
    debug!(trials, "vector done");
    Ok(InvalidCurveResponse::from_attempts(set.clone(), attempts))
}

/// Evaluates `vectors` in order. A vector that fails or panics yields an
/// `ErrorDuringTest` response and does not affect its siblings.
pub async fn evaluate_vectors(
    engine: &dyn HandshakeEngine,
    vectors: Vec<ParameterSet>,
    context: &EvaluationContext,
) -> Vec<InvalidCurveResponse> {
    let mut responses = Vec::with_capacity(vectors.len());
    for set in vectors {
        let outcome = AssertUnwindSafe(execute_vector(engine, &set, context))
            .catch_unwind()
            .await;
        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(vector = %set, error = %err, "unable to evaluate vector");
                InvalidCurveResponse::errored(set)
            }
            Err(_) => {
                error!(vector = %set, "vector evaluation panicked");
                InvalidCurveResponse::errored(set)
            }
        };
        responses.push(response);
    }
    responses
}

/// Probe-level verdicts folded from per-vector responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdicts {
    pub classic: TestResult,
    pub ephemeral: TestResult,
    pub twist: TestResult,
    pub key_reuse: TestResult,
    pub finished_key_reuse: TestResult,
}

pub fn aggregate(responses: &[InvalidCurveResponse]) -> Verdicts {
    let family = |twist: bool, ephemeral: Option<bool>| {
        fold_verdicts(
            responses
                .iter()
                .filter(|response| response.parameter_set.twist == twist)
                .filter(|response| match ephemeral {
                    Some(wanted) => {
                        response
                            .parameter_set
                            .leading_suite()
                            .map(|suite| suite.is_ephemeral())
                            .unwrap_or(false)
                            == wanted
                    }
                    None => true,
                })
                .map(|response| response.shows_vulnerability),
        )
    };
    Verdicts {
        classic: family(false, Some(false)),
        ephemeral: family(false, Some(true)),
        twist: family(true, None),
        key_reuse: fold_verdicts(responses.iter().map(|response| response.reuses_key)),
        finished_key_reuse: fold_verdicts(
            responses
                .iter()
                .map(|response| response.finished_handshake_reused_key),
        ),
    }
}
