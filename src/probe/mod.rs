pub mod coverage;
pub mod false_start;
pub mod invalid_curve;
pub mod mac;
mod registry;
pub mod sni;

pub use registry::default_probes;

use crate::report::Report;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use false_start::HttpFalseStartResult;
use invalid_curve::InvalidCurveResult;
use mac::MacResult;
use sni::SniResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeKind {
    Sni,
    HttpFalseStart,
    Mac,
    InvalidCurve,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProbeKind::Sni => "sni",
            ProbeKind::HttpFalseStart => "http-false-start",
            ProbeKind::Mac => "mac",
            ProbeKind::InvalidCurve => "invalid-curve",
        };
        write!(f, "{}", label)
    }
}

/// Where a probe is in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Skipped,
    Adjusting,
    Executing,
    Completed,
    Failed,
}

/// Typed output of one probe, merged into the report exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProbeResult {
    Sni(SniResult),
    HttpFalseStart(HttpFalseStartResult),
    Mac(MacResult),
    InvalidCurve(InvalidCurveResult),
}

impl ProbeResult {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbeResult::Sni(_) => ProbeKind::Sni,
            ProbeResult::HttpFalseStart(_) => ProbeKind::HttpFalseStart,
            ProbeResult::Mac(_) => ProbeKind::Mac,
            ProbeResult::InvalidCurve(_) => ProbeKind::InvalidCurve,
        }
    }

    pub(crate) fn merge_into(self, report: &mut Report) {
        match self {
            ProbeResult::Sni(result) => result.merge_into(report),
            ProbeResult::HttpFalseStart(result) => result.merge_into(report),
            ProbeResult::Mac(result) => result.merge_into(report),
            ProbeResult::InvalidCurve(result) => result.merge_into(report),
        }
    }
}

/// Lifecycle every probe follows.
///
/// The scheduler calls `can_run` on a report snapshot; when it holds it calls
/// `adjust_config` on the same snapshot and then `execute_test`. When a probe
/// can never run its `not_executed_result` is merged instead, so each probe
/// family always has a typed entry in the report.
#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Must return false, not fail, while a dependency is still missing.
    fn can_run(&self, report: &Report) -> bool;

    /// Reads dependency results into probe-local parameters.
    fn adjust_config(&mut self, report: &Report);

    /// Performs all network interaction. Failures are mapped into the
    /// returned result instead of being propagated.
    async fn execute_test(&self) -> ProbeResult;

    fn not_executed_result(&self) -> ProbeResult;

    /// Result used when the probe died before producing one.
    fn error_result(&self) -> ProbeResult;
}
