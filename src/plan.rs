//! Dry-run view of what the invalid-curve probe would send for a report.

use crate::model::ScanConfig;
use crate::probe::invalid_curve::{evaluate, generate_vectors, InvalidCurveScope, ParameterSet};
use crate::report::Report;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PlannedVector {
    #[serde(flatten)]
    pub parameter_set: ParameterSet,
    /// Handshakes the vector needs; `None` when no attack point is configured.
    pub trials: Option<u32>,
}

/// Vectors in execution order together with their attempt budget.
pub fn plan_invalid_curve(report: &Report, cfg: &ScanConfig) -> Vec<PlannedVector> {
    let scope = InvalidCurveScope::from_report(report, cfg.detail);
    generate_vectors(&scope, cfg.detail)
        .into_iter()
        .map(|parameter_set| PlannedVector {
            trials: evaluate::attempts_for(&parameter_set, cfg.error_probability).ok(),
            parameter_set,
        })
        .collect()
}

/// Total handshakes across `plan`.
pub fn total_trials(plan: &[PlannedVector]) -> u64 {
    plan.iter()
        .filter_map(|vector| vector.trials)
        .map(u64::from)
        .sum()
}
