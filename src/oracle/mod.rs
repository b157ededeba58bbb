//! Helpers shared by every oracle-style probe: attempt budgeting, response
//! fingerprint comparison and byte-pattern classification.

pub mod fingerprint;
pub mod pattern;

use crate::model::TestResult;
use crate::tls::AttackPoint;

pub use fingerprint::{EqualityError, MessageKind, RecordSummary, ResponseFingerprint, SocketState};
pub use pattern::{CheckPattern, CheckPatternType};

/// Number of independent attempts needed so that a peer which silently
/// accepts the attack point is missed with probability at most
/// `error_probability`.
///
/// Each attempt misses with probability `(order - 2) / order`, so the budget
/// is `ceil(ln(p_err) / ln((order - 2) / order))`.
pub fn trial_count(point: AttackPoint, error_probability: f64) -> u32 {
    if point.order <= 2 {
        return 1;
    }
    let miss = f64::from(point.order - 2) / f64::from(point.order);
    let trials = (error_probability.ln() / miss.ln()).ceil();
    if trials.is_finite() && trials >= 1.0 {
        trials.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Folds per-vector verdicts into one verdict for a vector family.
///
/// Any `True` wins. Otherwise the family is `False` when every verdict is
/// conclusive (an empty family included), `ErrorDuringTest` when every
/// verdict errored, and `Uncertain` for a mix.
pub fn fold_verdicts<I>(verdicts: I) -> TestResult
where
    I: IntoIterator<Item = TestResult>,
{
    let mut total = 0usize;
    let mut errored = 0usize;
    let mut inconclusive = false;
    for verdict in verdicts {
        total += 1;
        match verdict {
            TestResult::True => return TestResult::True,
            TestResult::False => {}
            TestResult::ErrorDuringTest => errored += 1,
            _ => inconclusive = true,
        }
    }
    if errored == 0 && !inconclusive {
        TestResult::False
    } else if errored == total {
        TestResult::ErrorDuringTest
    } else {
        TestResult::Uncertain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_prefers_true_then_reports_errors() {
        use TestResult::*;
        assert_eq!(fold_verdicts([False, ErrorDuringTest, True]), True);
        assert_eq!(fold_verdicts([False, False]), False);
        assert_eq!(fold_verdicts(Vec::new()), False);
        assert_eq!(fold_verdicts([ErrorDuringTest, ErrorDuringTest]), ErrorDuringTest);
        assert_eq!(fold_verdicts([False, ErrorDuringTest]), Uncertain);
    }

    #[test]
    fn budget_matches_closed_form() {
        // ln(0.001) / ln(3/5) = 13.52
        assert_eq!(trial_count(AttackPoint { order: 5 }, 0.001), 14);
        // ln(0.001) / ln(1/3) = 6.29
        assert_eq!(trial_count(AttackPoint { order: 3 }, 0.001), 7);
    }

    #[test]
    fn budget_grows_as_error_probability_shrinks() {
        for order in [3u32, 5, 7, 11] {
            let point = AttackPoint { order };
            let mut previous = 0;
            for p in [0.1, 0.01, 0.001, 0.0001, 0.00001] {
                let trials = trial_count(point, p);
                assert!(trials > previous, "order {order} p {p}: {trials} <= {previous}");
                previous = trials;
            }
        }
    }

    #[test]
    fn degenerate_orders_use_single_attempt() {
        assert_eq!(trial_count(AttackPoint { order: 2 }, 0.001), 1);
        assert_eq!(trial_count(AttackPoint { order: 1 }, 0.001), 1);
    }
}
