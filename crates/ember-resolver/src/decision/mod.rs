//! Decision-point evaluation and compatibility checking.
//!
//! Every comparator atom leaves a decision point on its target. Before an
//! installed package may be kept or rebuilt, all decision points on it must
//! agree: a pair conflicts when the installed version admits one and fails
//! the other while the operator pair can describe disjoint ranges.

use ember_core::error::{EmberError, EmberResult};
use ember_core::types::{Cmp, DecisionPoint, Package};

/// Whether the operator pair can impose provably disjoint ranges: a lower
/// bound against an upper bound, or an exact pin against anything.
fn contrary(a: Cmp, b: Cmp) -> bool {
    use Cmp::*;
    matches!(
        (a, b),
        (Greater | GreaterEq, Less | LessEq)
            | (Less | LessEq, Greater | GreaterEq)
            | (Exact, _)
            | (_, Exact)
    )
}

/// Verify every pair of decision points agrees on the installed version
pub fn check_pairwise(points: &[DecisionPoint], installed: &Package) -> EmberResult<()> {
    for (i, first) in points.iter().enumerate() {
        for second in &points[i + 1..] {
            let first_admits = first.admits(&installed.version);
            let second_admits = second.admits(&installed.version);
            if first_admits != second_admits && contrary(first.cmp, second.cmp) {
                return Err(EmberError::ConditionConflict {
                    target: installed.cn(),
                    installed: installed.version.clone(),
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Whether the installed version fails at least one decision point
pub fn any_rejected(points: &[DecisionPoint], installed_version: &str) -> bool {
    points.iter().any(|point| !point.admits(installed_version))
}
