//! The constraint evaluator: checks a candidate blend against every constraint
//! and produces a [ConstraintReport].
use std::fmt::{Display, Formatter};

use crate::constraint::ConstraintCheck;
use crate::error::Result;
use crate::limits::BlendLimits;
use crate::model::BlendModel;
use crate::table::CoefficientTable;

/// Check `x` against the constraint set built from `table` and `limits`.
///
/// Infeasibility is reported through the flags and margins of the report, never
/// as an error. Errors only come from malformed input, such as a quantity vector
/// whose length differs from the table's.
///
/// ```
/// use feedmix::{evaluate, table::worked_example, BlendLimits};
///
/// let report = evaluate(&worked_example(), &[1000., 0., 0., 0.], &BlendLimits::default())?;
/// assert!(report.get("mass balance").unwrap().satisfied);
/// assert!(!report.get("protein minimum").unwrap().satisfied);
/// assert!(!report.is_feasible());
/// # Ok::<_, feedmix::Error>(())
/// ```
pub fn evaluate(
    table: &CoefficientTable,
    x: &[f64],
    limits: &BlendLimits,
) -> Result<ConstraintReport> {
    BlendModel::new(table, limits)?.evaluate(x)
}

/// Per-constraint satisfaction flags and margins, in model order
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintReport {
    checks: Vec<ConstraintCheck>,
}

impl ConstraintReport {
    pub(crate) fn new(checks: Vec<ConstraintCheck>) -> Self {
        ConstraintReport { checks }
    }

    /// True when every constraint flag is set.
    ///
    /// Only the boolean flags are consulted, the nonlinear ratio included.
    pub fn is_feasible(&self) -> bool {
        self.checks.iter().all(|c| c.satisfied)
    }

    /// True when no margin is below `-tolerance`
    pub fn is_feasible_within(&self, tolerance: f64) -> bool {
        self.checks.iter().all(|c| c.margin >= -tolerance)
    }

    /// The check with the given name
    pub fn get(&self, name: &str) -> Option<&ConstraintCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Checks whose flag is not set
    pub fn violated(&self) -> impl Iterator<Item = &ConstraintCheck> {
        self.checks.iter().filter(|c| !c.satisfied)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintCheck> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Display for ConstraintReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for check in &self.checks {
            writeln!(
                f,
                "{:<20}{:<8}{:>16.6}",
                check.name,
                if check.satisfied { "ok" } else { "VIOLATED" },
                check.margin
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::table::worked_example;

    fn report(x: &[f64]) -> ConstraintReport {
        evaluate(&worked_example(), x, &BlendLimits::default()).unwrap()
    }

    #[test]
    fn mass_balance_flag_follows_tolerance() {
        for (x, expected) in [
            ([600., 150., 25., 225.], true),
            ([600., 150., 25., 225. + 5e-7], true),
            ([600., 150., 25., 225. + 2e-6], false),
            ([600., 150., 25., 224.9], false),
        ] {
            assert_eq!(report(&x).get(MASS_BALANCE).unwrap().satisfied, expected, "{:?}", x);
        }
    }

    #[test]
    fn nonlinear_ratio_flag() {
        // sqrt(600 + 150 + 1e-5) is about 27.386
        assert!(report(&[600., 150., 27.38, 222.62]).get(NONLINEAR_RATIO).unwrap().satisfied);
        assert!(!report(&[600., 150., 27.39, 222.61]).get(NONLINEAR_RATIO).unwrap().satisfied);
        assert!(!report(&[0., 0., 0.01, 999.99]).get(NONLINEAR_RATIO).unwrap().satisfied);
    }

    #[test]
    fn feasible_blend() {
        let r = report(&[600., 150., 25., 225.]);
        assert!(r.is_feasible(), "{}", r);
        assert_eq!(r.violated().count(), 0);
        assert_eq!(r.len(), 8);
    }

    #[test]
    fn margins_are_signed() {
        let r = report(&[1000., 0., 0., 0.]);
        // 0.09 * 1000 = 90 kg of protein, 80 short of the minimum
        assert!((r.get(PROTEIN_MIN).unwrap().margin + 80.).abs() < 1e-9);
        assert!((r.get(PROTEIN_MAX).unwrap().margin - 110.).abs() < 1e-9);
        assert!(!r.get(ENERGY_MAX).unwrap().satisfied);
        assert!(!r.get(CALCIUM_MIN).unwrap().satisfied);
        let violated: Vec<&str> = r.violated().map(|c| c.name.as_str()).collect();
        assert_eq!(violated, vec![PROTEIN_MIN, ENERGY_MAX, CALCIUM_MIN]);
    }

    #[test]
    fn gate_uses_the_nonlinear_flag() {
        // every linear constraint holds, only the ratio fails
        let r = report(&[600., 150., 35., 215.]);
        let linear_ok = r.iter().filter(|c| c.name != NONLINEAR_RATIO).all(|c| c.satisfied);
        assert!(linear_ok, "{}", r);
        assert!(!r.is_feasible());
    }
}
