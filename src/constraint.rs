//! Constraints define the (in)equalities a blend must satisfy.
//!
//! Every constraint is a plain data object: it owns its coefficients and bounds
//! and exposes a signed residual. Inequality residuals are nonnegative when the
//! constraint holds, equality residuals are zero.
use core::fmt::{Debug, Formatter};

use crate::expression::Expression;

/// Default absolute tolerance of equality constraints
pub const EQUALITY_TOLERANCE: f64 = 1e-6;

/// Whether the residual must vanish or only stay nonnegative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// `residual(x) == 0`
    Equality,
    /// `residual(x) >= 0`
    Inequality,
}

/// The function whose value is constrained
#[derive(Debug, Clone, PartialEq)]
pub enum Residual {
    /// An affine expression of the quantities
    Affine(Expression),
    /// `sqrt(x[left] + x[right] + epsilon) - x[bounded]`
    RootRatio(RootRatio),
}

/// Limits one quantity by the square root of the sum of two others.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootRatio {
    pub bounded: usize,
    pub left: usize,
    pub right: usize,
    /// Keeps the radicand strictly positive
    pub epsilon: f64,
}

impl RootRatio {
    /// The right hand side `sqrt(x[left] + x[right] + epsilon)`.
    /// A negative radicand, which bounds normally rule out, is clamped to zero.
    pub fn limit(&self, x: &[f64]) -> f64 {
        (x[self.left] + x[self.right] + self.epsilon).max(0.).sqrt()
    }
}

impl Residual {
    /// Value of the residual at the given point
    pub fn eval(&self, x: &[f64]) -> f64 {
        match self {
            Residual::Affine(expression) => expression.eval(x),
            Residual::RootRatio(ratio) => ratio.limit(x) - x[ratio.bounded],
        }
    }

    /// True if the residual is an affine function of the quantities
    pub fn is_affine(&self) -> bool {
        matches!(self, Residual::Affine(_))
    }

}

/// The outcome of checking one constraint at one point
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintCheck {
    pub name: String,
    pub satisfied: bool,
    /// Signed distance to the bound, positive when satisfied
    pub margin: f64,
}

/// A constraint represents a single (in)equality that must hold in the solution.
#[derive(Clone, PartialEq)]
pub struct Constraint {
    pub(crate) name: String,
    pub(crate) kind: ConstraintKind,
    pub(crate) residual: Residual,
    /// Only used by equalities
    pub(crate) tolerance: f64,
}

impl Constraint {
    fn new(kind: ConstraintKind, residual: Residual) -> Constraint {
        Constraint {
            name: String::new(),
            kind,
            residual,
            tolerance: EQUALITY_TOLERANCE,
        }
    }

    /// Set the constraint name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the tolerance within which an equality counts as satisfied
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn residual(&self) -> &Residual {
        &self.residual
    }

    /// Value of the residual at the given point
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.residual.eval(x)
    }

    /// Evaluate the constraint at a point.
    ///
    /// The equality margin is `tolerance - |residual|`, so the flag and the
    /// sign of the margin always agree.
    pub fn check(&self, x: &[f64]) -> ConstraintCheck {
        self.check_within(x, 0.)
    }

    /// Like [Constraint::check], but the flag is also set when the residual
    /// misses its bound by at most `slack`. The margin is not affected, so a
    /// satisfied check may carry a slightly negative margin.
    pub fn check_within(&self, x: &[f64], slack: f64) -> ConstraintCheck {
        let value = self.eval(x);
        let (satisfied, margin) = match self.kind {
            ConstraintKind::Equality => (
                value.abs() <= self.tolerance + slack,
                self.tolerance - value.abs(),
            ),
            ConstraintKind::Inequality => (value >= -slack, value),
        };
        ConstraintCheck {
            name: self.name.clone(),
            satisfied,
            margin,
        }
    }
}

impl Debug for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}: ", self.name)?;
        }
        match &self.residual {
            Residual::Affine(expression) => write!(f, "{:?}", expression)?,
            Residual::RootRatio(r) => write!(
                f,
                "sqrt(x{} + x{} + {}) - x{}",
                r.left, r.right, r.epsilon, r.bounded
            )?,
        }
        match self.kind {
            ConstraintKind::Equality => write!(f, " = 0"),
            ConstraintKind::Inequality => write!(f, " >= 0"),
        }
    }
}

/// `expression == target`
pub fn eq(expression: Expression, target: f64) -> Constraint {
    Constraint::new(ConstraintKind::Equality, Residual::Affine(target - expression))
}

/// `expression <= bound`
pub fn leq(expression: Expression, bound: f64) -> Constraint {
    Constraint::new(ConstraintKind::Inequality, Residual::Affine(bound - expression))
}

/// `expression >= bound`
pub fn geq(expression: Expression, bound: f64) -> Constraint {
    Constraint::new(ConstraintKind::Inequality, Residual::Affine(expression - bound))
}

/// `x[bounded] <= sqrt(x[left] + x[right] + epsilon)`
pub fn root_ratio(bounded: usize, left: usize, right: usize, epsilon: f64) -> Constraint {
    Constraint::new(
        ConstraintKind::Inequality,
        Residual::RootRatio(RootRatio {
            bounded,
            left,
            right,
            epsilon,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inequality_residual_signs() {
        let protein = Expression::linear(vec![0.09, 0.46]);
        let min = geq(protein.clone(), 10.);
        let max = leq(protein, 10.);
        let x = [0., 100.];
        assert!((min.eval(&x) - 36.).abs() < 1e-12);
        assert!((max.eval(&x) + 36.).abs() < 1e-12);
        assert!(min.check(&x).satisfied);
        assert!(!max.check(&x).satisfied);
        assert!((max.check(&x).margin + 36.).abs() < 1e-12);
    }

    #[test]
    fn slack_absorbs_round_off() {
        let protein = geq(Expression::linear(vec![0.09, 0.46]), 170.);
        // lands a few 1e-12 kg short of the minimum
        let x = [626.0403, (170. - 0.09 * 626.0403) / 0.46 - 1e-11];
        let strict = protein.check(&x);
        assert!(!strict.satisfied);
        assert!(strict.margin < 0. && strict.margin > -1e-9);
        let relaxed = protein.check_within(&x, 1e-6);
        assert!(relaxed.satisfied);
        assert_eq!(relaxed.margin, strict.margin);
        assert!(!protein.check_within(&[0., 0.], 1e-6).satisfied);

        let mass = eq(Expression::sum(2), 1000.).with_tolerance(1e-6);
        assert!(!mass.check(&[500., 500. + 2e-6]).satisfied);
        assert!(mass.check_within(&[500., 500. + 2e-6], 1e-5).satisfied);
    }

    #[test]
    fn equality_uses_tolerance() {
        let mass = eq(Expression::sum(2), 1000.).named("mass");
        assert!(mass.check(&[500., 500. + 1e-7]).satisfied);
        let off = mass.check(&[500., 500.001]);
        assert!(!off.satisfied);
        assert!(off.margin < 0.);
        assert_eq!(off.name, "mass");
    }

    #[test]
    fn root_ratio_in_isolation() {
        let c = root_ratio(2, 0, 1, 1e-5);
        assert!(c.check(&[50., 50., 10.]).satisfied);
        assert!(!c.check(&[50., 50., 10.001]).satisfied);
        // radicand stays positive at the origin
        assert!(c.check(&[0., 0., 0.]).satisfied);
        assert!(c.eval(&[0., 0., 0.]) > 0.);
    }

    #[test]
    fn debug_format() {
        let c = leq(Expression::linear(vec![2., 0., 1.]), 4.).named("cap");
        assert_eq!(format!("{:?}", c), "cap: -2 x0 + -1 x2 + 4 >= 0");
    }
}
