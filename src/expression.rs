//! Affine functions of the quantity vector, such as `6.2 x0 + 11.5 x1` or
//! `x0 + x1 + x2 + x3 - 1000`.
use std::fmt::{Debug, Formatter};
use std::ops::{Add, Mul, Neg, Sub};

use crate::table::{Attribute, CoefficientTable};

/// A dense affine expression over the quantities of a blend.
///
/// Coefficient `i` multiplies the quantity of ingredient `i`.
/// Missing trailing coefficients count as zero, which lets expressions
/// of different lengths be combined.
#[derive(Clone, PartialEq)]
pub struct Expression {
    pub(crate) coefficients: Vec<f64>,
    pub(crate) constant: f64,
}

impl Expression {
    /// An expression with the given linear coefficients and no constant term
    pub fn linear(coefficients: Vec<f64>) -> Self {
        Expression {
            coefficients,
            constant: 0.,
        }
    }

    /// The sum of the first `len` quantities
    pub fn sum(len: usize) -> Self {
        Expression::linear(vec![1.; len])
    }

    /// The total of one table column weighted by the quantities.
    ///
    /// ```
    /// use feedmix::{table::worked_example, Attribute, Expression};
    ///
    /// let cost = Expression::from_column(&worked_example(), Attribute::Cost);
    /// assert_eq!(cost.eval(&[1., 0., 0., 2.]), 6.2 + 80.);
    /// ```
    pub fn from_column(table: &CoefficientTable, attribute: Attribute) -> Self {
        Expression::linear(table.column(attribute))
    }

    /// Value of the expression at the given point
    pub fn eval(&self, x: &[f64]) -> f64 {
        self.constant
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

impl Debug for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (index, &coeff) in self.coefficients.iter().enumerate() {
            if coeff == 0. {
                continue;
            }
            if first {
                first = false;
            } else {
                write!(f, " + ")?;
            }
            if (coeff - 1.).abs() > f64::EPSILON {
                write!(f, "{} ", coeff)?;
            }
            write!(f, "x{}", index)?;
        }
        if first {
            write!(f, "{}", self.constant)
        } else if self.constant != 0. {
            write!(f, " + {}", self.constant)
        } else {
            Ok(())
        }
    }
}

impl Add<f64> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: f64) -> Self::Output {
        self.constant += rhs;
        self
    }
}

impl Sub<f64> for Expression {
    type Output = Expression;

    fn sub(mut self, rhs: f64) -> Self::Output {
        self.constant -= rhs;
        self
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Self::Output {
        -rhs + self
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(mut self, rhs: f64) -> Self::Output {
        self.coefficients.iter_mut().for_each(|c| *c *= rhs);
        self.constant *= rhs;
        self
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        self * -1.
    }
}
