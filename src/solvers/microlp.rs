//! A backend that uses [microlp](https://docs.rs/microlp), a pure rust solver.

use microlp::Error;

use crate::solvers::{LinearProgram, LpSolver, ResolutionError, RowKind};

/// The [microlp](https://docs.rs/microlp) backend
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

/// Translate a [LinearProgram] into a microlp model
fn to_problem(problem: &LinearProgram) -> (microlp::Problem, Vec<microlp::Variable>) {
    let mut inner = microlp::Problem::new(microlp::OptimizationDirection::Minimize);
    let variables: Vec<microlp::Variable> = problem
        .objective
        .iter()
        .zip(&problem.bounds)
        .map(|(&coeff, &(min, max))| inner.add_var(coeff, (min, max)))
        .collect();
    for row in &problem.rows {
        let op = match row.kind {
            RowKind::Eq => microlp::ComparisonOp::Eq,
            RowKind::Le => microlp::ComparisonOp::Le,
            RowKind::Ge => microlp::ComparisonOp::Ge,
        };
        let mut linear_expr = microlp::LinearExpr::empty();
        for &(index, coefficient) in &row.coefficients {
            linear_expr.add(variables[index], coefficient);
        }
        inner.add_constraint(linear_expr, op, row.rhs);
    }
    (inner, variables)
}

impl LpSolver for MicroLp {
    fn solve_lp(&self, problem: &LinearProgram) -> Result<Vec<f64>, ResolutionError> {
        let (inner, variables) = to_problem(problem);
        let solution = inner.solve()?;
        Ok(variables.iter().map(|&var| solution[var]).collect())
    }

    fn name(&self) -> &'static str {
        "Microlp"
    }
}

impl From<microlp::Error> for ResolutionError {
    fn from(microlp_error: Error) -> Self {
        match microlp_error {
            microlp::Error::Unbounded => Self::Unbounded,
            microlp::Error::Infeasible => Self::Infeasible,
            microlp::Error::InternalError(s) => Self::Internal(s.to_string()),
        }
    }
}
