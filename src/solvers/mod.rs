//! Numerical machinery behind [crate::solve]: the linear programs solved at each
//! step, the backend that solves them, and the sequential search itself.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod microlp;
pub mod slp;

pub use self::microlp::MicroLp;

/// Tuning knobs of the local search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Hard cap on the number of iterations
    pub max_iterations: usize,
    /// First trust radius, as a fraction of the width of the variable bounds
    pub initial_radius: f64,
    /// The search stops once the trust radius falls below this value
    pub min_radius: f64,
    /// Predicted merit decrease, relative to the merit, under which the point is stationary
    pub stationarity_tolerance: f64,
    /// Largest total scaled constraint violation of an accepted solution
    pub feasibility_tolerance: f64,
    /// Penalty weight, relative to the largest objective gradient entry
    pub penalty_factor: f64,
    /// Relative finite-difference step
    pub difference_step: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            max_iterations: 200,
            initial_radius: 0.1,
            min_radius: 1e-10,
            stationarity_tolerance: 1e-9,
            feasibility_tolerance: 1e-6,
            penalty_factor: 100.,
            difference_step: f64::EPSILON.sqrt(),
        }
    }
}

/// Represents an error that occurred when solving a linear subproblem
#[derive(Debug, PartialEq, Clone)]
pub enum ResolutionError {
    /// The problem is [unbounded](https://www.matem.unam.mx/~omar/math340/unbounded.html).
    /// It doesn't have a finite optimal values for its variables.
    Unbounded,
    /// There exists no solution that satisfies all of the constraints
    Infeasible,
    /// The backend failed for another reason
    Internal(String),
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::Unbounded => write!(
                f,
                "Unbounded: The objective can be made infinitely large \
                 without violating any constraints."
            ),
            ResolutionError::Infeasible => write!(
                f,
                "Infeasible: The problem contains contradictory constraints. \
                 No solution exists."
            ),
            ResolutionError::Internal(s) => {
                write!(f, "An internal error occurred in the linear solver: {}", s)
            }
        }
    }
}

impl std::error::Error for ResolutionError {}

/// The sense of a row of a [LinearProgram]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Eq,
    Le,
    Ge,
}

/// One linear constraint `sum(coefficient * z[index]) <op> rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coefficients: Vec<(usize, f64)>,
    pub kind: RowKind,
    pub rhs: f64,
}

/// A dense linear minimization problem with bounded variables
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearProgram {
    pub(crate) objective: Vec<f64>,
    pub(crate) bounds: Vec<(f64, f64)>,
    pub(crate) rows: Vec<Row>,
}

impl LinearProgram {
    pub fn new() -> Self {
        LinearProgram::default()
    }

    /// Add a variable with the given objective coefficient and bounds.
    /// Returns its index.
    pub fn add_variable(&mut self, objective: f64, bounds: (f64, f64)) -> usize {
        self.objective.push(objective);
        self.bounds.push(bounds);
        self.objective.len() - 1
    }

    /// Add a constraint row
    pub fn add_row(&mut self, coefficients: Vec<(usize, f64)>, kind: RowKind, rhs: f64) {
        self.rows.push(Row {
            coefficients,
            kind,
            rhs,
        });
    }
}

/// Something that can find a minimizer of a [LinearProgram]
pub trait LpSolver {
    /// Returns the optimal value of every variable, in creation order
    fn solve_lp(&self, problem: &LinearProgram) -> Result<Vec<f64>, ResolutionError>;

    /// Human readable name of the backend
    fn name(&self) -> &'static str;
}
