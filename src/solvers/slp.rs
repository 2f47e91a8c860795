//! Trust-region sequential linear programming.
//!
//! Each iteration linearizes the objective and the constraint residuals around
//! the current point (forward finite differences) and solves the elastic linear
//! program
//!
//! ```text
//! minimise   ∇f·d + μ (Σ s_i + Σ (t⁺_j + t⁻_j))
//! subject to g_i + ∇g_i·d + s_i ≥ 0          (inequalities)
//!            h_j + ∇h_j·d + t⁺_j − t⁻_j = 0   (equalities)
//!            max(lo − x, −Δ) ≤ d ≤ min(hi − x, Δ),  s, t⁺, t⁻ ≥ 0
//! ```
//!
//! The step is accepted when the ℓ1 merit `f + μ·violation` decreases by a
//! sufficient fraction of the decrease the linear model predicted, and the trust
//! radius `Δ` grows or shrinks with that ratio. Residuals are divided by the
//! largest entry of their gradient at the starting point so that the penalty
//! treats every constraint on the same footing.
use tracing::{debug, trace};

use crate::constraint::{Constraint, ConstraintKind};
use crate::expression::Expression;
use crate::solvers::{LinearProgram, LpSolver, ResolutionError, RowKind, SolverSettings};

const ACCEPT_RATIO: f64 = 0.1;
const SHRINK_RATIO: f64 = 0.25;
const EXPAND_RATIO: f64 = 0.75;

/// Why the search stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// A feasible stationary point was found
    Converged,
    /// The iteration cap was reached first
    IterationLimit,
    /// The search stopped moving at a point that violates the constraints
    Infeasible { violation: f64 },
    /// A linear subproblem could not be solved
    Subproblem(ResolutionError),
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        *self == Termination::Converged
    }
}

/// The last iterate of a search, whatever the reason it stopped
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub x: Vec<f64>,
    pub objective: f64,
    /// Total scaled constraint violation at `x`
    pub violation: f64,
    /// The divisor applied to each constraint residual, in constraint order
    pub scales: Vec<f64>,
    pub iterations: usize,
    pub termination: Termination,
}

impl SearchResult {
    /// A one-line explanation of the outcome
    pub fn message(&self) -> String {
        match &self.termination {
            Termination::Converged => format!(
                "Optimization terminated successfully after {} iterations",
                self.iterations
            ),
            Termination::IterationLimit => {
                format!("Iteration limit reached ({} iterations)", self.iterations)
            }
            Termination::Infeasible { violation } => format!(
                "Search stalled at an infeasible point (scaled violation {:e}) \
                 after {} iterations",
                violation, self.iterations
            ),
            Termination::Subproblem(e) => format!(
                "Linear subproblem failed at iteration {}: {}",
                self.iterations, e
            ),
        }
    }
}

/// A bounded, constrained minimization problem over `len` variables
pub struct Problem<'a> {
    pub objective: &'a Expression,
    pub constraints: &'a [Constraint],
    pub len: usize,
    pub lower: f64,
    pub upper: f64,
}

/// Residual functions after scaling
struct Scaled<'a> {
    constraint: &'a Constraint,
    scale: f64,
}

impl Scaled<'_> {
    fn eval(&self, x: &[f64]) -> f64 {
        self.constraint.eval(x) / self.scale
    }

    fn violation(&self, value: f64) -> f64 {
        match self.constraint.kind() {
            ConstraintKind::Equality => value.abs(),
            ConstraintKind::Inequality => (-value).max(0.),
        }
    }
}

/// Forward difference gradient.
/// Steps that would leave `[.., upper]` go backwards instead.
fn gradient<F: Fn(&[f64]) -> f64>(f: F, x: &[f64], upper: f64, step: f64) -> Vec<f64> {
    let f0 = f(x);
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let mut h = step * x[i].abs().max(1.);
            if x[i] + h > upper {
                h = -h;
            }
            probe[i] = x[i] + h;
            let derivative = (f(&probe) - f0) / h;
            probe[i] = x[i];
            derivative
        })
        .collect()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0., |acc: f64, v| acc.max(v.abs()))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Run the search from `x0`, which must lie within the bounds.
pub fn minimise<S: LpSolver>(
    problem: &Problem<'_>,
    x0: &[f64],
    settings: &SolverSettings,
    lp_solver: &S,
) -> SearchResult {
    let Problem {
        objective,
        constraints,
        len,
        lower,
        upper,
    } = *problem;
    let step = settings.difference_step;
    let cost = |x: &[f64]| objective.eval(x);

    let mut x: Vec<f64> = x0.iter().map(|v| v.clamp(lower, upper)).collect();
    let scaled: Vec<Scaled<'_>> = constraints
        .iter()
        .map(|constraint| Scaled {
            constraint,
            scale: max_abs(&gradient(|y| constraint.eval(y), &x, upper, step)).max(1.),
        })
        .collect();
    let scales: Vec<f64> = scaled.iter().map(|c| c.scale).collect();
    let penalty = settings.penalty_factor * max_abs(&gradient(cost, &x, upper, step)).max(1.);
    let violation_of = |values: &[f64]| -> f64 {
        scaled
            .iter()
            .zip(values)
            .map(|(c, &v)| c.violation(v))
            .sum()
    };
    let residuals = |x: &[f64]| -> Vec<f64> { scaled.iter().map(|c| c.eval(x)).collect() };

    let mut radius = settings.initial_radius * (upper - lower);
    let mut iterations = 0;
    while iterations < settings.max_iterations {
        iterations += 1;
        let values = residuals(&x);
        let violation = violation_of(&values);
        let objective_value = cost(&x);
        let merit = objective_value + penalty * violation;

        let objective_gradient = gradient(cost, &x, upper, step);
        let jacobian: Vec<Vec<f64>> = scaled
            .iter()
            .map(|c| gradient(|y| c.eval(y), &x, upper, step))
            .collect();

        let lp = linearize(
            &x,
            &objective_gradient,
            &scaled,
            &values,
            &jacobian,
            penalty,
            radius,
            (lower, upper),
        );
        let solution = match lp_solver.solve_lp(&lp) {
            Ok(solution) => solution,
            Err(e) => {
                return SearchResult {
                    objective: objective_value,
                    violation,
                    scales,
                    x,
                    iterations,
                    termination: Termination::Subproblem(e),
                }
            }
        };
        let d = &solution[..len];

        let linearized: Vec<f64> = values
            .iter()
            .zip(&jacobian)
            .map(|(v, row)| v + dot(row, d))
            .collect();
        let model_merit = objective_value
            + dot(&objective_gradient, d)
            + penalty * violation_of(&linearized);
        let predicted = merit - model_merit;
        let step_norm = max_abs(d);
        debug!(
            iteration = iterations,
            objective = objective_value,
            violation,
            radius,
            predicted,
            "slp iteration"
        );

        if predicted <= settings.stationarity_tolerance * merit.abs().max(1.)
            || step_norm <= settings.min_radius
        {
            return stationary(x, objective_value, violation, iterations, scales, settings);
        }

        let candidate: Vec<f64> = x
            .iter()
            .zip(d)
            .map(|(xi, di)| (xi + di).clamp(lower, upper))
            .collect();
        let candidate_merit = cost(&candidate) + penalty * violation_of(&residuals(&candidate));
        let ratio = (merit - candidate_merit) / predicted;
        trace!(ratio, step_norm, "trust region update");

        if ratio >= ACCEPT_RATIO {
            x = candidate;
        }
        if ratio < SHRINK_RATIO {
            radius = 0.5 * step_norm;
        } else if ratio > EXPAND_RATIO && step_norm >= 0.99 * radius {
            radius *= 2.;
        }
        if radius < settings.min_radius {
            let values = residuals(&x);
            let objective_value = cost(&x);
            let violation = violation_of(&values);
            return stationary(x, objective_value, violation, iterations, scales, settings);
        }
    }

    let violation = violation_of(&residuals(&x));
    SearchResult {
        objective: cost(&x),
        violation,
        scales,
        x,
        iterations,
        termination: Termination::IterationLimit,
    }
}

fn stationary(
    x: Vec<f64>,
    objective: f64,
    violation: f64,
    iterations: usize,
    scales: Vec<f64>,
    settings: &SolverSettings,
) -> SearchResult {
    let termination = if violation <= settings.feasibility_tolerance {
        Termination::Converged
    } else {
        Termination::Infeasible { violation }
    };
    SearchResult {
        x,
        objective,
        violation,
        scales,
        iterations,
        termination,
    }
}

/// Build the elastic trust-region subproblem. Variables are laid out as
/// `[d (n), one slack per inequality, two slacks per equality]`.
#[allow(clippy::too_many_arguments)]
fn linearize(
    x: &[f64],
    objective_gradient: &[f64],
    scaled: &[Scaled<'_>],
    values: &[f64],
    jacobian: &[Vec<f64>],
    penalty: f64,
    radius: f64,
    (lower, upper): (f64, f64),
) -> LinearProgram {
    let mut lp = LinearProgram::new();
    for (xi, &gi) in x.iter().zip(objective_gradient) {
        lp.add_variable(gi, ((lower - xi).max(-radius), (upper - xi).min(radius)));
    }
    for ((c, &value), row) in scaled.iter().zip(values).zip(jacobian) {
        let mut coefficients: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .filter_map(|(i, &g)| (g != 0.).then_some((i, g)))
            .collect();
        match c.constraint.kind() {
            ConstraintKind::Inequality => {
                let slack = lp.add_variable(penalty, (0., f64::INFINITY));
                coefficients.push((slack, 1.));
                lp.add_row(coefficients, RowKind::Ge, -value);
            }
            ConstraintKind::Equality => {
                let above = lp.add_variable(penalty, (0., f64::INFINITY));
                let below = lp.add_variable(penalty, (0., f64::INFINITY));
                coefficients.push((above, 1.));
                coefficients.push((below, -1.));
                lp.add_row(coefficients, RowKind::Eq, -value);
            }
        }
    }
    lp
}
