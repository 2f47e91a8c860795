//! The blend solver: from a coefficient table and an optional starting blend to
//! a least-cost blend, or to a structured explanation of why there is none.
use std::fmt::{Display, Formatter};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::evaluate::ConstraintReport;
use crate::limits::BlendLimits;
use crate::model::BlendModel;
use crate::solvers::slp::{self, Problem};
use crate::solvers::{LpSolver, MicroLp, SolverSettings};
use crate::table::CoefficientTable;

/// Per-ingredient quantity bounds used when none are given
pub const DEFAULT_BOUNDS: (f64, f64) = (0., 1000.);

/// Why a solve produced no blend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The starting blend violates at least one constraint, so no search was run
    InfeasibleStart,
    /// The search ended without meeting its convergence criteria
    SolverDidNotConverge,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::InfeasibleStart => write!(f, "infeasible start"),
            FailureKind::SolverDidNotConverge => write!(f, "solver did not converge"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolveFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// A least-cost blend
#[derive(Debug, Clone, PartialEq)]
pub struct Blend {
    /// kg of each ingredient, rounded to 2 decimals
    pub quantities: Vec<f64>,
    /// Total cost, rounded to 2 decimals
    pub total_cost: f64,
    /// The unrounded final iterate
    pub exact_quantities: Vec<f64>,
    pub exact_cost: f64,
    pub iterations: usize,
    /// Constraint check of the unrounded iterate.
    ///
    /// Flags are set with the search's feasibility tolerance: a constraint may
    /// count as satisfied while its margin is a round-off below zero. Use
    /// [ConstraintReport::is_feasible_within] for a stricter reading.
    pub report: ConstraintReport,
}

/// The result of one call to [solve]
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(Blend),
    Failed(SolveFailure),
}

impl SolveOutcome {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveOutcome::Optimal(_))
    }

    pub fn blend(&self) -> Option<&Blend> {
        match self {
            SolveOutcome::Optimal(blend) => Some(blend),
            SolveOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SolveFailure> {
        match self {
            SolveOutcome::Optimal(_) => None,
            SolveOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Failure kind, if any
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }
}

/// Round to cents / decagrams
pub fn round2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

/// Solve with the default [BlendLimits] and [SolverSettings].
///
/// `x0` defaults to an equal split of the mass target.
///
/// ```
/// use feedmix::{solve, table::worked_example, FailureKind, DEFAULT_BOUNDS};
///
/// let table = worked_example();
/// let outcome = solve(&table, Some(&[600., 150., 25., 225.]), DEFAULT_BOUNDS)?;
/// let blend = outcome.blend().expect("feasible seed");
/// assert!((blend.total_cost - 14105.27).abs() < 0.05);
///
/// // the equal split misses the protein, energy and ratio constraints
/// let outcome = solve(&table, None, DEFAULT_BOUNDS)?;
/// assert_eq!(outcome.failure_kind(), Some(FailureKind::InfeasibleStart));
/// # Ok::<_, feedmix::Error>(())
/// ```
pub fn solve(
    table: &CoefficientTable,
    x0: Option<&[f64]>,
    bounds: (f64, f64),
) -> Result<SolveOutcome> {
    BlendSolver::new(BlendLimits::default(), SolverSettings::default()).solve(table, x0, bounds)
}

/// A configured solver. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct BlendSolver<S = MicroLp> {
    limits: BlendLimits,
    settings: SolverSettings,
    lp_solver: S,
}

impl BlendSolver<MicroLp> {
    pub fn new(limits: BlendLimits, settings: SolverSettings) -> Self {
        BlendSolver {
            limits,
            settings,
            lp_solver: MicroLp,
        }
    }
}

impl Default for BlendSolver<MicroLp> {
    fn default() -> Self {
        BlendSolver::new(BlendLimits::default(), SolverSettings::default())
    }
}

impl<S: LpSolver> BlendSolver<S> {
    /// Use another backend for the linear subproblems
    pub fn with_lp_solver<T: LpSolver>(self, lp_solver: T) -> BlendSolver<T> {
        BlendSolver {
            limits: self.limits,
            settings: self.settings,
            lp_solver,
        }
    }

    pub fn limits(&self) -> &BlendLimits {
        &self.limits
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Find a least-cost blend.
    ///
    /// Infeasible starting points and non-converging searches are returned as
    /// [SolveOutcome::Failed]. `Err` is reserved for malformed input: a starting
    /// blend whose length differs from the table, unusable bounds, or a ratio
    /// constraint referring to missing ingredients.
    pub fn solve(
        &self,
        table: &CoefficientTable,
        x0: Option<&[f64]>,
        bounds: (f64, f64),
    ) -> Result<SolveOutcome> {
        let model = BlendModel::new(table, &self.limits)?;
        self.solve_model(&model, x0, bounds)
    }

    /// Like [BlendSolver::solve], for a model that is already formulated.
    /// The model's own limits apply, not the solver's.
    pub fn solve_model(
        &self,
        model: &BlendModel,
        x0: Option<&[f64]>,
        bounds: (f64, f64),
    ) -> Result<SolveOutcome> {
        let (lower, upper) = bounds;
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(Error::shape(format!(
                "bounds ({}, {}) must be finite and ordered",
                lower, upper
            )));
        }
        let x0 = match x0 {
            Some(x0) => x0.to_vec(),
            None => model.equal_split(),
        };
        let report = model.evaluate(&x0)?;

        let out_of_bounds: Vec<String> = x0
            .iter()
            .zip(model.names())
            .filter(|(q, _)| !(lower..=upper).contains(*q))
            .map(|(q, name)| format!("{} = {} outside [{}, {}]", name, q, lower, upper))
            .collect();
        if !report.is_feasible() || !out_of_bounds.is_empty() {
            let violated = report
                .violated()
                .map(|c| format!("{} (margin {})", c.name, c.margin))
                .chain(out_of_bounds);
            let message = format!(
                "the starting blend {:?} violates: {}",
                x0,
                violated.collect::<Vec<_>>().join(", ")
            );
            warn!(%message, "refusing to search from an infeasible start");
            return Ok(SolveOutcome::Failed(SolveFailure {
                kind: FailureKind::InfeasibleStart,
                message,
            }));
        }

        let problem = Problem {
            objective: model.objective(),
            constraints: model.constraints(),
            len: model.len(),
            lower,
            upper,
        };
        let result = slp::minimise(&problem, &x0, &self.settings, &self.lp_solver);
        let message = result.message();
        if !result.termination.is_converged() {
            warn!(%message, backend = self.lp_solver.name(), "search did not converge");
            return Ok(SolveOutcome::Failed(SolveFailure {
                kind: FailureKind::SolverDidNotConverge,
                message,
            }));
        }

        let slack: Vec<f64> = result
            .scales
            .iter()
            .map(|scale| scale * self.settings.feasibility_tolerance)
            .collect();
        let exact_cost = model.cost(&result.x);
        let blend = Blend {
            quantities: result.x.iter().copied().map(round2).collect(),
            total_cost: round2(exact_cost),
            report: model.evaluate_within(&result.x, &slack)?,
            exact_quantities: result.x,
            exact_cost,
            iterations: result.iterations,
        };
        info!(
            total_cost = blend.total_cost,
            iterations = blend.iterations,
            "{}",
            message
        );
        Ok(SolveOutcome::Optimal(blend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Range;
    use crate::solvers::{LinearProgram, ResolutionError};
    use crate::table::worked_example;

    const SEED: [f64; 4] = [600., 150., 25., 225.];

    struct Unreachable;

    impl LpSolver for Unreachable {
        fn solve_lp(
            &self,
            _: &LinearProgram,
        ) -> std::result::Result<Vec<f64>, ResolutionError> {
            panic!("the search must not start from an infeasible point")
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    #[test]
    fn infeasible_start_never_searches() {
        let solver = BlendSolver::<MicroLp>::default().with_lp_solver(Unreachable);
        let outcome = solver
            .solve(&worked_example(), Some(&[1000., 0., 0., 0.]), DEFAULT_BOUNDS)
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InfeasibleStart);
        assert!(failure.message.contains("protein minimum"), "{}", failure.message);
    }

    #[test]
    fn out_of_bounds_start_is_infeasible() {
        let solver = BlendSolver::<MicroLp>::default().with_lp_solver(Unreachable);
        let outcome = solver
            .solve(&worked_example(), Some(&SEED), (0., 500.))
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::InfeasibleStart);
        assert!(failure.message.contains("trigo = 600"), "{}", failure.message);
    }

    #[test]
    fn default_solver() {
        let solver = BlendSolver::<MicroLp>::default();
        assert_eq!(solver.limits(), &BlendLimits::default());
        assert_eq!(solver.settings(), &SolverSettings::default());
        let outcome = solver.solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS).unwrap();
        assert_eq!(outcome, solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS).unwrap());
    }

    #[test]
    fn prebuilt_model() {
        let limits = BlendLimits {
            protein: Range::new(150., 200.),
            ..BlendLimits::default()
        };
        let model = BlendModel::new(&worked_example(), &limits).unwrap();
        // the model's limits win over the solver's
        let solver = BlendSolver::<MicroLp>::default();
        let from_model = solver.solve_model(&model, Some(&SEED), DEFAULT_BOUNDS).unwrap();
        let from_table = BlendSolver::new(limits, SolverSettings::default())
            .solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS)
            .unwrap();
        assert!(from_model.is_optimal());
        assert_eq!(from_model, from_table);

        let failure = solver
            .with_lp_solver(Unreachable)
            .solve_model(&model, None, DEFAULT_BOUNDS)
            .unwrap();
        assert_eq!(failure.failure_kind(), Some(FailureKind::InfeasibleStart));
        assert!(failure.failure().unwrap().message.contains("[250.0, 250.0, 250.0, 250.0]"));
    }

    #[test]
    fn malformed_input_is_an_error() {
        let table = worked_example();
        assert!(matches!(
            solve(&table, Some(&[1., 2., 3.]), DEFAULT_BOUNDS),
            Err(Error::Shape { .. })
        ));
        assert!(matches!(
            solve(&table, Some(&SEED), (10., 0.)),
            Err(Error::Shape { .. })
        ));
        assert!(matches!(
            solve(&table, Some(&SEED), (0., f64::INFINITY)),
            Err(Error::Shape { .. })
        ));
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(14105.2667), 14105.27);
        assert_eq!(round2(27.774233), 27.77);
        assert_eq!(round2(0.004), 0.);
    }

    #[test]
    fn iteration_cap_is_a_non_convergence() {
        let settings = SolverSettings {
            max_iterations: 1,
            ..SolverSettings::default()
        };
        let solver = BlendSolver::new(BlendLimits::default(), settings);
        let outcome = solver
            .solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS)
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::SolverDidNotConverge);
        assert!(failure.message.contains("Iteration limit"), "{}", failure.message);
    }

    #[test]
    fn optimal_blend_is_consistent() {
        let outcome = solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS).unwrap();
        let blend = outcome.blend().expect("converges");
        assert_eq!(blend.total_cost, round2(blend.exact_cost));
        let recomputed: f64 = worked_example()
            .iter()
            .zip(&blend.exact_quantities)
            .map(|(i, q)| i.cost * q)
            .sum();
        assert!((recomputed - blend.exact_cost).abs() < 1e-9);
        assert!((blend.exact_quantities.iter().sum::<f64>() - 1000.).abs() < 1e-5);
        assert!(blend.report.is_feasible_within(1e-4), "{}", blend.report);
        // active constraints may end a round-off short, which must not flag them
        assert!(blend.report.is_feasible(), "{}", blend.report);
        assert_eq!(blend.report.violated().count(), 0);
    }
}
