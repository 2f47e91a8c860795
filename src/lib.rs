//! Least-cost feed blending with a nonlinear mixing constraint.
//!
//! A [CoefficientTable] gives the cost and the protein, energy and calcium
//! content of each ingredient. [solve] finds the cheapest blend that reaches the
//! target mass, keeps every nutrient within its [Range] and respects
//! `x[2] <= sqrt(x[0] + x[1] + ε)`. [evaluate] checks any candidate blend
//! against the same constraints.
//!
//! ```rust
//! use feedmix::table::worked_example;
//! use feedmix::{evaluate, solve, BlendLimits, SolveOutcome, DEFAULT_BOUNDS};
//!
//! let table = worked_example();
//! let seed = [600., 150., 25., 225.];
//! assert!(evaluate(&table, &seed, &BlendLimits::default())?.is_feasible());
//!
//! match solve(&table, Some(&seed), DEFAULT_BOUNDS)? {
//!     SolveOutcome::Optimal(blend) => {
//!         println!("{:?} costs {}", blend.quantities, blend.total_cost)
//!     }
//!     SolveOutcome::Failed(failure) => println!("{}: {}", failure.kind, failure.message),
//! }
//! # Ok::<_, feedmix::Error>(())
//! ```
//!
//! The search is a sequential linear programming method: each step solves a
//! linear model of the problem inside a trust region with [microlp](https://docs.rs/microlp).
//! See [solvers::slp].

pub use config::RunConfig;
pub use constraint::{Constraint, ConstraintCheck, ConstraintKind, Residual};
pub use error::{Error, Result};
pub use evaluate::{evaluate, ConstraintReport};
pub use expression::Expression;
pub use limits::{BlendLimits, Range, RatioLimit};
pub use model::BlendModel;
pub use solve::{solve, Blend, BlendSolver, FailureKind, SolveFailure, SolveOutcome, DEFAULT_BOUNDS};
pub use solvers::{LpSolver, MicroLp, ResolutionError, SolverSettings};
pub use table::{Attribute, CoefficientTable, Ingredient};
pub use timing::{Stage, StageTimings};

pub mod config;
pub mod constraint;
mod error;
mod evaluate;
mod expression;
pub mod limits;
pub mod loader;
pub mod logging;
pub mod model;
pub mod plot;
pub mod report;
mod solve;
pub mod solvers;
pub mod table;
pub mod timing;
