//! The feed-mix model: a linear cost objective and the named constraint set,
//! both built from a [CoefficientTable] and [BlendLimits].
use crate::constraint::{self, Constraint};
use crate::error::{Error, Result};
use crate::evaluate::ConstraintReport;
use crate::expression::Expression;
use crate::limits::BlendLimits;
use crate::table::{Attribute, CoefficientTable};

pub const MASS_BALANCE: &str = "mass balance";
pub const PROTEIN_MIN: &str = "protein minimum";
pub const PROTEIN_MAX: &str = "protein maximum";
pub const ENERGY_MIN: &str = "energy minimum";
pub const ENERGY_MAX: &str = "energy maximum";
pub const CALCIUM_MIN: &str = "calcium minimum";
pub const CALCIUM_MAX: &str = "calcium maximum";
pub const NONLINEAR_RATIO: &str = "nonlinear ratio";

/// Objective and constraints of one feed-mix problem.
///
/// ```
/// use feedmix::{table::worked_example, BlendLimits, BlendModel};
///
/// let model = BlendModel::new(&worked_example(), &BlendLimits::default())?;
/// assert_eq!(model.constraints().len(), 8);
/// assert_eq!(model.cost(&[0., 0., 0., 1.]), 40.);
/// # Ok::<_, feedmix::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BlendModel {
    objective: Expression,
    constraints: Vec<Constraint>,
    names: Vec<String>,
    mass_target: f64,
}

impl BlendModel {
    /// Formulate the model.
    ///
    /// Fails with [Error::Shape] when the nonlinear ratio refers to an
    /// ingredient the table does not have.
    pub fn new(table: &CoefficientTable, limits: &BlendLimits) -> Result<Self> {
        let len = table.len();
        let ratio = limits.ratio;
        let highest = ratio.bounded.max(ratio.left).max(ratio.right);
        if highest >= len {
            return Err(Error::shape(format!(
                "the nonlinear ratio uses ingredient #{} but the table only has {} ingredients",
                highest + 1,
                len
            )));
        }
        let protein = Expression::from_column(table, Attribute::Protein);
        let energy = Expression::from_column(table, Attribute::Energy);
        let calcium = Expression::from_column(table, Attribute::Calcium);
        let constraints = vec![
            constraint::eq(Expression::sum(len), limits.mass_target)
                .with_tolerance(limits.mass_tolerance)
                .named(MASS_BALANCE),
            constraint::geq(protein.clone(), limits.protein.min).named(PROTEIN_MIN),
            constraint::leq(protein, limits.protein.max).named(PROTEIN_MAX),
            constraint::geq(energy.clone(), limits.energy.min).named(ENERGY_MIN),
            constraint::leq(energy, limits.energy.max).named(ENERGY_MAX),
            constraint::geq(calcium.clone(), limits.calcium.min).named(CALCIUM_MIN),
            constraint::leq(calcium, limits.calcium.max).named(CALCIUM_MAX),
            constraint::root_ratio(ratio.bounded, ratio.left, ratio.right, ratio.epsilon)
                .named(NONLINEAR_RATIO),
        ];
        Ok(BlendModel {
            objective: Expression::from_column(table, Attribute::Cost),
            constraints,
            names: table.names().map(str::to_string).collect(),
            mass_target: limits.mass_target,
        })
    }

    /// The total cost expression
    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The number of quantities
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ingredient names, in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// The mass target split evenly across the ingredients
    pub fn equal_split(&self) -> Vec<f64> {
        vec![self.mass_target / self.len() as f64; self.len()]
    }

    /// Total cost of a blend
    pub fn cost(&self, x: &[f64]) -> f64 {
        self.objective.eval(x)
    }

    /// Check every constraint at `x`
    pub fn evaluate(&self, x: &[f64]) -> Result<ConstraintReport> {
        self.check_len(x)?;
        Ok(ConstraintReport::new(
            self.constraints.iter().map(|c| c.check(x)).collect(),
        ))
    }

    /// Check every constraint at `x`, letting constraint `i` miss its bound
    /// by `slack[i]`. Margins are the same as in [BlendModel::evaluate].
    pub(crate) fn evaluate_within(&self, x: &[f64], slack: &[f64]) -> Result<ConstraintReport> {
        self.check_len(x)?;
        Ok(ConstraintReport::new(
            self.constraints
                .iter()
                .zip(slack.iter().chain(std::iter::repeat(&0.)))
                .map(|(c, &s)| c.check_within(x, s))
                .collect(),
        ))
    }

    pub(crate) fn check_len(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.len() {
            return Err(Error::shape(format!(
                "expected {} quantities, got {}",
                self.len(),
                x.len()
            )));
        }
        Ok(())
    }
}
