//! The reference feed-mix problem: four ingredients, a 1000 kg batch,
//! protein, energy and calcium ranges, and `x3 <= sqrt(x1 + x2 + 1e-5)`.

use feedmix::model::{CALCIUM_MIN, MASS_BALANCE, NONLINEAR_RATIO, PROTEIN_MIN};
use feedmix::table::worked_example;
use feedmix::{
    evaluate, solve, BlendLimits, BlendSolver, CoefficientTable, FailureKind, Ingredient,
    SolveOutcome, SolverSettings, DEFAULT_BOUNDS,
};
use float_eq::assert_float_eq;

const SEED: [f64; 4] = [600., 150., 25., 225.];

fn optimal(table: &CoefficientTable) -> feedmix::Blend {
    match solve(table, Some(&SEED), DEFAULT_BOUNDS).unwrap() {
        SolveOutcome::Optimal(blend) => blend,
        SolveOutcome::Failed(failure) => panic!("{}: {}", failure.kind, failure.message),
    }
}

fn with_cost(index: usize, cost: f64) -> CoefficientTable {
    let rows: Vec<Ingredient> = worked_example()
        .iter()
        .enumerate()
        .map(|(i, ingredient)| Ingredient {
            cost: if i == index { cost } else { ingredient.cost },
            ..ingredient.clone()
        })
        .collect();
    CoefficientTable::validate(rows).unwrap()
}

#[test]
fn reference_optimum() {
    let blend = optimal(&worked_example());
    assert_float_eq!(blend.total_cost, 14105.27, abs <= 0.05);
    for (quantity, expected) in blend.quantities.iter().zip([626.04, 145.37, 27.77, 200.82]) {
        assert_float_eq!(*quantity, expected, abs <= 0.05);
    }
    assert_float_eq!(blend.exact_quantities.iter().sum::<f64>(), 1000., abs <= 1e-5);
    assert!(blend.iterations > 0);
}

#[test]
fn optimum_satisfies_every_constraint() {
    let blend = optimal(&worked_example());
    let limits = BlendLimits::default();
    let report = evaluate(&worked_example(), &blend.exact_quantities, &limits).unwrap();
    assert!(report.is_feasible_within(1e-4), "{}", report);
    assert!(blend.report.is_feasible(), "{}", blend.report);
    for (check, reported) in report.iter().zip(blend.report.iter()) {
        assert_eq!(check.name, reported.name);
        assert_eq!(check.margin, reported.margin);
    }
    // the cheap ingredients are held back by the protein, calcium and mixing limits
    for name in [PROTEIN_MIN, CALCIUM_MIN, NONLINEAR_RATIO] {
        assert_float_eq!(report.get(name).unwrap().margin, 0., abs <= 1e-4);
    }
    assert!(report.get(MASS_BALANCE).unwrap().margin > -1e-5);
}

#[test]
fn reported_cost_matches_the_quantities() {
    let table = worked_example();
    let blend = optimal(&table);
    let cost: f64 = table
        .iter()
        .zip(&blend.exact_quantities)
        .map(|(i, q)| i.cost * q)
        .sum();
    assert_float_eq!(blend.total_cost, (cost * 100.).round() / 100., abs <= 1e-9);
    assert!(blend.quantities.iter().all(|&q| (0. ..=1000.).contains(&q)));
}

#[test]
fn infeasible_seeds_are_rejected_before_searching() {
    let table = worked_example();
    for seed in [
        None,
        Some(vec![250., 250., 250., 250.]),
        Some(vec![400., 250., 100., 250.]),
        Some(vec![100., 100., 20., 780.]),
        Some(vec![1000., 0., 0., 0.]),
    ] {
        let outcome = solve(&table, seed.as_deref(), DEFAULT_BOUNDS).unwrap();
        assert_eq!(outcome.failure_kind(), Some(FailureKind::InfeasibleStart), "{:?}", seed);
    }
}

#[test]
fn infeasible_start_names_the_violations() {
    let outcome = solve(&worked_example(), Some(&[1000., 0., 0., 0.]), DEFAULT_BOUNDS).unwrap();
    let message = &outcome.failure().unwrap().message;
    for name in ["protein minimum", "energy maximum", "calcium minimum"] {
        assert!(message.contains(name), "{}", message);
    }
    assert!(!message.contains("mass balance"), "{}", message);
}

#[test]
fn solving_twice_gives_the_same_outcome() {
    let table = worked_example();
    let first = solve(&table, Some(&SEED), DEFAULT_BOUNDS).unwrap();
    let second = solve(&table, Some(&SEED), DEFAULT_BOUNDS).unwrap();
    assert_eq!(first, second);
}

#[test]
fn dearer_ingredients_never_lower_the_optimum() {
    let base = optimal(&worked_example()).total_cost;
    for index in 0..4 {
        let cost = worked_example().ingredient(index).unwrap().cost + 2.;
        let dearer = optimal(&with_cost(index, cost)).total_cost;
        assert!(dearer >= base - 0.01, "ingredient {}: {} < {}", index, dearer, base);
    }
}

#[test]
fn dearer_watermelon_seeds() {
    let blend = optimal(&with_cost(1, 12.5));
    assert_float_eq!(blend.total_cost, 14250.63, abs <= 0.05);
}

#[test]
fn one_iteration_is_not_enough() {
    let settings = SolverSettings {
        max_iterations: 1,
        ..SolverSettings::default()
    };
    let outcome = BlendSolver::new(BlendLimits::default(), settings)
        .solve(&worked_example(), Some(&SEED), DEFAULT_BOUNDS)
        .unwrap();
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::SolverDidNotConverge);
    assert!(!failure.message.is_empty());
}
