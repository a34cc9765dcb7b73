//! Cross-run consistency of the simulation engine.
//!
//! # Test Categories
//!
//! 1. **Determinism**: identical matrices for every thread count and chunk size
//! 2. **Subset Consistency**: obligor and scenario-draw subsets reproduce the
//!    matching cells of a full run
//! 3. **Aggregation**: grouped columns add up to the unaggregated totals
//! 4. **Model Behaviour**: PD monotonicity, boundary PDs, Vasicek convergence
//! 5. **Validation**: configuration errors surface before any work

use approx::assert_abs_diff_eq;
use credit_core::synthetic::{RatingBucket, SyntheticData, SyntheticPortfolioConfig};
use credit_core::types::{FactorMatrix, Obligor, ObligorId, Portfolio, RatingGroup, ScenarioSet};
use credit_core::{ConfigurationError, CreditError};
use credit_kernel::loss::conditional_default_probability;
use credit_kernel::{AggregationKey, LossMatrix, SimulationConfig, SimulationEngine};
use proptest::prelude::*;

const SEED: u64 = 20_240_601;

fn synthetic(n_obligors: usize, n_scenarios: usize, seed: u64) -> SyntheticData {
    SyntheticPortfolioConfig {
        n_obligors,
        n_scenarios,
        seed,
        ..Default::default()
    }
    .generate()
    .unwrap()
}

/// Riskier than the default rating scale so that tests see defaults.
fn stressed() -> SyntheticData {
    SyntheticPortfolioConfig {
        n_obligors: 60,
        n_scenarios: 40,
        seed: 11,
        ratings: vec![
            RatingBucket::new("BB", 0.05),
            RatingBucket::new("B", 0.12),
            RatingBucket::new("CCC", 0.30),
        ],
        ..Default::default()
    }
    .generate()
    .unwrap()
}

fn config(n_scenarios: usize, draws: usize) -> SimulationConfig {
    SimulationConfig::builder()
        .n_scenarios(n_scenarios)
        .draws_per_scenario(draws)
        .seed(SEED)
        .build()
        .unwrap()
}

fn run(config: &SimulationConfig, data: &SyntheticData) -> LossMatrix {
    SimulationEngine::new(config.clone())
        .simulate(&data.portfolio, &data.scenarios)
        .unwrap()
}

fn bits(matrix: &LossMatrix) -> Vec<u64> {
    matrix.as_slice().iter().map(|v| v.to_bits()).collect()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_thread_count_does_not_change_results() {
    let data = stressed();
    let base = config(40, 25);
    let reference = bits(&run(&base.with_threads(Some(1)), &data));
    assert!(reference.iter().any(|&b| f64::from_bits(b) > 0.0));

    for threads in [2, 4, 8] {
        let other = bits(&run(&base.with_threads(Some(threads)), &data));
        assert_eq!(reference, other, "threads = {}", threads);
    }
    assert_eq!(reference, bits(&run(&base, &data)), "global pool");
}

#[test]
fn test_chunk_size_does_not_change_results() {
    let data = stressed();
    let reference = bits(&run(&config(40, 10), &data));
    for chunk_rows in [1, 7, 1000] {
        let chunked = SimulationConfig::builder()
            .n_scenarios(40)
            .draws_per_scenario(10)
            .seed(SEED)
            .chunk_rows(chunk_rows)
            .threads(3)
            .build()
            .unwrap();
        assert_eq!(reference, bits(&run(&chunked, &data)), "chunk_rows = {}", chunk_rows);
    }
}

#[test]
fn test_repeated_runs_identical() {
    let data = stressed();
    let engine = SimulationEngine::new(config(40, 5).with_aggregation(AggregationKey::Rating));
    let a = engine.simulate(&data.portfolio, &data.scenarios).unwrap();
    let b = engine.simulate(&data.portfolio, &data.scenarios).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_seed_changes_results() {
    let data = stressed();
    let a = run(&config(40, 10), &data);
    let b = SimulationEngine::new(
        SimulationConfig::builder()
            .n_scenarios(40)
            .draws_per_scenario(10)
            .seed(SEED + 1)
            .build()
            .unwrap(),
    )
    .simulate(&data.portfolio, &data.scenarios)
    .unwrap();
    assert_ne!(bits(&a), bits(&b));
}

// ============================================================================
// Subset Consistency
// ============================================================================

#[test]
fn test_obligor_subset_matches_full_run() {
    let data = stressed();
    let full = run(&config(40, 8), &data);

    let positions = data.portfolio.positions_where(|o| o.id().get() % 3 == 0);
    assert!(!positions.is_empty());
    let sub = SyntheticData {
        portfolio: data.portfolio.subset(&positions).unwrap(),
        scenarios: data.scenarios.select_obligors(&positions).unwrap(),
    };
    let partial = run(&config(40, 8), &sub);

    assert_eq!(partial.rows(), full.rows());
    for row in 0..full.rows() {
        for (col, &position) in positions.iter().enumerate() {
            assert_eq!(
                partial.get(row, col).to_bits(),
                full.get(row, position).to_bits(),
                "row {} obligor position {}",
                row,
                position
            );
        }
    }
}

#[test]
fn test_reordered_obligors_keep_their_losses() {
    let data = stressed();
    let full = run(&config(40, 4), &data);
    let reversed: Vec<usize> = (0..data.portfolio.len()).rev().collect();
    let shuffled = SyntheticData {
        portfolio: data.portfolio.subset(&reversed).unwrap(),
        scenarios: data.scenarios.select_obligors(&reversed).unwrap(),
    };
    let other = run(&config(40, 4), &shuffled);
    for row in 0..full.rows() {
        for (col, &position) in reversed.iter().enumerate() {
            assert_eq!(other.get(row, col), full.get(row, position));
        }
    }
}

#[test]
fn test_scenario_draw_subset_matches_full_run() {
    let data = stressed();
    let base = config(40, 10);
    let full = run(&base, &data);

    let subset: Vec<usize> = vec![399, 0, 17, 250, 17, 123, 42];
    let partial = run(&base.with_subset(subset.clone()), &data);

    assert_eq!(partial.row_indices(), subset.as_slice());
    for (row, &mk) in subset.iter().enumerate() {
        assert_eq!(partial.row(row), full.row(mk), "mk = {}", mk);
    }
}

#[test]
fn test_larger_domain_keeps_shared_cells() {
    // Growing M with K fixed leaves existing (m, k) cells untouched.
    let data = stressed();
    let small = run(&config(20, 6), &data);
    let large = run(&config(40, 6), &data);
    for row in 0..small.rows() {
        assert_eq!(small.row(row), large.row(row));
    }
}

#[test]
fn test_empty_subset_gives_empty_matrix() {
    let data = stressed();
    let losses = run(&config(40, 2).with_subset(Vec::new()), &data);
    assert!(losses.is_empty());
    assert_eq!(losses.cols(), data.portfolio.len());
}

// ============================================================================
// Aggregation
// ============================================================================

fn assert_additive(detail: &LossMatrix, grouped: &LossMatrix) {
    let expected = detail.row_totals();
    let actual = grouped.row_totals();
    for (row, (&e, &a)) in expected.iter().zip(&actual).enumerate() {
        let scale = e.abs().max(1.0);
        assert!((e - a).abs() / scale < 1e-9, "row {}: {} vs {}", row, e, a);
    }
}

#[test]
fn test_grouped_columns_add_up() {
    let data = stressed();
    let base = config(40, 10);
    let detail = run(&base, &data);

    let keys = [
        AggregationKey::Rating,
        AggregationKey::Portfolio,
        AggregationKey::custom(|o| format!("bucket-{}", o.id().get() % 4)),
        AggregationKey::Explicit {
            labels: vec!["left".into(), "right".into()],
            assignment: (0..data.portfolio.len()).map(|j| j % 2).collect(),
        },
    ];
    for key in keys {
        let grouped = run(&base.with_aggregation(key.clone()), &data);
        assert_eq!(grouped.rows(), detail.rows());
        assert_additive(&detail, &grouped);
    }
}

#[test]
fn test_rating_columns_sum_member_obligors() {
    let data = stressed();
    let base = config(40, 5);
    let detail = run(&base, &data);
    let by_rating = run(&base.with_aggregation(AggregationKey::Rating), &data);

    for (col, label) in by_rating.group_labels().iter().enumerate() {
        let members = data.portfolio.positions_where(|o| o.rating().to_string() == label.to_string());
        for row in 0..detail.rows() {
            let expected: f64 = members.iter().map(|&j| detail.get(row, j)).sum();
            assert_abs_diff_eq!(by_rating.get(row, col), expected, epsilon = 1e-6);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_portfolio_total_is_additive(
        n_obligors in 1_usize..30,
        portfolio_seed in any::<u64>(),
        draws in 1_usize..6,
    ) {
        let data = synthetic(n_obligors, 15, portfolio_seed);
        let base = config(15, draws);
        let detail = run(&base, &data);
        let total = run(&base.with_aggregation(AggregationKey::Portfolio), &data);
        let expected = detail.row_totals();
        for (row, &e) in expected.iter().enumerate() {
            let a = total.get(row, 0);
            prop_assert!((e - a).abs() <= 1e-9 * e.abs().max(1.0));
        }
    }
}

// ============================================================================
// Model Behaviour
// ============================================================================

#[test]
fn test_raising_pd_never_lowers_losses() {
    let data = stressed();
    let base = config(40, 20);
    let before = run(&base, &data);

    let position = 5;
    let obligor = &data.portfolio.obligors()[position];
    let bumped_obligor = obligor
        .with_probability_of_default((obligor.probability_of_default() * 2.0).min(1.0))
        .unwrap();
    let bumped = SyntheticData {
        portfolio: data.portfolio.with_replaced(position, bumped_obligor).unwrap(),
        scenarios: data.scenarios.clone(),
    };
    let after = run(&base, &bumped);

    for row in 0..before.rows() {
        assert!(after.get(row, position) >= before.get(row, position));
        for col in (0..before.cols()).filter(|&c| c != position) {
            assert_eq!(after.get(row, col), before.get(row, col));
        }
    }
    assert!(after.column_means()[position] >= before.column_means()[position]);
}

fn single(pd: f64, loading: f64) -> Portfolio {
    Portfolio::new(vec![
        Obligor::new(ObligorId::new(1), pd, 10.0, 0.5, loading, RatingGroup::new("X")).unwrap(),
    ])
    .unwrap()
}

#[test]
fn test_boundary_pds() {
    let factors = FactorMatrix::column_constant(&[-4.0, 0.0, 4.0], 1);
    for (pd, expected) in [(0.0, 0.0), (1.0, 5.0)] {
        let portfolio = single(pd, 0.9);
        let scenarios = ScenarioSet::with_obligor_loadings(factors.clone(), &portfolio).unwrap();
        let losses = SimulationEngine::new(config(3, 500))
            .simulate(&portfolio, &scenarios)
            .unwrap();
        assert!(losses.column(0).iter().all(|&l| l == expected), "pd = {}", pd);
    }
}

#[test]
fn test_default_frequency_converges_to_vasicek() {
    let (pd, loading) = (0.05, 0.5);
    let z = [-2.0, -0.5, 0.0, 1.5];
    let draws = 20_000;
    let portfolio = single(pd, loading);
    let scenarios =
        ScenarioSet::with_obligor_loadings(FactorMatrix::column_constant(&z, 1), &portfolio).unwrap();
    let losses = SimulationEngine::new(config(z.len(), draws))
        .simulate(&portfolio, &scenarios)
        .unwrap();

    let loss_on_default = portfolio.obligors()[0].loss_on_default();
    for (m, &factor) in z.iter().enumerate() {
        let rows = m * draws..(m + 1) * draws;
        let defaults = rows.filter(|&r| losses.get(r, 0) > 0.0).count();
        assert!(losses.row(m * draws).iter().all(|&l| l == 0.0 || l == loss_on_default));

        let frequency = defaults as f64 / draws as f64;
        let p = conditional_default_probability(pd, loading, factor);
        let sigma = (p * (1.0 - p) / draws as f64).sqrt();
        assert!(
            (frequency - p).abs() < 5.0 * sigma + 1e-4,
            "z = {}: frequency {} vs conditional PD {}",
            factor,
            frequency,
            p
        );
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_column_count_mismatch() {
    let data = stressed();
    let narrow = data.scenarios.select_obligors(&[0, 1, 2]).unwrap();
    let err = SimulationEngine::new(config(40, 2))
        .simulate(&data.portfolio, &narrow)
        .unwrap_err();
    assert!(matches!(
        err,
        CreditError::Configuration(ConfigurationError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_malformed_aggregation_key() {
    let data = stressed();
    let key = AggregationKey::Explicit {
        labels: vec!["only".into()],
        assignment: vec![0; 3],
    };
    let err = SimulationEngine::new(config(40, 2).with_aggregation(key))
        .simulate(&data.portfolio, &data.scenarios)
        .unwrap_err();
    assert!(matches!(
        err,
        CreditError::Configuration(ConfigurationError::InvalidAggregationKey(_))
    ));
}

#[test]
fn test_non_finite_factor() {
    let portfolio = single(0.05, 0.3);
    let factors = FactorMatrix::column_constant(&[0.0, f64::NAN], 1);
    let scenarios = ScenarioSet::with_obligor_loadings(factors, &portfolio).unwrap();
    let err = SimulationEngine::new(config(2, 1))
        .simulate(&portfolio, &scenarios)
        .unwrap_err();
    assert!(matches!(err, CreditError::NumericDomain(_)));
}
