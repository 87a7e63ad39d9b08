//! Two-sided Mann-Whitney U rank-sum test.
//!
//! Mid-ranks come from `statrs` (average tie-breaking). The p-value is
//! either exact, from the permutation distribution of U, or asymptotic,
//! from the normal approximation with tie correction and a 0.5 continuity
//! correction. [`PValueMethod::Auto`] picks exact when there are no ties
//! and one side has at most [`EXACT_MAX_SMALL_SIDE`] values.

use air_quality_stats_models::PValueMethod;
use statrs::function::erf::erfc;
use statrs::statistics::{Data, OrderStatistics, RankTieBreaker};

/// Largest size of the smaller sample for which `Auto` uses the exact
/// distribution.
pub const EXACT_MAX_SMALL_SIDE: usize = 8;

/// Upper bound on `n_a * n_b` for a forced exact computation. Beyond this
/// the normal approximation is used. At the bound `C(n_a + n_b, n_a)` is at
/// most `C(200, 100)`, so the smallest tail probability stays representable.
pub const EXACT_MAX_CELLS: usize = 10_000;

/// Result of a single test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyOutcome {
    /// U statistic of the first sample.
    pub u: f64,
    /// Two-sided p-value in `[0, 1]`.
    pub p_value: f64,
    /// Method actually used (never [`PValueMethod::Auto`]).
    pub method: PValueMethod,
}

/// Runs the test on two samples that must already be free of NaN.
///
/// Returns `None` if either sample is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mann_whitney_u(x: &[f64], y: &[f64], method: PValueMethod) -> Option<MannWhitneyOutcome> {
    let n1 = x.len();
    let n2 = y.len();
    if n1 == 0 || n2 == 0 {
        return None;
    }

    let merged: Vec<f64> = x.iter().chain(y).copied().collect();
    let ranks = Data::new(merged.clone()).ranks(RankTieBreaker::Average);
    let rank_sum_x: f64 = ranks[..n1].iter().sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = n1f.mul_add(-(n1f + 1.0) / 2.0, rank_sum_x);
    let u2 = n1f.mul_add(n2f, -u1);
    let u_big = u1.max(u2);

    let tie_sizes = tie_group_sizes(merged);
    let has_ties = tie_sizes.iter().any(|&t| t > 1);

    let resolved = match method {
        PValueMethod::Auto if !has_ties && n1.min(n2) <= EXACT_MAX_SMALL_SIDE => {
            PValueMethod::Exact
        }
        PValueMethod::Exact if !has_ties && n1 * n2 <= EXACT_MAX_CELLS => PValueMethod::Exact,
        _ => PValueMethod::Asymptotic,
    };

    let p_value = match resolved {
        PValueMethod::Exact => exact_p_value(u_big, n1, n2),
        _ => asymptotic_p_value(u_big, n1, n2, &tie_sizes),
    };

    log::trace!("mann_whitney_u n1={n1} n2={n2} u={u1} p={p_value} method={resolved}");

    Some(MannWhitneyOutcome {
        u: u1,
        p_value: p_value.clamp(0.0, 1.0),
        method: resolved,
    })
}

/// Sizes of each run of equal values in the pooled sample.
fn tie_group_sizes(mut pooled: Vec<f64>) -> Vec<usize> {
    pooled.sort_by(f64::total_cmp);

    let mut sizes = Vec::new();
    let mut iter = pooled.iter().peekable();
    while let Some(value) = iter.next() {
        let mut size = 1;
        while iter.next_if(|next| *next == value).is_some() {
            size += 1;
        }
        sizes.push(size);
    }
    sizes
}

/// `2 * P(U >= u_big)` under the null, from the exact distribution.
///
/// The upper tail is read off the low end of the table by symmetry,
/// `P(U >= u) = P(U <= m * n - u)`. Small tails then come from entries
/// below `n`, which are built from additions only.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn exact_p_value(u_big: f64, n1: usize, n2: usize) -> f64 {
    let small = n1.min(n2);
    let large = n1.max(n2);
    let k = ((small * large) as f64 - u_big).round().max(0.0) as usize;
    2.0 * exact_lower_tail(k, small, large)
}

/// `P(U <= k)` for sample sizes `m <= n`.
///
/// The number of arrangements giving `U = u` is the coefficient of `q^u` in
/// the Gaussian binomial `[m + n choose m]_q`, built up one factor
/// `(1 - q^(n + i)) / (1 - q^i)` at a time. Each step is rescaled by
/// `i / (n + i)`, so the table always holds the pmf of a smaller Gaussian
/// binomial and its entries stay in `[0, 1]`. Entries only depend on lower
/// ones, so the table stops at `k`.
#[allow(clippy::cast_precision_loss)]
fn exact_lower_tail(k: usize, m: usize, n: usize) -> f64 {
    let len = k.min(m * n) + 1;
    let mut pmf = vec![0.0_f64; len];
    pmf[0] = 1.0;

    for i in 1..=m {
        let shift = n + i;
        for j in (shift..len).rev() {
            pmf[j] -= pmf[j - shift];
        }
        for j in i..len {
            pmf[j] += pmf[j - i];
        }
        let scale = i as f64 / shift as f64;
        for p in &mut pmf {
            *p *= scale;
        }
    }

    pmf.iter().sum::<f64>().clamp(0.0, 1.0)
}

/// Normal approximation with tie correction and 0.5 continuity correction.
#[allow(clippy::cast_precision_loss)]
fn asymptotic_p_value(u_big: f64, n1: usize, n2: usize, tie_sizes: &[usize]) -> f64 {
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let mu = n1f * n2f / 2.0;

    let tie_term: f64 = tie_sizes
        .iter()
        .map(|&t| {
            let t = t as f64;
            t.powi(3) - t
        })
        .sum();
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    // Every value identical: no evidence either way.
    if variance <= 0.0 {
        return 1.0;
    }

    let z = (u_big - mu - 0.5) / variance.sqrt();
    erfc(z / std::f64::consts::SQRT_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_separated_samples_are_significant() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let outcome = mann_whitney_u(&a, &b, PValueMethod::Auto).unwrap();

        assert!(outcome.u.abs() < f64::EPSILON);
        assert_eq!(outcome.method, PValueMethod::Exact);
        // 2 / C(10, 5)
        assert!((outcome.p_value - 2.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn statistic_is_reported_for_first_sample() {
        let a = [6.0, 7.0, 8.0, 9.0, 10.0];
        let b = [1.0, 2.0, 3.0, 4.0, 5.0];
        let outcome = mann_whitney_u(&a, &b, PValueMethod::Auto).unwrap();
        assert!((outcome.u - 25.0).abs() < f64::EPSILON);
        assert!((outcome.p_value - 2.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn exact_matches_reference_example() {
        let males = [19.0, 22.0, 16.0, 29.0, 24.0];
        let females = [20.0, 11.0, 17.0, 12.0];
        let outcome = mann_whitney_u(&males, &females, PValueMethod::Exact).unwrap();
        assert!((outcome.u - 17.0).abs() < f64::EPSILON);
        assert!((outcome.p_value - 0.111_111_111_111_111_1).abs() < 1e-10);
    }

    #[test]
    fn asymptotic_matches_reference_example() {
        let males = [19.0, 22.0, 16.0, 29.0, 24.0];
        let females = [20.0, 11.0, 17.0, 12.0];
        let outcome = mann_whitney_u(&males, &females, PValueMethod::Asymptotic).unwrap();
        assert_eq!(outcome.method, PValueMethod::Asymptotic);
        assert!((outcome.p_value - 0.111_346_886_533_140_4).abs() < 1e-10);
    }

    #[test]
    fn ties_use_mid_ranks_and_normal_approximation() {
        let a = [1.0, 2.0, 2.0, 3.0, 4.0];
        let b = [2.0, 3.0, 5.0, 6.0, 7.0];
        let outcome = mann_whitney_u(&a, &b, PValueMethod::Auto).unwrap();

        assert_eq!(outcome.method, PValueMethod::Asymptotic);
        assert!((outcome.u - 4.5).abs() < 1e-12);
        assert!((outcome.p_value - 0.111_611_768_298_292_2).abs() < 1e-9);
    }

    #[test]
    fn large_samples_use_normal_approximation() {
        let a: Vec<f64> = (1..=10).map(f64::from).collect();
        let b: Vec<f64> = (11..=20).map(f64::from).collect();
        let outcome = mann_whitney_u(&a, &b, PValueMethod::Auto).unwrap();
        assert_eq!(outcome.method, PValueMethod::Asymptotic);
        assert!(outcome.p_value < 0.001);
    }

    #[test]
    fn identical_constant_samples_are_not_significant() {
        let outcome = mann_whitney_u(&[5.0; 4], &[5.0; 6], PValueMethod::Auto).unwrap();
        assert!((outcome.p_value - 1.0).abs() < f64::EPSILON);
        assert!((outcome.u - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_values_give_p_of_one() {
        let outcome = mann_whitney_u(&[3.0], &[1.0], PValueMethod::Auto).unwrap();
        assert!((outcome.u - 1.0).abs() < f64::EPSILON);
        assert!((outcome.p_value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_sample_yields_none() {
        assert!(mann_whitney_u(&[], &[1.0], PValueMethod::Auto).is_none());
        assert!(mann_whitney_u(&[1.0], &[], PValueMethod::Auto).is_none());
    }

    #[test]
    fn exact_distribution_sums_to_one() {
        assert!((exact_lower_tail(21, 3, 7) - 1.0).abs() < 1e-12);
        assert!((exact_lower_tail(100, 3, 7) - 1.0).abs() < 1e-12);
        // One arrangement of C(10, 3) = 120 reaches U = 0.
        assert!((exact_lower_tail(0, 3, 7) - 1.0 / 120.0).abs() < 1e-15);
        assert!((exact_lower_tail(10_000, 100, 100) - 1.0).abs() < 1e-9);
    }

    fn binomial(n: u32, k: u32) -> f64 {
        (1..=k).fold(1.0, |acc, i| acc * f64::from(n - k + i) / f64::from(i))
    }

    #[test]
    fn exact_tail_stays_accurate_for_long_samples() {
        let a: Vec<f64> = (0..8).map(f64::from).collect();
        for n in [2000_u32, 20_000] {
            let b: Vec<f64> = (0..n).map(|i| f64::from(i) + 100.0).collect();
            let outcome = mann_whitney_u(&a, &b, PValueMethod::Auto).unwrap();

            assert_eq!(outcome.method, PValueMethod::Exact);
            let expected = 2.0 / binomial(n + 8, 8);
            assert!(outcome.p_value > 0.0);
            assert!(((outcome.p_value - expected) / expected).abs() < 1e-9);
        }
    }

    #[test]
    fn exact_agrees_with_normal_approximation_at_the_size_cap() {
        let a: Vec<f64> = (0..100).map(|i| f64::from(2 * i)).collect();
        let b: Vec<f64> = (0..100).map(|i| f64::from(2 * i + 1)).collect();
        let exact = mann_whitney_u(&a, &b, PValueMethod::Exact).unwrap();
        let approx = mann_whitney_u(&a, &b, PValueMethod::Asymptotic).unwrap();

        assert_eq!(exact.method, PValueMethod::Exact);
        assert!((exact.u - 4950.0).abs() < f64::EPSILON);
        assert!((exact.p_value - 0.903_947_509_618_754_4).abs() < 1e-9);
        assert!((exact.p_value - approx.p_value).abs() < 1e-3);
    }

    #[test]
    fn forced_exact_falls_back_on_ties() {
        let a = [1.0, 2.0, 2.0, 3.0];
        let b = [2.0, 4.0, 5.0];
        let outcome = mann_whitney_u(&a, &b, PValueMethod::Exact).unwrap();
        assert_eq!(outcome.method, PValueMethod::Asymptotic);
    }

    #[test]
    fn forced_exact_falls_back_beyond_the_size_cap() {
        let a: Vec<f64> = (0..101).map(|i| f64::from(2 * i)).collect();
        let b: Vec<f64> = (0..100).map(|i| f64::from(2 * i + 1)).collect();
        assert!(a.len() * b.len() > EXACT_MAX_CELLS);

        let outcome = mann_whitney_u(&a, &b, PValueMethod::Exact).unwrap();
        assert_eq!(outcome.method, PValueMethod::Asymptotic);
        assert!(outcome.p_value.is_finite());

        let capped = mann_whitney_u(&a[..100], &b, PValueMethod::Exact).unwrap();
        assert_eq!(capped.method, PValueMethod::Exact);
    }

    #[test]
    fn tie_groups_are_counted() {
        assert_eq!(tie_group_sizes(vec![2.0, 1.0, 2.0, 3.0, 2.0]), vec![1, 3, 1]);
        assert_eq!(tie_group_sizes(vec![4.0]), vec![1]);
    }
}
