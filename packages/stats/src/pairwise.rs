//! Batch comparison over every unordered pair of samples.
//!
//! Each side of a pair is cleaned of missing values on its own; the samples
//! are treated as independent, not as paired observations. Errors are kept
//! per pair: an empty sample only removes the pairs it takes part in.

use std::collections::BTreeMap;

use air_quality_stats_models::{
    ComparisonReport, PValueMethod, PairwiseTestResult, Sample, SkippedPair,
};

use crate::StatsError;
use crate::mann_whitney::mann_whitney_u;

/// Compares two samples with [`PValueMethod::Auto`].
///
/// # Errors
///
/// * [`StatsError::InvalidPair`] if both samples have the same name.
/// * [`StatsError::InsufficientData`] if either sample has no usable values.
pub fn compare_pair(a: &Sample, b: &Sample) -> Result<PairwiseTestResult, StatsError> {
    compare_pair_with(a, b, PValueMethod::Auto)
}

/// Compares two samples with an explicit p-value method.
///
/// # Errors
///
/// * [`StatsError::InvalidPair`] if both samples have the same name.
/// * [`StatsError::InsufficientData`] if either sample has no usable values.
pub fn compare_pair_with(
    a: &Sample,
    b: &Sample,
    method: PValueMethod,
) -> Result<PairwiseTestResult, StatsError> {
    if a.name == b.name {
        return Err(StatsError::InvalidPair {
            name: a.name.clone(),
        });
    }

    for sample in [a, b] {
        if sample.usable_len() == 0 {
            return Err(StatsError::InsufficientData {
                name: sample.name.clone(),
            });
        }
    }

    let x = a.usable_values();
    let y = b.usable_values();

    let outcome = mann_whitney_u(&x, &y, method).ok_or_else(|| StatsError::InsufficientData {
        name: a.name.clone(),
    })?;

    Ok(PairwiseTestResult::new(
        a.name.clone(),
        b.name.clone(),
        outcome.u,
        outcome.p_value,
        x.len(),
        y.len(),
        outcome.method,
    ))
}

fn record(
    report: &mut ComparisonReport,
    a: &str,
    b: &str,
    result: Result<PairwiseTestResult, StatsError>,
) {
    match result {
        Ok(row) => {
            log::debug!(
                "{a} vs {b}: U={} p={:.4} significant={}",
                row.statistic,
                row.p_value,
                row.is_significant
            );
            report.results.push(row);
        }
        Err(e) => {
            log::warn!("Skipping {a} vs {b}: {e}");
            report.skipped.push(SkippedPair {
                name_a: a.to_string(),
                name_b: b.to_string(),
                reason: e.to_string(),
            });
        }
    }
}

/// Compares every unordered pair of `samples`, in the order given.
///
/// For samples `[s0, s1, s2]` the pairs are `(s0, s1)`, `(s0, s2)`,
/// `(s1, s2)`. Pairs that fail land in [`ComparisonReport::skipped`].
#[must_use]
pub fn compare_samples(samples: &[Sample]) -> ComparisonReport {
    compare_samples_with(samples, PValueMethod::Auto)
}

/// [`compare_samples`] with an explicit p-value method for every pair.
#[must_use]
pub fn compare_samples_with(samples: &[Sample], method: PValueMethod) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    for (i, a) in samples.iter().enumerate() {
        for b in &samples[i + 1..] {
            record(&mut report, &a.name, &b.name, compare_pair_with(a, b, method));
        }
    }

    log::info!(
        "Compared {} sample pairs ({} skipped)",
        report.pair_count(),
        report.skipped.len()
    );

    report
}

/// Compares every unordered pair of a name-keyed sample set, in key order.
#[must_use]
pub fn compare(samples: &BTreeMap<String, Sample>) -> ComparisonReport {
    let ordered: Vec<Sample> = samples
        .iter()
        .map(|(name, sample)| Sample {
            name: name.clone(),
            values: sample.values.clone(),
        })
        .collect();
    compare_samples(&ordered)
}

/// Compares only the requested pairs.
///
/// Self-pairs and unknown names are reported as skipped alongside any other
/// per-pair failure.
#[must_use]
pub fn compare_pairs(
    samples: &BTreeMap<String, Sample>,
    pairs: &[(String, String)],
) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    for (a, b) in pairs {
        let result = if a == b {
            Err(StatsError::InvalidPair { name: a.clone() })
        } else {
            match (samples.get(a), samples.get(b)) {
                (Some(sa), Some(sb)) => compare_pair(sa, sb),
                (None, _) => Err(StatsError::UnknownSample { name: a.clone() }),
                (_, None) => Err(StatsError::UnknownSample { name: b.clone() }),
            }
        };
        record(&mut report, a, b, result);
    }

    report
}
