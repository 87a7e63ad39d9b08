//! Column scaling and Pearson correlation.

use air_quality_analytics_models::CorrelationMatrix;
use air_quality_data::SeasonTable;
use air_quality_geo_models::Pollutant;

use crate::AnalyticsError;

/// Scales a column to `[0, 1]` by its observed minimum and maximum.
///
/// Missing entries stay missing. A column whose readings are all equal maps
/// to 0.
#[must_use]
pub fn min_max_scale(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (min, max) = values
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let range = max - min;
    values
        .iter()
        .map(|v| {
            v.map(|v| {
                if range > 0.0 {
                    (v - min) / range
                } else {
                    0.0
                }
            })
        })
        .collect()
}

/// Pearson's r between two columns over rows where both are present.
/// `NaN` with fewer than two such rows or when either side is constant.
#[allow(clippy::cast_precision_loss)]
fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy = dx.mul_add(dy, sxy);
        sxx = dx.mul_add(dx, sxx);
        syy = dy.mul_add(dy, syy);
    }

    let denom = (sxx * syy).sqrt();
    if denom > 0.0 {
        (sxy / denom).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}

/// Correlation matrix over named columns, in the given order.
#[must_use]
pub fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let values = columns
        .iter()
        .map(|(_, a)| columns.iter().map(|(_, b)| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        columns: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Scales each pollutant column of the seasonal table and correlates them.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownColumn`] for the first pollutant the
/// table has no column for.
pub fn pollutant_correlations(
    table: &SeasonTable,
    pollutants: &[Pollutant],
) -> Result<CorrelationMatrix, AnalyticsError> {
    let columns = pollutants
        .iter()
        .map(|p| {
            table
                .pollutant(*p)
                .map(|values| (p.to_string(), min_max_scale(values)))
                .ok_or_else(|| AnalyticsError::UnknownColumn {
                    column: p.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Correlating {} pollutant column(s)", columns.len());

    Ok(correlation_matrix(&columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn scales_to_unit_interval() {
        let scaled = min_max_scale(&[Some(2.0), None, Some(4.0), Some(3.0)]);
        assert_eq!(scaled, vec![Some(0.0), None, Some(1.0), Some(0.5)]);
    }

    #[test]
    fn constant_column_scales_to_zero() {
        assert_eq!(
            min_max_scale(&[Some(5.0), Some(5.0), None]),
            vec![Some(0.0), Some(0.0), None]
        );
        assert!(min_max_scale(&[None, None]).iter().all(Option::is_none));
        assert!(min_max_scale(&[]).is_empty());
    }

    #[test]
    fn perfect_correlations() {
        let a = col(&[1.0, 2.0, 3.0, 4.0]);
        let b = col(&[2.0, 4.0, 6.0, 8.0]);
        let c = col(&[4.0, 3.0, 2.0, 1.0]);
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
        assert!((pearson(&a, &c) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn uses_pairwise_complete_rows() {
        let a = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        let b = vec![Some(1.0), Some(2.0), Some(100.0), Some(4.0)];
        assert!((pearson(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_correlations_are_nan() {
        let a = col(&[1.0, 2.0, 3.0]);
        assert!(pearson(&a, &col(&[5.0, 5.0, 5.0])).is_nan());
        assert!(pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let columns = vec![
            ("x".to_string(), col(&[1.0, 2.0, 3.0, 5.0])),
            ("y".to_string(), col(&[2.0, 1.0, 4.0, 3.0])),
        ];
        let matrix = correlation_matrix(&columns);

        assert_eq!(matrix.columns, vec!["x", "y"]);
        assert!((matrix.values[0][0] - 1.0).abs() < 1e-12);
        assert!((matrix.values[1][1] - 1.0).abs() < 1e-12);
        assert!((matrix.values[0][1] - matrix.values[1][0]).abs() < f64::EPSILON);
    }

    #[test]
    fn pollutant_correlations_read_season_columns() {
        let csv = "ts,O3,NOx,Season\n\
                   2020-01-01 00:00,10,1,Winter\n\
                   2020-01-01 01:00,20,2,Winter\n\
                   2020-01-01 02:00,30,3,Winter\n";
        let table = SeasonTable::from_reader(csv.as_bytes(), "s", "ts", "Season").unwrap();

        let matrix = pollutant_correlations(&table, &[Pollutant::O3, Pollutant::NOx]).unwrap();
        assert!((matrix.get("O3", "NOx").unwrap() - 1.0).abs() < 1e-12);

        assert!(pollutant_correlations(&table, &[Pollutant::SO2]).is_err());
    }
}
