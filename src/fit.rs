use nalgebra::{DMatrix, DVector};

/// Result of an ordinary least-squares line fit of y on x.
#[derive(Debug, Clone, Copy)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

/// Fits `y = intercept + slope * x` by least squares.
///
/// Returns `None` when fewer than two points are supplied, when the slices
/// differ in length, or when the design is singular (all x identical).
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let rows = x.len();

    // Design matrix: a column of ones for the intercept, then x.
    let mut data = Vec::with_capacity(rows * 2);
    for &xi in x {
        data.push(1.0);
        data.push(xi);
    }
    let design = DMatrix::from_row_slice(rows, 2, &data);
    let rhs = DVector::from_column_slice(y);

    let svd = design.svd(true, true);
    // solve() falls back to a minimum-norm answer for a singular system,
    // so rank deficiency has to be checked first.
    if svd.rank(1e-12) < 2 {
        return None;
    }
    let coefficients = svd.solve(&rhs, 1e-12).ok()?;
    let intercept = coefficients[0];
    let slope = coefficients[1];

    let mean_y = y.iter().sum::<f64>() / rows as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    // Zero total variance carries no correlation to report.
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        n: rows,
    })
}
