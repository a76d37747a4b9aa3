//! Least-squares harmonic fitting shared by both strategies.
//!
//! Each constituent contributes a cosine and a sine column with its nodal
//! factors folded in:
//! ```text
//! f A cos(ωt + u - g) = a · f cos(ωt + u) + b · f sin(ωt + u)
//! ```
//! with `a = A cos g`, `b = A sin g`. After solving
//! ```text
//! A = √(a² + b²)
//! g = atan2(b, a)
//! ```
//! Confidence intervals come from the coefficient covariance σ²(XᵀX)⁻¹
//! propagated linearly to amplitude and phase.

use super::constituents::Constituent;
use super::nodal::NodalFactors;
use super::wrap_degrees;
use crate::error::{Result, TideError};
use faer::{Mat, linalg::solvers::Solve};

/// 95% two-sided normal quantile.
const CI_95: f64 = 1.96;

/// Largest variance inflation `(XᵀX)ᵢᵢ · (XᵀX)⁻¹ᵢᵢ` accepted before a column
/// is treated as a linear combination of the others.
const MAX_VARIANCE_INFLATION: f64 = 1e10;

/// Result for a single fitted constituent.
#[derive(Clone, Copy, Debug)]
pub struct FittedConstituent {
    pub constituent: &'static Constituent,
    /// Amplitude (units of the input series)
    pub amplitude: f64,
    /// Phase lag in degrees [0, 360)
    pub phase: f64,
    /// 95% confidence half-width of the amplitude
    pub amplitude_ci: f64,
    /// 95% confidence half-width of the phase in degrees
    pub phase_ci: f64,
    /// Signal-to-noise ratio (A / A_ci)²
    pub snr: f64,
}

impl FittedConstituent {
    /// Evaluate at `t` hours from the fit origin with nodal factors applied.
    pub fn evaluate(&self, t: f64, nodal: &NodalFactors) -> f64 {
        let arg = self.constituent.angular_frequency() * t + (nodal.u - self.phase).to_radians();
        nodal.f * self.amplitude * arg.cos()
    }
}

/// Full least-squares result.
#[derive(Clone, Debug)]
pub struct LeastSquaresFit {
    /// Fitted mean (zero when no mean column was used)
    pub mean: f64,
    /// 95% confidence half-width of the mean
    pub mean_ci: f64,
    /// Fitted trend per hour (zero when no trend column was used)
    pub slope: f64,
    /// Fitted constituents, in the order requested
    pub constituents: Vec<FittedConstituent>,
    /// Residual variance (unexplained variance)
    pub residual_variance: f64,
    /// Coefficient of determination R²
    pub r_squared: f64,
    /// Number of samples used
    pub n_samples: usize,
}

impl LeastSquaresFit {
    /// Evaluate the fitted signal at `t` hours from the origin.
    ///
    /// Constituents with SNR below `min_snr` are left out.
    pub fn evaluate(&self, t: f64, nodal: &[NodalFactors], min_snr: f64) -> f64 {
        let mut eta = self.mean + self.slope * t;
        for (c, f) in self.constituents.iter().zip(nodal) {
            if c.snr >= min_snr {
                eta += c.evaluate(t, f);
            }
        }
        eta
    }

    /// Get a constituent by name.
    pub fn get_constituent(&self, name: &str) -> Option<&FittedConstituent> {
        self.constituents.iter().find(|c| c.constituent.name == name)
    }
}

/// Fit constituents to samples using least squares.
///
/// `times` are hours from the caller's origin, `values` must not contain
/// `NaN`. Builds the design matrix and solves the normal equations with a
/// full-pivot LU decomposition.
///
/// # Errors
///
/// `Analysis` if there are fewer samples than unknowns or the system is
/// singular.
pub fn fit_harmonics(
    times: &[f64],
    values: &[f64],
    constituents: &[&'static Constituent],
    nodal: &[NodalFactors],
    include_mean: bool,
    include_trend: bool,
) -> Result<LeastSquaresFit> {
    let n_data = times.len();
    let n_base = include_mean as usize + include_trend as usize;
    let n_unknowns = n_base + 2 * constituents.len();

    if values.len() != n_data || nodal.len() != constituents.len() {
        return Err(TideError::analysis("inconsistent least-squares inputs"));
    }
    if n_data < n_unknowns {
        return Err(TideError::analysis(format!(
            "need at least {} samples to fit {} constituents, got {}",
            n_unknowns,
            constituents.len(),
            n_data
        )));
    }

    if n_unknowns == 0 {
        return Ok(summarize(values, &vec![0.0; n_data], 0.0, 0.0, 0.0, Vec::new()));
    }

    // Build design matrix
    // A = [1, t, f cos(ω₁t + u₁), f sin(ω₁t + u₁), ...]
    let mut a = Mat::<f64>::zeros(n_data, n_unknowns);
    for (i, &t) in times.iter().enumerate() {
        let mut col = 0;
        if include_mean {
            a[(i, col)] = 1.0;
            col += 1;
        }
        if include_trend {
            a[(i, col)] = t;
            col += 1;
        }
        for (j, (c, f)) in constituents.iter().zip(nodal).enumerate() {
            let arg = c.angular_frequency() * t + f.u.to_radians();
            a[(i, col + 2 * j)] = f.f * arg.cos();
            a[(i, col + 2 * j + 1)] = f.f * arg.sin();
        }
    }

    // Normal equations: (A'A) x = A'y
    let mut ata = Mat::<f64>::zeros(n_unknowns, n_unknowns);
    for i in 0..n_unknowns {
        for j in i..n_unknowns {
            let mut sum = 0.0;
            for k in 0..n_data {
                sum += a[(k, i)] * a[(k, j)];
            }
            ata[(i, j)] = sum;
            ata[(j, i)] = sum;
        }
    }

    let mut aty = Mat::<f64>::zeros(n_unknowns, 1);
    for i in 0..n_unknowns {
        let mut sum = 0.0;
        for k in 0..n_data {
            sum += a[(k, i)] * values[k];
        }
        aty[(i, 0)] = sum;
    }

    let lu = ata.as_ref().full_piv_lu();
    let x = lu.solve(&aty);
    let inverse = lu.solve(&Mat::<f64>::identity(n_unknowns, n_unknowns));

    if (0..n_unknowns).any(|i| !x[(i, 0)].is_finite()) {
        return Err(TideError::analysis(
            "least-squares system is singular (rank-deficient constituent fit)",
        ));
    }
    if let Some(column) = ill_conditioned_column(&ata, &inverse, n_data) {
        return Err(TideError::analysis(format!(
            "least-squares system is ill-conditioned: {} cannot be separated from the \
             other columns at this sampling (rank-deficient constituent fit)",
            column_label(column, constituents, include_mean, include_trend)
        )));
    }

    let fitted: Vec<f64> = (0..n_data)
        .map(|k| (0..n_unknowns).map(|i| a[(k, i)] * x[(i, 0)]).sum())
        .collect();

    // Noise variance for the covariance uses the residual degrees of freedom
    let dof = n_data - n_unknowns;
    let ssr: f64 = values
        .iter()
        .zip(fitted.iter())
        .map(|(&obs, &fit)| (obs - fit).powi(2))
        .sum();
    let sigma2 = if dof > 0 { ssr / dof as f64 } else { 0.0 };
    let var = |i: usize, j: usize| sigma2 * inverse[(i, j)];

    let mut col = 0;
    let (mean, mean_ci) = if include_mean {
        col += 1;
        (x[(0, 0)], CI_95 * var(0, 0).max(0.0).sqrt())
    } else {
        (0.0, 0.0)
    };
    let slope = if include_trend {
        col += 1;
        x[(col - 1, 0)]
    } else {
        0.0
    };

    let mut fitted_constituents = Vec::with_capacity(constituents.len());
    for (j, c) in constituents.iter().enumerate() {
        let ia = col + 2 * j;
        let ib = ia + 1;
        let a_coef = x[(ia, 0)];
        let b_coef = x[(ib, 0)];

        let amplitude = (a_coef * a_coef + b_coef * b_coef).sqrt();
        let phase = wrap_degrees(b_coef.atan2(a_coef).to_degrees());

        let (var_a, var_b, cov_ab) = (var(ia, ia), var(ib, ib), var(ia, ib));
        let (amp_sigma, phase_sigma) = if amplitude > 0.0 {
            let a2 = amplitude * amplitude;
            let amp_var = (a_coef * a_coef * var_a
                + b_coef * b_coef * var_b
                + 2.0 * a_coef * b_coef * cov_ab)
                / a2;
            let pha_var = (b_coef * b_coef * var_a + a_coef * a_coef * var_b
                - 2.0 * a_coef * b_coef * cov_ab)
                / (a2 * a2);
            (amp_var.max(0.0).sqrt(), pha_var.max(0.0).sqrt().to_degrees())
        } else {
            ((var_a + var_b).max(0.0).sqrt(), 180.0)
        };

        let amplitude_ci = CI_95 * amp_sigma;
        let snr = if amplitude_ci > 0.0 {
            (amplitude / amplitude_ci).powi(2)
        } else {
            f64::INFINITY
        };

        fitted_constituents.push(FittedConstituent {
            constituent: *c,
            amplitude,
            phase,
            amplitude_ci,
            phase_ci: (CI_95 * phase_sigma).min(180.0),
            snr,
        });
    }

    Ok(summarize(values, &fitted, mean, mean_ci, slope, fitted_constituents))
}

/// First column that is numerically zero or whose variance inflation is
/// out of range.
fn ill_conditioned_column(ata: &Mat<f64>, inverse: &Mat<f64>, n_data: usize) -> Option<usize> {
    let zero_norm = f64::EPSILON * n_data as f64;
    (0..ata.nrows()).find(|&i| {
        let norm = ata[(i, i)];
        let inflation = norm * inverse[(i, i)];
        norm <= zero_norm || !(0.0..=MAX_VARIANCE_INFLATION).contains(&inflation)
    })
}

fn column_label(
    column: usize,
    constituents: &[&'static Constituent],
    include_mean: bool,
    include_trend: bool,
) -> String {
    let mut index = column;
    if include_mean {
        if index == 0 {
            return "the mean".to_string();
        }
        index -= 1;
    }
    if include_trend {
        if index == 0 {
            return "the trend".to_string();
        }
        index -= 1;
    }
    match constituents.get(index / 2) {
        Some(c) => format!("constituent {}", c.name),
        None => format!("column {column}"),
    }
}

fn summarize(
    values: &[f64],
    fitted: &[f64],
    mean: f64,
    mean_ci: f64,
    slope: f64,
    constituents: Vec<FittedConstituent>,
) -> LeastSquaresFit {
    let n_data = values.len();

    let residual_variance = if n_data > 1 {
        values
            .iter()
            .zip(fitted.iter())
            .map(|(&obs, &fit)| (obs - fit).powi(2))
            .sum::<f64>()
            / (n_data - 1) as f64
    } else {
        0.0
    };

    let total_variance = if n_data > 1 {
        let m = values.iter().sum::<f64>() / n_data as f64;
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n_data - 1) as f64
    } else {
        0.0
    };

    // R² = 1 - SS_res / SS_tot
    let r_squared = if total_variance > 1e-10 {
        1.0 - residual_variance / total_variance
    } else {
        1.0
    };

    LeastSquaresFit {
        mean,
        mean_ci,
        slope,
        constituents,
        residual_variance,
        r_squared,
        n_samples: n_data,
    }
}
