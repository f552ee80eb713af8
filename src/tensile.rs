//! Tensile trial analysis: stress-strain derivation and mechanical properties.

use serde::Serialize;

use crate::config::{TensileConfig, ValidationError};
use crate::fit::linear_fit;

/// One tensile trial with its derived stress and strain.
///
/// `strain` and `stress_mpa` are aligned index-for-index with the raw
/// readings and stay in acquisition order.
#[derive(Debug, Clone)]
pub struct TrialCurve {
    pub crosshead_mm: Vec<f64>,
    pub load_n: Vec<f64>,
    pub time_s: Vec<f64>,
    pub strain: Vec<f64>,
    pub stress_mpa: Vec<f64>,
    pub gauge_length_mm: f64,
    pub cross_section_area_mm2: f64,
}

impl TrialCurve {
    /// Builds a trial from parsed `[crosshead, load, time]` rows.
    ///
    /// Gauge length and cross-section area are division denominators, so
    /// both must be strictly positive and finite.
    pub fn new(
        rows: Vec<[f64; 3]>,
        gauge_length_mm: f64,
        cross_section_area_mm2: f64,
    ) -> Result<Self, ValidationError> {
        if rows.is_empty() {
            return Err(ValidationError::new("trial must contain at least one row"));
        }
        if !gauge_length_mm.is_finite() || gauge_length_mm <= 0.0 {
            return Err(ValidationError::new(&format!(
                "gauge length must be positive, got {}",
                gauge_length_mm
            )));
        }
        if !cross_section_area_mm2.is_finite() || cross_section_area_mm2 <= 0.0 {
            return Err(ValidationError::new(&format!(
                "cross-section area must be positive, got {}",
                cross_section_area_mm2
            )));
        }

        let mut crosshead_mm = Vec::with_capacity(rows.len());
        let mut load_n = Vec::with_capacity(rows.len());
        let mut time_s = Vec::with_capacity(rows.len());
        for [crosshead, load, time] in rows {
            crosshead_mm.push(crosshead);
            load_n.push(load);
            time_s.push(time);
        }

        let strain: Vec<f64> = crosshead_mm.iter().map(|c| c / gauge_length_mm).collect();
        let stress_mpa: Vec<f64> = load_n.iter().map(|l| l / cross_section_area_mm2).collect();

        Ok(TrialCurve {
            crosshead_mm,
            load_n,
            time_s,
            strain,
            stress_mpa,
            gauge_length_mm,
            cross_section_area_mm2,
        })
    }

    pub fn len(&self) -> usize {
        self.crosshead_mm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crosshead_mm.is_empty()
    }
}

/// Which data region produced the modulus fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitRegion {
    /// Fit restricted to the configured strain window.
    StrainWindow,
    /// Too few points inside the window; fit over the whole trial instead.
    WholeTrial,
    /// Too few points overall; modulus and R-squared are reported as 0.
    Insufficient,
}

impl FitRegion {
    pub fn label(&self) -> &'static str {
        match self {
            FitRegion::StrainWindow => "strain window",
            FitRegion::WholeTrial => "whole trial",
            FitRegion::Insufficient => "insufficient",
        }
    }
}

/// The fixed per-trial property record. Computed once, immutable.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MechanicalProperties {
    pub youngs_modulus_mpa: f64,
    pub r_squared: f64,
    pub fit_region: FitRegion,
    pub uts_mpa: f64,
    pub strain_at_break_percent: f64,
    pub max_load_n: f64,
    pub max_displacement_mm: f64,
    pub toughness_mj_per_m3: f64,
}

/// Extracts the full property record for one trial.
///
/// The modulus comes from a least-squares fit inside the configured strain
/// window when at least `min_fit_points` readings fall there, from the whole
/// trial when the window is too sparse but the trial itself is long enough,
/// and is reported as 0 with the `Insufficient` flag otherwise. The numeric
/// zero is kept for downstream formatting; `fit_region` is the authoritative
/// quality signal.
pub fn mechanical_properties(trial: &TrialCurve, cfg: &TensileConfig) -> MechanicalProperties {
    let [lo, hi] = cfg.strain_window;
    let (window_strain, window_stress): (Vec<f64>, Vec<f64>) = trial
        .strain
        .iter()
        .zip(trial.stress_mpa.iter())
        .filter(|(s, _)| **s >= lo && **s <= hi)
        .map(|(s, t)| (*s, *t))
        .unzip();

    let (youngs_modulus_mpa, r_squared, fit_region) = if window_strain.len() >= cfg.min_fit_points
    {
        match linear_fit(&window_strain, &window_stress) {
            Some(fit) => (fit.slope, fit.r_squared, FitRegion::StrainWindow),
            None => (0.0, 0.0, FitRegion::Insufficient),
        }
    } else if trial.strain.len() >= cfg.min_fit_points {
        match linear_fit(&trial.strain, &trial.stress_mpa) {
            Some(fit) => (fit.slope, fit.r_squared, FitRegion::WholeTrial),
            None => (0.0, 0.0, FitRegion::Insufficient),
        }
    } else {
        (0.0, 0.0, FitRegion::Insufficient)
    };

    MechanicalProperties {
        youngs_modulus_mpa,
        r_squared,
        fit_region,
        uts_mpa: max_of(&trial.stress_mpa),
        strain_at_break_percent: trial.strain.last().copied().unwrap_or(0.0) * 100.0,
        max_load_n: max_of(&trial.load_n),
        max_displacement_mm: max_of(&trial.crosshead_mm),
        toughness_mj_per_m3: trapezoid_area(&trial.stress_mpa, &trial.strain),
    }
}

/// Trapezoid-rule integral of y with respect to x, taken in sequence order.
///
/// The sign follows the direction of traversal, so the sequences must stay
/// in acquisition order.
pub fn trapezoid_area(y: &[f64], x: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
