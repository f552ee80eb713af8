//! Thermal decomposition analysis: weight-percent curves and event extraction.

use hashbrown::HashMap;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{TgaConfig, ValidationError};

/// A single TGA sweep with its derived curves.
///
/// `weight_percent` is normalized to the first sample's weight, so its first
/// element is exactly 100.0. Both derived curves are computed once at
/// construction and do not change afterwards.
#[derive(Debug, Clone)]
pub struct ThermalCurve {
    pub time_min: Vec<f64>,
    pub temperature_c: Vec<f64>,
    pub weight_mg: Vec<f64>,
    pub weight_percent: Vec<f64>,
    pub deriv_weight: Vec<f64>,
}

impl ThermalCurve {
    /// Builds a curve from the three raw instrument columns.
    ///
    /// Fails when the columns are empty or of unequal length, or when the
    /// first weight (the normalization denominator) is zero or non-finite.
    pub fn new(
        time_min: Vec<f64>,
        temperature_c: Vec<f64>,
        weight_mg: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        if time_min.is_empty() {
            return Err(ValidationError::new("curve must contain at least one sample"));
        }
        if time_min.len() != temperature_c.len() || time_min.len() != weight_mg.len() {
            return Err(ValidationError::new(&format!(
                "column lengths disagree: {} time, {} temperature, {} weight",
                time_min.len(),
                temperature_c.len(),
                weight_mg.len()
            )));
        }
        let initial = weight_mg[0];
        if initial == 0.0 || !initial.is_finite() {
            return Err(ValidationError::new(&format!(
                "initial weight must be finite and non-zero, got {}",
                initial
            )));
        }

        let weight_percent: Vec<f64> = weight_mg.iter().map(|w| w / initial * 100.0).collect();
        let deriv_weight = weight_derivative(&temperature_c, &weight_percent);

        Ok(ThermalCurve {
            time_min,
            temperature_c,
            weight_mg,
            weight_percent,
            deriv_weight,
        })
    }

    pub fn len(&self) -> usize {
        self.time_min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_min.is_empty()
    }
}

/// Central-difference derivative of weight percent with respect to
/// temperature.
///
/// Interior points use the span `T[i+1] - T[i-1]`, endpoints the adjacent
/// one-sided span. Any non-positive span (cooling segment, duplicate
/// reading) leaves that derivative at 0 instead of dividing by it. One or
/// zero samples yield an all-zero sequence.
pub fn weight_derivative(temperature: &[f64], weight_percent: &[f64]) -> Vec<f64> {
    let n = weight_percent.len();
    let mut deriv = vec![0.0; n];
    if n <= 1 {
        return deriv;
    }

    for i in 1..n - 1 {
        let dt = temperature[i + 1] - temperature[i - 1];
        if dt > 0.0 {
            deriv[i] = (weight_percent[i + 1] - weight_percent[i - 1]) / dt;
        }
    }

    let dt_start = temperature[1] - temperature[0];
    if dt_start > 0.0 {
        deriv[0] = (weight_percent[1] - weight_percent[0]) / dt_start;
    }
    let dt_end = temperature[n - 1] - temperature[n - 2];
    if dt_end > 0.0 {
        deriv[n - 1] = (weight_percent[n - 1] - weight_percent[n - 2]) / dt_end;
    }

    deriv
}

/// Decomposition metrics for one sample.
///
/// A `None` field means the event never occurred within the sweep: the
/// weight never dropped to the threshold, or no sample fell inside the
/// decomposition window.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThermalEvents {
    pub t5_c: Option<f64>,
    pub t50_c: Option<f64>,
    pub t_max_c: Option<f64>,
    pub residue_percent: Option<f64>,
}

/// Scans a curve for its decomposition events.
///
/// The four metrics are independent scans over the same arrays; none depends
/// on another's outcome.
pub fn thermal_events(curve: &ThermalCurve, cfg: &TgaConfig) -> ThermalEvents {
    let temperature = &curve.temperature_c;
    let weight = &curve.weight_percent;
    let deriv = &curve.deriv_weight;

    let t5_c = first_crossing(temperature, weight, cfg.t5_threshold_percent);
    let t50_c = first_crossing(temperature, weight, cfg.t50_threshold_percent);

    // Most negative derivative inside the decomposition window; ties keep
    // the earliest index.
    let [lo, hi] = cfg.decomposition_window_c;
    let mut t_max_c = None;
    let mut steepest = f64::INFINITY;
    for i in 0..temperature.len() {
        if temperature[i] >= lo && temperature[i] <= hi && deriv[i] < steepest {
            steepest = deriv[i];
            t_max_c = Some(temperature[i]);
        }
    }

    // Residue at the first reading at or beyond the residue temperature;
    // when the sweep ends short of it, the final reading stands in.
    let residue_percent = match temperature
        .iter()
        .position(|&t| t >= cfg.residue_temperature_c)
    {
        Some(idx) => Some(weight[idx]),
        None => weight.last().copied(),
    };

    ThermalEvents {
        t5_c,
        t50_c,
        t_max_c,
        residue_percent,
    }
}

fn first_crossing(temperature: &[f64], weight_percent: &[f64], threshold: f64) -> Option<f64> {
    weight_percent
        .iter()
        .position(|&w| w <= threshold)
        .map(|idx| temperature[idx])
}

/// One analyzed sample held by a batch.
#[derive(Debug)]
pub struct ThermalSample {
    pub curve: ThermalCurve,
    pub events: ThermalEvents,
    pub source: PathBuf,
}

/// Accumulates analyzed samples over a run, keyed by sample name.
///
/// Append-only during a run. Reloading an existing name replaces its data
/// but keeps the name's original position in presentation order.
#[derive(Debug, Default)]
pub struct ThermalBatch {
    order: Vec<String>,
    samples: HashMap<String, ThermalSample>,
}

impl ThermalBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sample: ThermalSample) {
        let name = name.into();
        if self.samples.insert(name.clone(), sample).is_none() {
            self.order.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Samples in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThermalSample)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), &self.samples[name]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp_config() -> TgaConfig {
        TgaConfig::default()
    }

    #[test]
    fn test_weight_percent_starts_at_exactly_100() {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0],
            vec![25.0, 100.0, 200.0],
            vec![7.31, 6.9, 5.2],
        )
        .expect("curve should build");
        assert_eq!(curve.weight_percent[0], 100.0);
    }

    #[test]
    fn test_linear_decay_gives_constant_derivative() {
        let temperature: Vec<f64> = (0..20).map(|i| 100.0 + 10.0 * i as f64).collect();
        let weight_percent: Vec<f64> = temperature.iter().map(|t| 100.0 - 0.2 * (t - 100.0)).collect();

        let deriv = weight_derivative(&temperature, &weight_percent);
        for d in &deriv {
            assert_relative_eq!(*d, -0.2, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_non_increasing_span_suppresses_derivative() {
        // Index 2 spans T[3] - T[1] = 0, so its derivative stays 0.
        let temperature = vec![0.0, 1.0, 1.0, 1.0, 2.0];
        let weight_percent = vec![100.0, 90.0, 80.0, 70.0, 60.0];

        let deriv = weight_derivative(&temperature, &weight_percent);
        assert_eq!(deriv[2], 0.0);
        assert!(deriv[1] != 0.0);
        assert!(deriv[3] != 0.0);
    }

    #[test]
    fn test_short_sequences_yield_zero_derivative() {
        assert_eq!(weight_derivative(&[], &[]), Vec::<f64>::new());
        assert_eq!(weight_derivative(&[300.0], &[100.0]), vec![0.0]);
    }

    #[test]
    fn test_decomposition_scenario() {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0],
            vec![100.0, 96.0, 70.0, 40.0, 20.0, 15.0],
        )
        .expect("curve should build");
        let events = thermal_events(&curve, &ramp_config());

        // First weight at or below 95% is 70% at 300 C; below 50% is 40% at
        // 400 C. The steepest interior drop is centered on 300 C.
        assert_eq!(events.t5_c, Some(300.0));
        assert_eq!(events.t50_c, Some(400.0));
        assert_eq!(events.t_max_c, Some(300.0));
        assert_relative_eq!(events.residue_percent.unwrap(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_t50_never_earlier_than_t5_for_monotone_loss() {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![100.0, 250.0, 350.0, 450.0, 550.0],
            vec![10.0, 9.2, 6.0, 4.4, 3.0],
        )
        .expect("curve should build");
        let events = thermal_events(&curve, &ramp_config());

        let (t5, t50) = (events.t5_c.unwrap(), events.t50_c.unwrap());
        assert!(t50 >= t5, "t50 {} fell before t5 {}", t50, t5);
    }

    #[test]
    fn test_thresholds_never_crossed_are_undefined() {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0],
            vec![100.0, 150.0, 190.0],
            vec![10.0, 9.9, 9.8],
        )
        .expect("curve should build");
        let events = thermal_events(&curve, &ramp_config());

        assert_eq!(events.t5_c, None);
        assert_eq!(events.t50_c, None);
        // No reading inside the 200-600 C window either.
        assert_eq!(events.t_max_c, None);
    }

    #[test]
    fn test_residue_falls_back_to_last_reading() {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0, 3.0],
            vec![100.0, 250.0, 400.0, 550.0],
            vec![10.0, 8.0, 6.0, 4.0],
        )
        .expect("curve should build");
        let events = thermal_events(&curve, &ramp_config());

        assert_relative_eq!(events.residue_percent.unwrap(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_columns_are_rejected() {
        let result = ThermalCurve::new(vec![0.0, 1.0], vec![100.0], vec![10.0, 9.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_initial_weight_is_rejected() {
        let result = ThermalCurve::new(vec![0.0, 1.0], vec![100.0, 200.0], vec![0.0, 1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_reload_keeps_presentation_order() {
        let make = |points: Vec<f64>| {
            let n = points.len();
            let time: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let temp: Vec<f64> = (0..n).map(|i| 100.0 + 100.0 * i as f64).collect();
            let curve = ThermalCurve::new(time, temp, points).expect("curve should build");
            let events = thermal_events(&curve, &TgaConfig::default());
            ThermalSample {
                curve,
                events,
                source: PathBuf::from("test.csv"),
            }
        };

        let mut batch = ThermalBatch::new();
        batch.insert("A", make(vec![10.0, 9.0, 8.0]));
        batch.insert("B", make(vec![12.0, 11.0, 10.0]));
        batch.insert("A", make(vec![20.0, 10.0, 5.0]));

        assert_eq!(batch.len(), 2);
        let names: Vec<&str> = batch.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "B"]);

        let (_, replaced) = batch.iter().next().expect("batch is non-empty");
        assert_relative_eq!(replaced.curve.weight_mg[0], 20.0, epsilon = 1e-12);
    }
}
