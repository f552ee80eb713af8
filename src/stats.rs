//! Cross-trial statistics and the per-run sample aggregate.

use hashbrown::HashMap;
use serde::Serialize;

use crate::tensile::{MechanicalProperties, TrialCurve};

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); 0 when fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Mean, spread, and relative spread of one property across trials.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PropertyStats {
    pub mean: f64,
    pub std: f64,
    pub cv_percent: f64,
    pub n: usize,
}

/// Reduces one property's values to summary statistics.
///
/// The coefficient of variation is 0 for a single value and for an exactly
/// zero mean, both of which would otherwise divide by zero or overstate
/// spread.
pub fn property_stats(values: &[f64]) -> PropertyStats {
    let n = values.len();
    let mean = self::mean(values);
    let std = std_dev(values);
    let cv_percent = if n > 1 && mean != 0.0 {
        std / mean * 100.0
    } else {
        0.0
    };
    PropertyStats {
        mean,
        std,
        cv_percent,
        n,
    }
}

/// Statistical summary of one sample group over the four tracked properties.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub sample: String,
    pub n_trials: usize,
    pub youngs_modulus_mpa: PropertyStats,
    pub uts_mpa: PropertyStats,
    pub strain_at_break_percent: PropertyStats,
    pub toughness_mj_per_m3: PropertyStats,
}

/// Recomputes the summary for one group from scratch.
pub fn summarize_group(sample: &str, properties: &[MechanicalProperties]) -> SummaryRecord {
    let collect =
        |f: fn(&MechanicalProperties) -> f64| -> Vec<f64> { properties.iter().map(f).collect() };

    SummaryRecord {
        sample: sample.to_string(),
        n_trials: properties.len(),
        youngs_modulus_mpa: property_stats(&collect(|p| p.youngs_modulus_mpa)),
        uts_mpa: property_stats(&collect(|p| p.uts_mpa)),
        strain_at_break_percent: property_stats(&collect(|p| p.strain_at_break_percent)),
        toughness_mj_per_m3: property_stats(&collect(|p| p.toughness_mj_per_m3)),
    }
}

/// One loaded trial: its label within the group, the curve, and the
/// extracted properties.
#[derive(Debug)]
pub struct Trial {
    pub label: String,
    pub curve: TrialCurve,
    pub properties: MechanicalProperties,
}

/// Accumulates trials grouped by sample identity over a run.
///
/// Append-only; groups iterate in first-insertion order and trials within a
/// group in load order.
#[derive(Debug, Default)]
pub struct SampleSet {
    order: Vec<String>,
    groups: HashMap<String, Vec<Trial>>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a trial to its sample group, creating the group on first use,
    /// and returns the label assigned within the group ("Run 1", "Run 2",
    /// ...).
    pub fn append(
        &mut self,
        sample: &str,
        curve: TrialCurve,
        properties: MechanicalProperties,
    ) -> String {
        if !self.groups.contains_key(sample) {
            self.order.push(sample.to_string());
        }
        let group = self.groups.entry(sample.to_string()).or_default();
        let label = format!("Run {}", group.len() + 1);
        group.push(Trial {
            label: label.clone(),
            curve,
            properties,
        });
        label
    }

    /// Number of sample groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of trials across all groups.
    pub fn trial_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Groups in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Trial])> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.groups[name].as_slice()))
    }

    /// Summary records for every group, in presentation order.
    pub fn summaries(&self) -> Vec<SummaryRecord> {
        self.iter()
            .map(|(name, trials)| {
                let props: Vec<MechanicalProperties> =
                    trials.iter().map(|t| t.properties).collect();
                summarize_group(name, &props)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TensileConfig;
    use crate::tensile::mechanical_properties;
    use approx::assert_relative_eq;

    fn trial_with_peak_load(peak: f64) -> (TrialCurve, MechanicalProperties) {
        let rows: Vec<[f64; 3]> = (0..12)
            .map(|i| {
                let crosshead = 0.05 * i as f64;
                [crosshead, peak * i as f64 / 11.0, i as f64]
            })
            .collect();
        let curve = TrialCurve::new(rows, 30.0, 3.0).expect("trial should build");
        let props = mechanical_properties(&curve, &TensileConfig::default());
        (curve, props)
    }

    #[test]
    fn test_sample_std_uses_ddof_one() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0, epsilon = 1e-12);
        assert_relative_eq!(std_dev(&values), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = property_stats(&[42.5]);
        assert_eq!(stats.n, 1);
        assert_relative_eq!(stats.mean, 42.5, epsilon = 1e-12);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.cv_percent, 0.0);
    }

    #[test]
    fn test_zero_mean_suppresses_cv() {
        let stats = property_stats(&[-1.0, 1.0]);
        assert_eq!(stats.mean, 0.0);
        assert_relative_eq!(stats.std, 2.0f64.sqrt(), epsilon = 1e-12);
        assert_eq!(stats.cv_percent, 0.0);
    }

    #[test]
    fn test_statistics_are_order_independent() {
        let forward = property_stats(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let shuffled = property_stats(&[4.0, 1.0, 5.0, 3.0, 2.0]);
        assert_relative_eq!(forward.mean, shuffled.mean, epsilon = 1e-12);
        assert_relative_eq!(forward.std, shuffled.std, epsilon = 1e-12);
        assert_relative_eq!(forward.cv_percent, shuffled.cv_percent, epsilon = 1e-12);
    }

    #[test]
    fn test_cv_matches_hand_computation() {
        let stats = property_stats(&[10.0, 12.0, 14.0]);
        assert_relative_eq!(stats.mean, 12.0, epsilon = 1e-12);
        assert_relative_eq!(stats.std, 2.0, epsilon = 1e-12);
        assert_relative_eq!(stats.cv_percent, 2.0 / 12.0 * 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_set_groups_and_labels() {
        let mut set = SampleSet::new();
        let (c1, p1) = trial_with_peak_load(60.0);
        let (c2, p2) = trial_with_peak_load(66.0);
        let (c3, p3) = trial_with_peak_load(90.0);

        assert_eq!(set.append("MEK-5%", c1, p1), "Run 1");
        assert_eq!(set.append("Bulk", c3, p3), "Run 1");
        assert_eq!(set.append("MEK-5%", c2, p2), "Run 2");

        assert_eq!(set.len(), 2);
        assert_eq!(set.trial_count(), 3);
        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["MEK-5%", "Bulk"]);

        let summaries = set.summaries();
        assert_eq!(summaries[0].n_trials, 2);
        assert_eq!(summaries[1].n_trials, 1);
        // Peak loads 60 and 66 N over 3 mm^2 give 20 and 22 MPa.
        assert_relative_eq!(summaries[0].uts_mpa.mean, 21.0, epsilon = 1e-9);
        assert_relative_eq!(
            summaries[0].uts_mpa.std,
            2.0f64.sqrt(),
            epsilon = 1e-9
        );
        assert_eq!(summaries[1].uts_mpa.std, 0.0);
    }
}
