//! A module for validating and managing the analysis configuration.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Represents an error raised while validating configuration or input data.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a given message.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error.
    pub fn new(message: &str) -> ValidationError {
        ValidationError {
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Top-level configuration for an analysis run.
///
/// Every section and field carries a default, so an absent or partial
/// configuration file still yields a runnable setup.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tga: TgaConfig,
    pub tensile: TensileConfig,
    pub report: ReportConfig,
}

impl Config {
    /// Validates every section of the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tga.validate()?;
        self.tensile.validate()?;
        self.report.validate()?;
        Ok(())
    }
}

/// Thresholds and windows for thermal event extraction.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TgaConfig {
    /// Weight percent remaining at which T5 is read (5% lost).
    pub t5_threshold_percent: f64,
    /// Weight percent remaining at which T50 is read (50% lost).
    pub t50_threshold_percent: f64,
    /// Temperature window, in °C, searched for the maximum decomposition
    /// rate.
    pub decomposition_window_c: [f64; 2],
    /// Temperature, in °C, at which the residue is read.
    pub residue_temperature_c: f64,
}

impl Default for TgaConfig {
    fn default() -> Self {
        TgaConfig {
            t5_threshold_percent: 95.0,
            t50_threshold_percent: 50.0,
            decomposition_window_c: [200.0, 600.0],
            residue_temperature_c: 600.0,
        }
    }
}

impl TgaConfig {
    /// Validates thresholds and the decomposition window.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` when every value is usable. Otherwise returns a
    /// `ValidationError` naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.t5_threshold_percent > 0.0 && self.t5_threshold_percent <= 100.0) {
            return Err(ValidationError::new(&format!(
                "t5_threshold_percent must be above 0.0 and at most 100.0, got {}",
                self.t5_threshold_percent
            )));
        }
        if !(self.t50_threshold_percent > 0.0 && self.t50_threshold_percent <= 100.0) {
            return Err(ValidationError::new(&format!(
                "t50_threshold_percent must be above 0.0 and at most 100.0, got {}",
                self.t50_threshold_percent
            )));
        }
        let [lo, hi] = self.decomposition_window_c;
        if lo.is_nan() || hi.is_nan() || lo >= hi {
            return Err(ValidationError::new(&format!(
                "decomposition_window_c must be ordered low to high, got [{}, {}]",
                lo, hi
            )));
        }
        if !self.residue_temperature_c.is_finite() || self.residue_temperature_c <= 0.0 {
            return Err(ValidationError::new(&format!(
                "residue_temperature_c must be greater than 0.0, got {}",
                self.residue_temperature_c
            )));
        }
        Ok(())
    }
}

/// Specimen geometry and fit parameters for tensile analysis.
///
/// # Examples
///
/// ```
/// use mechtherm::config::TensileConfig;
///
/// let cfg = TensileConfig::default();
/// assert!(cfg.validate().is_ok());
///
/// let mut bad = TensileConfig::default();
/// bad.gauge_length_mm = 0.0;
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TensileConfig {
    /// Initial specimen length, in mm, converting crosshead travel to
    /// strain.
    pub gauge_length_mm: f64,
    /// Specimen cross-section, in mm², converting load to stress.
    pub cross_section_area_mm2: f64,
    /// Strain interval, inclusive on both ends, used for the modulus fit.
    pub strain_window: [f64; 2],
    /// Minimum readings required before a least-squares fit is attempted.
    pub min_fit_points: usize,
    /// Minimum parsed rows for a trial to be accepted.
    pub min_trial_rows: usize,
}

impl Default for TensileConfig {
    fn default() -> Self {
        TensileConfig {
            gauge_length_mm: 30.0,
            cross_section_area_mm2: 3.0,
            strain_window: [0.001, 0.005],
            min_fit_points: 5,
            min_trial_rows: 10,
        }
    }
}

impl TensileConfig {
    /// Validates geometry and fit parameters.
    ///
    /// Gauge length and cross-section area are division denominators and
    /// must be strictly positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.gauge_length_mm.is_finite() || self.gauge_length_mm <= 0.0 {
            return Err(ValidationError::new(&format!(
                "gauge_length_mm must be greater than 0.0, got {}",
                self.gauge_length_mm
            )));
        }
        if !self.cross_section_area_mm2.is_finite() || self.cross_section_area_mm2 <= 0.0 {
            return Err(ValidationError::new(&format!(
                "cross_section_area_mm2 must be greater than 0.0, got {}",
                self.cross_section_area_mm2
            )));
        }
        let [lo, hi] = self.strain_window;
        if lo.is_nan() || hi.is_nan() || lo < 0.0 || lo >= hi {
            return Err(ValidationError::new(&format!(
                "strain_window must be ordered low to high and non-negative, got [{}, {}]",
                lo, hi
            )));
        }
        if self.min_fit_points < 2 {
            return Err(ValidationError::new(&format!(
                "min_fit_points must be at least 2, got {}",
                self.min_fit_points
            )));
        }
        if self.min_trial_rows < 1 {
            return Err(ValidationError::new(&format!(
                "min_trial_rows must be at least 1, got {}",
                self.min_trial_rows
            )));
        }
        Ok(())
    }
}

/// Output destinations and presentation titles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Folder receiving plots, CSV tables, and JSON results.
    pub out_dir: String,
    /// Title of the TGA figure; also names its file.
    pub tga_plot_title: String,
    /// Title of the stress-strain figure; also names its file.
    pub tensile_plot_title: String,
    /// Caption of the publication table.
    pub publication_table_title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            out_dir: "analysis_output".to_string(),
            tga_plot_title: "TGA curves for polyurethane films".to_string(),
            tensile_plot_title: "Tensile Testing Results".to_string(),
            publication_table_title: "Summary of engineering stress data".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.out_dir.trim().is_empty() {
            return Err(ValidationError::new("out_dir must not be empty"));
        }
        if self.tga_plot_title.trim().is_empty() {
            return Err(ValidationError::new("tga_plot_title must not be empty"));
        }
        if self.tensile_plot_title.trim().is_empty() {
            return Err(ValidationError::new("tensile_plot_title must not be empty"));
        }
        if self.publication_table_title.trim().is_empty() {
            return Err(ValidationError::new(
                "publication_table_title must not be empty",
            ));
        }
        Ok(())
    }
}

/// Loads the configuration from a YAML file.
///
/// # Arguments
///
/// * `config_path` - A path reference to the configuration file.
///
/// # Errors
///
/// This function will return an error if reading or parsing the
/// configuration file fails.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(config_path)?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config() {
        let config_path = "tests/config.yaml";
        let config = load_config(config_path).expect("Failed to load config");
        assert!(
            config.validate().is_ok(),
            "Expected Ok(()) but got Err with {:?}",
            config.validate()
        );
        // Values present in the fixture override the defaults; absent ones
        // keep them.
        assert_eq!(config.tensile.gauge_length_mm, 25.0);
        assert_eq!(config.tensile.min_fit_points, 5);
        assert_eq!(config.tga.residue_temperature_c, 600.0);
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        let mut config = Config::default();
        config.tga.decomposition_window_c = [600.0, 200.0];
        let err = config.validate().expect_err("window should be rejected");
        assert!(err.to_string().contains("decomposition_window_c"));
    }

    #[test]
    fn test_non_positive_geometry_is_rejected() {
        let mut config = Config::default();
        config.tensile.cross_section_area_mm2 = 0.0;
        let err = config.validate().expect_err("area should be rejected");
        assert!(err.to_string().contains("cross_section_area_mm2"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "tensile:\n  gauge_length_mm: 28.5\n";
        let config: Config = serde_yaml::from_str(yaml).expect("partial yaml should parse");
        assert_eq!(config.tensile.gauge_length_mm, 28.5);
        assert_eq!(config.tensile.cross_section_area_mm2, 3.0);
        assert_eq!(config.tga.t5_threshold_percent, 95.0);
        assert_eq!(config.report.out_dir, "analysis_output");
    }
}
