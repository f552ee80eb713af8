//! Thermal (TGA) and tensile characterization of polymer film samples.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "cli")]
pub mod app_logic;
pub mod config;
pub mod fit;
#[cfg(feature = "cli")]
pub mod parser;
#[cfg(feature = "cli")]
pub mod plot;
#[cfg(feature = "cli")]
pub mod report;
pub mod stats;
pub mod tensile;
pub mod thermal;

// When the "wasm" feature is enabled, use wasm_bindgen to expose the thermal
// event scan to the host environment.
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn run_thermal_scan(temperature_c: &[f64], weight_mg: &[f64]) -> Vec<f64> {
    // Events depend only on temperature and weight, so a synthetic time
    // axis keeps the interface to two arrays.
    let time: Vec<f64> = (0..weight_mg.len()).map(|i| i as f64).collect();
    let curve = match thermal::ThermalCurve::new(time, temperature_c.to_vec(), weight_mg.to_vec())
    {
        Ok(curve) => curve,
        Err(_) => return vec![f64::NAN; 4],
    };
    let events = thermal::thermal_events(&curve, &config::TgaConfig::default());
    // The four metrics are encoded positionally; an undefined metric is NaN.
    vec![
        events.t5_c.unwrap_or(f64::NAN),
        events.t50_c.unwrap_or(f64::NAN),
        events.t_max_c.unwrap_or(f64::NAN),
        events.residue_percent.unwrap_or(f64::NAN),
    ]
}
