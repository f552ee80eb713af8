//! Figure rendering for thermal and tensile runs.

use crate::stats::SampleSet;
use crate::thermal::ThermalBatch;
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

/// Line colors cycled over samples, matching the lab's plotting palette.
pub const CURVE_COLORS: [RGBColor; 8] = [
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0x17, 0xbe, 0xcf),
    RGBColor(0xbc, 0xbd, 0x22),
];

/// Upper axis bound with 5% headroom over the largest finite value.
///
/// Falls back to 1.0 when no positive finite value exists, so an axis can
/// always be built.
fn padded_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max * 1.05
    } else {
        1.0
    }
}

/// Renders the two-panel TGA figure: weight percent on the left, the
/// negated weight derivative on the right.
pub fn plot_tga_curves<P: AsRef<Path>>(path: P, title: &str, batch: &ThermalBatch) -> Result<()> {
    let root = BitMapBackend::new(path.as_ref(), (1560, 650)).into_drawing_area();
    root.fill(&WHITE)?;
    root.draw(&Text::new(
        title,
        (10, 10),
        ("sans-serif", 24).into_font().color(&BLACK),
    ))?;
    let panels = root.margin(40, 5, 5, 5);
    let (left, right) = panels.split_horizontally(775);

    let mut weight_chart = ChartBuilder::on(&left)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..600.0, 0.0..100.0)?;
    weight_chart
        .configure_mesh()
        .x_desc("Temperature (°C)")
        .y_desc("Weight %")
        .label_style(("sans-serif", 14))
        .draw()?;
    for (i, (name, sample)) in batch.iter().enumerate() {
        let color = CURVE_COLORS[i % CURVE_COLORS.len()];
        weight_chart
            .draw_series(LineSeries::new(
                sample
                    .curve
                    .temperature_c
                    .iter()
                    .zip(&sample.curve.weight_percent)
                    .map(|(&t, &w)| (t, w)),
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }
    weight_chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    let deriv_top = padded_max(
        batch
            .iter()
            .flat_map(|(_, sample)| sample.curve.deriv_weight.iter().map(|d| -d)),
    );
    let mut deriv_chart = ChartBuilder::on(&right)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..700.0, 0.0..deriv_top)?;
    deriv_chart
        .configure_mesh()
        .x_desc("Temperature (°C)")
        .y_desc("Deriv. Weight (%/°C)")
        .label_style(("sans-serif", 14))
        .draw()?;
    for (i, (name, sample)) in batch.iter().enumerate() {
        let color = CURVE_COLORS[i % CURVE_COLORS.len()];
        deriv_chart
            .draw_series(LineSeries::new(
                sample
                    .curve
                    .temperature_c
                    .iter()
                    .zip(&sample.curve.deriv_weight)
                    .map(|(&t, &d)| (t, -d)),
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }
    deriv_chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Renders every trial's stress-strain curve on one set of axes.
///
/// Strain is plotted in percent. Colors cycle per trial, matching the
/// trial order in the legend.
pub fn plot_stress_strain<P: AsRef<Path>>(path: P, title: &str, set: &SampleSet) -> Result<()> {
    let strain_top = padded_max(
        set.iter()
            .flat_map(|(_, trials)| trials.iter())
            .flat_map(|trial| trial.curve.strain.iter().map(|s| s * 100.0)),
    );
    let stress_top = padded_max(
        set.iter()
            .flat_map(|(_, trials)| trials.iter())
            .flat_map(|trial| trial.curve.stress_mpa.iter().copied()),
    );

    let root = BitMapBackend::new(path.as_ref(), (1000, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..strain_top, 0.0..stress_top)?;
    chart
        .configure_mesh()
        .x_desc("Strain (%)")
        .y_desc("Stress (MPa)")
        .label_style(("sans-serif", 14))
        .draw()?;

    let mut line_index = 0;
    for (name, trials) in set.iter() {
        for trial in trials {
            let color = CURVE_COLORS[line_index % CURVE_COLORS.len()];
            line_index += 1;
            let label = format!("{} {}", name, trial.label);
            chart
                .draw_series(LineSeries::new(
                    trial
                        .curve
                        .strain
                        .iter()
                        .zip(&trial.curve.stress_mpa)
                        .map(|(&strain, &stress)| (strain * 100.0, stress)),
                    color.stroke_width(2),
                ))?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 14))
        .draw()?;

    root.present()?;
    Ok(())
}
