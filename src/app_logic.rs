//! A module for the main application logic of the analysis tool.

use crate::config::{load_config, Config};
use crate::parser;
use crate::plot;
use crate::report::{self, DiagnosticKind, Diagnostics};
use crate::stats::SampleSet;
use crate::tensile::{mechanical_properties, FitRegion, TrialCurve};
use crate::thermal::{thermal_events, ThermalBatch, ThermalSample};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Arguments for a TGA run, mirroring the command line.
#[derive(Debug, Default)]
pub struct TgaArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub out_dir: Option<String>,
    pub title: Option<String>,
}

/// Arguments for a tensile run, mirroring the command line.
#[derive(Debug, Default)]
pub struct TensileArgs {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub out_dir: Option<String>,
    pub title: Option<String>,
    pub sample: Option<String>,
    pub gauge_length_mm: Option<f64>,
    pub cross_section_area_mm2: Option<f64>,
    pub group_by_name: bool,
}

fn load_run_config(path: &Option<PathBuf>) -> Result<Config> {
    match path {
        Some(p) => load_config(p).map_err(|err| {
            anyhow::anyhow!("failed to load configuration {}: {}", p.display(), err)
        }),
        None => Ok(Config::default()),
    }
}

fn ensure_out_dir(config: &Config) -> Result<PathBuf> {
    let out_dir = PathBuf::from(&config.report.out_dir);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    Ok(out_dir)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("input")
        .to_string()
}

fn fmt_celsius(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}°C", v),
        None => "N/A".to_string(),
    }
}

/// Runs the thermal analysis over one file or a folder of instrument
/// exports.
pub fn run_tga(args: &TgaArgs) -> Result<()> {
    let mut config = load_run_config(&args.config)?;
    if let Some(dir) = &args.out_dir {
        config.report.out_dir = dir.clone();
    }
    if let Some(title) = &args.title {
        config.report.tga_plot_title = title.clone();
    }
    config.validate().context("invalid configuration")?;

    let files = parser::discover_files(&args.input, &["csv"])?;
    if files.is_empty() {
        bail!("no .csv files found under {}", args.input.display());
    }

    let mut diagnostics = Diagnostics::new();
    let mut batch = ThermalBatch::new();
    for file in &files {
        let source = file_label(file);
        let curve = match parser::read_tga_file(file) {
            Ok(curve) => curve,
            Err(err) => {
                log::warn!("{:#}", err);
                diagnostics.record(DiagnosticKind::Skipped, &source, &format!("{:#}", err));
                continue;
            }
        };
        let name = parser::extract_sample_name(file);
        let events = thermal_events(&curve, &config.tga);
        let (t_min, t_max) = curve
            .temperature_c
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            });
        let weight_min = curve
            .weight_percent
            .iter()
            .fold(f64::INFINITY, |lo, &w| lo.min(w));
        log::info!(
            "{}: {} data points, {:.0} to {:.0}°C, weight loss {:.1}%",
            name,
            curve.len(),
            t_min,
            t_max,
            100.0 - weight_min
        );
        log::info!(
            "{}: T5 {}, T50 {}, Tmax {}",
            name,
            fmt_celsius(events.t5_c),
            fmt_celsius(events.t50_c),
            fmt_celsius(events.t_max_c)
        );

        let mut missing = Vec::new();
        if events.t5_c.is_none() {
            missing.push("T5");
        }
        if events.t50_c.is_none() {
            missing.push("T50");
        }
        if events.t_max_c.is_none() {
            missing.push("Tmax");
        }
        if !missing.is_empty() {
            diagnostics.record(
                DiagnosticKind::Undefined,
                &name,
                &format!("{} not reached within the sweep", missing.join(", ")),
            );
        }

        batch.insert(
            name,
            ThermalSample {
                curve,
                events,
                source: file.clone(),
            },
        );
    }
    if batch.is_empty() {
        bail!("no usable TGA data in {}", args.input.display());
    }

    println!("\n{}", report::render_tga_table(&batch));

    let out_dir = ensure_out_dir(&config)?;
    let title = &config.report.tga_plot_title;
    let plot_path = out_dir.join(format!("{}.png", report::sanitize_file_stem(title)));
    plot::plot_tga_curves(&plot_path, title, &batch)?;
    log::info!("wrote {}", plot_path.display());

    let summary_path = out_dir.join("tga_summary.csv");
    report::write_tga_summary_csv(&summary_path, &batch)?;
    log::info!("wrote {}", summary_path.display());

    for (name, sample) in batch.iter() {
        let curve_path = report::write_tga_curve_csv(&out_dir, name, sample)?;
        log::info!("wrote {}", curve_path.display());
    }

    let json_path = out_dir.join("tga_results.json");
    report::write_tga_json(&json_path, &batch, &diagnostics)?;
    log::info!("wrote {}", json_path.display());

    if !diagnostics.is_empty() {
        println!("\n{}", diagnostics.render());
    }
    Ok(())
}

/// Runs the tensile analysis over one file or a folder of trial frames.
pub fn run_tensile(args: &TensileArgs) -> Result<()> {
    let mut config = load_run_config(&args.config)?;
    if let Some(dir) = &args.out_dir {
        config.report.out_dir = dir.clone();
    }
    if let Some(title) = &args.title {
        config.report.tensile_plot_title = title.clone();
    }
    if let Some(gauge) = args.gauge_length_mm {
        config.tensile.gauge_length_mm = gauge;
    }
    if let Some(area) = args.cross_section_area_mm2 {
        config.tensile.cross_section_area_mm2 = area;
    }
    config.validate().context("invalid configuration")?;

    let files = parser::discover_files(&args.input, &["txt", "csv"])?;
    if files.is_empty() {
        bail!("no .txt or .csv files found under {}", args.input.display());
    }

    let base_sample = args.sample.clone().unwrap_or_else(|| "Sample".to_string());
    let mut diagnostics = Diagnostics::new();
    let mut set = SampleSet::new();
    for file in &files {
        let source = file_label(file);
        let rows = match parser::read_tensile_file(file) {
            Ok(rows) => rows,
            Err(err) => {
                log::warn!("{:#}", err);
                diagnostics.record(DiagnosticKind::Skipped, &source, &format!("{:#}", err));
                continue;
            }
        };
        if rows.len() < config.tensile.min_trial_rows {
            diagnostics.record(
                DiagnosticKind::Skipped,
                &source,
                &format!(
                    "only {} rows parsed ({} required)",
                    rows.len(),
                    config.tensile.min_trial_rows
                ),
            );
            continue;
        }
        let row_count = rows.len();
        let sample_name = if args.group_by_name {
            parser::extract_sample_name(file)
        } else {
            base_sample.clone()
        };
        let curve = match TrialCurve::new(
            rows,
            config.tensile.gauge_length_mm,
            config.tensile.cross_section_area_mm2,
        ) {
            Ok(curve) => curve,
            Err(err) => {
                diagnostics.record(DiagnosticKind::Skipped, &source, &err.to_string());
                continue;
            }
        };
        let properties = mechanical_properties(&curve, &config.tensile);
        let label = set.append(&sample_name, curve, properties);
        let scope = format!("{} {}", sample_name, label);
        match properties.fit_region {
            FitRegion::WholeTrial => diagnostics.record(
                DiagnosticKind::Degraded,
                &scope,
                "modulus fitted over the whole trial",
            ),
            FitRegion::Insufficient => diagnostics.record(
                DiagnosticKind::Undefined,
                &scope,
                "too few points for a modulus fit",
            ),
            FitRegion::StrainWindow => {}
        }
        log::info!(
            "{} {}: {} rows, modulus {:.1} MPa, UTS {:.2} MPa",
            sample_name,
            label,
            row_count,
            properties.youngs_modulus_mpa,
            properties.uts_mpa
        );
    }
    if set.is_empty() {
        bail!("no usable tensile trials in {}", args.input.display());
    }

    let records = set.summaries();
    println!(
        "\n{}",
        report::render_publication_table(&config.report.publication_table_title, &records)
    );

    let out_dir = ensure_out_dir(&config)?;
    let title = &config.report.tensile_plot_title;
    let plot_path = out_dir.join(format!("{}.png", report::sanitize_file_stem(title)));
    plot::plot_stress_strain(&plot_path, title, &set)?;
    log::info!("wrote {}", plot_path.display());

    let table_path = out_dir.join("publication_table.csv");
    report::write_publication_csv(&table_path, &records)?;
    log::info!("wrote {}", table_path.display());

    let stats_path = out_dir.join("statistical_summary.csv");
    report::write_statistical_summary_csv(&stats_path, &records)?;
    log::info!("wrote {}", stats_path.display());

    let trials_path = out_dir.join("individual_trials.csv");
    report::write_individual_trials_csv(&trials_path, &set)?;
    log::info!("wrote {}", trials_path.display());

    let json_path = out_dir.join("tensile_results.json");
    report::write_tensile_json(&json_path, &set, &diagnostics)?;
    log::info!("wrote {}", json_path.display());

    if !diagnostics.is_empty() {
        println!("\n{}", diagnostics.render());
    }
    Ok(())
}
