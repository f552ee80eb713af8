//! Console tables, CSV and JSON exports, and run diagnostics.
//!
//! Table layouts follow the lab's reporting conventions, so the console
//! output can be pasted into a notebook or manuscript draft unchanged.

use crate::stats::{PropertyStats, SampleSet, SummaryRecord};
use crate::thermal::{ThermalBatch, ThermalSample};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Classification of a data quality note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// The input was dropped entirely.
    Skipped,
    /// A result was produced with a weaker method than intended.
    Degraded,
    /// A metric could not be defined for the data.
    Undefined,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Skipped => "skipped",
            DiagnosticKind::Degraded => "degraded",
            DiagnosticKind::Undefined => "undefined",
        }
    }
}

/// One data quality note tied to a file or trial.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub scope: String,
    pub message: String,
}

/// Collects data quality notes over a run.
///
/// Notes are reported together after the summary tables instead of
/// interrupting the analysis, and they travel with the JSON export.
#[derive(Debug, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    /// Records one note against a scope such as a file name or trial label.
    pub fn record(&mut self, kind: DiagnosticKind, scope: &str, message: &str) {
        self.entries.push(Diagnostic {
            kind,
            scope: scope.to_string(),
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Renders the console block listing every note.
    pub fn render(&self) -> String {
        let mut lines = vec!["Data quality notes:".to_string()];
        for entry in &self.entries {
            lines.push(format!(
                "  [{}] {}: {}",
                entry.kind.label(),
                entry.scope,
                entry.message
            ));
        }
        lines.join("\n")
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

fn fmt_stat(stats: &PropertyStats, decimals: usize) -> String {
    if stats.n > 1 {
        format!(
            "{:.*} ± {:.*}",
            decimals, stats.mean, decimals, stats.std
        )
    } else {
        format!("{:.*}", decimals, stats.mean)
    }
}

fn csv_num(value: f64) -> String {
    value.to_string()
}

fn csv_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Renders the thermal event summary table.
///
/// Metrics that never crossed their threshold print as `N/A`.
pub fn render_tga_table(batch: &ThermalBatch) -> String {
    let rule = "-".repeat(70);
    let mut lines = Vec::new();
    lines.push("TGA ANALYSIS SUMMARY".to_string());
    lines.push("=".repeat(70));
    lines.push("TGA Data".to_string());
    lines.push(rule.clone());
    lines.push(format!(
        "{:<25} {:<8} {:<9} {:<10} {:<12}",
        "Sample", "T5 [°C]", "T50 [°C]", "Tmax [°C]", "Residue [%]"
    ));
    lines.push(rule.clone());
    for (name, sample) in batch.iter() {
        let display: String = name.chars().take(24).collect();
        let events = &sample.events;
        lines.push(format!(
            "{:<25} {:<8} {:<9} {:<10} {:<12}",
            display,
            fmt_opt(events.t5_c, 0),
            fmt_opt(events.t50_c, 0),
            fmt_opt(events.t_max_c, 0),
            fmt_opt(events.residue_percent, 1),
        ));
    }
    lines.push(rule);
    lines.join("\n")
}

/// Renders the publication-style mechanical property table.
///
/// Each cell holds `mean ± std` once a sample has more than one trial;
/// the footnote only appears when some group actually has repeats.
pub fn render_publication_table(title: &str, records: &[SummaryRecord]) -> String {
    let rule = "-".repeat(90);
    let mut lines = Vec::new();
    lines.push(format!("Table 1. {}", title));
    lines.push(rule.clone());
    lines.push(format!(
        "{:<20} {:<18} {:<15} {:<15} {:<12} {:<4}",
        "Polyol", "Break strength", "Young's", "Toughness", "% Strain", "n"
    ));
    lines.push(format!(
        "{:<20} {:<18} {:<15} {:<15} {:<12} {:<4}",
        "", "(MPa)", "modulus", "(MJ/m³)", "", ""
    ));
    lines.push(format!(
        "{:<20} {:<18} {:<15} {:<15} {:<12} {:<4}",
        "", "", "(MPa)", "", "", ""
    ));
    lines.push(rule.clone());
    for record in records {
        let display: String = record.sample.chars().take(18).collect();
        lines.push(format!(
            "{:<20} {:<18} {:<15} {:<15} {:<12} {:<4}",
            display,
            fmt_stat(&record.uts_mpa, 2),
            fmt_stat(&record.youngs_modulus_mpa, 1),
            fmt_stat(&record.toughness_mj_per_m3, 2),
            fmt_stat(&record.strain_at_break_percent, 0),
            record.n_trials,
        ));
    }
    lines.push(rule);
    if records.iter().any(|record| record.n_trials > 1) {
        lines.push("Values are presented as mean ± standard deviation where n > 1".to_string());
    }
    lines.push("=".repeat(90));
    lines.join("\n")
}

/// Replaces characters that spreadsheet tabs and shells dislike.
///
/// Sheet-style names cap at 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned = name.replace(' ', "_").replace('%', "pct");
    cleaned.chars().take(31).collect()
}

/// Turns a presentation title into a file stem.
pub fn sanitize_file_stem(title: &str) -> String {
    let pattern = Regex::new("[^A-Za-z0-9]+").unwrap();
    let stem = pattern.replace_all(title, "_");
    stem.trim_matches('_').to_string()
}

/// Writes the thermal event summary as one CSV row per sample.
pub fn write_tga_summary_csv<P: AsRef<Path>>(path: P, batch: &ThermalBatch) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["Sample", "T5_C", "T50_C", "Tmax_C", "Residue_600C_percent"])?;
    for (name, sample) in batch.iter() {
        let events = &sample.events;
        writer.write_record([
            name.to_string(),
            csv_opt(events.t5_c),
            csv_opt(events.t50_c),
            csv_opt(events.t_max_c),
            csv_opt(events.residue_percent),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one sample's full thermal curve next to the summary.
///
/// Returns the path written, named after the sanitized sample name.
pub fn write_tga_curve_csv<P: AsRef<Path>>(
    dir: P,
    name: &str,
    sample: &ThermalSample,
) -> Result<PathBuf> {
    let path = dir
        .as_ref()
        .join(format!("tga_{}.csv", sanitize_sheet_name(name)));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "Time_min",
        "Temperature_C",
        "Weight_percent",
        "Weight_mg",
        "Deriv_Weight",
    ])?;
    let curve = &sample.curve;
    for i in 0..curve.len() {
        writer.write_record([
            csv_num(curve.time_min[i]),
            csv_num(curve.temperature_c[i]),
            csv_num(curve.weight_percent[i]),
            csv_num(curve.weight_mg[i]),
            csv_num(curve.deriv_weight[i]),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Writes the publication table with its formatted `mean ± std` cells.
pub fn write_publication_csv<P: AsRef<Path>>(path: P, records: &[SummaryRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "Polyol",
        "Break strength (MPa)",
        "Young's modulus (MPa)",
        "Toughness (MJ/m³)",
        "% Strain",
        "n",
    ])?;
    for record in records {
        writer.write_record([
            record.sample.clone(),
            fmt_stat(&record.uts_mpa, 2),
            fmt_stat(&record.youngs_modulus_mpa, 1),
            fmt_stat(&record.toughness_mj_per_m3, 2),
            fmt_stat(&record.strain_at_break_percent, 0),
            record.n_trials.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes per-sample statistics in wide form, one property triple per
/// column group.
pub fn write_statistical_summary_csv<P: AsRef<Path>>(
    path: P,
    records: &[SummaryRecord],
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "Sample",
        "n_trials",
        "Youngs_Modulus_MPa_mean",
        "Youngs_Modulus_MPa_std",
        "Youngs_Modulus_MPa_cv",
        "UTS_MPa_mean",
        "UTS_MPa_std",
        "UTS_MPa_cv",
        "Strain_at_Break_percent_mean",
        "Strain_at_Break_percent_std",
        "Strain_at_Break_percent_cv",
        "Toughness_MJ_per_m3_mean",
        "Toughness_MJ_per_m3_std",
        "Toughness_MJ_per_m3_cv",
    ])?;
    for record in records {
        let triples = [
            &record.youngs_modulus_mpa,
            &record.uts_mpa,
            &record.strain_at_break_percent,
            &record.toughness_mj_per_m3,
        ];
        let mut row = vec![record.sample.clone(), record.n_trials.to_string()];
        for stats in triples {
            row.push(csv_num(stats.mean));
            row.push(csv_num(stats.std));
            row.push(csv_num(stats.cv_percent));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes every trial's properties, one row per trial.
pub fn write_individual_trials_csv<P: AsRef<Path>>(path: P, set: &SampleSet) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record([
        "sample_group",
        "trial_name",
        "Youngs_Modulus_MPa",
        "R_squared",
        "Fit_Region",
        "UTS_MPa",
        "Strain_at_Break_percent",
        "Max_Load_N",
        "Max_Displacement_mm",
        "Toughness_MJ_per_m3",
    ])?;
    for (name, trials) in set.iter() {
        for trial in trials {
            let props = &trial.properties;
            writer.write_record([
                name.to_string(),
                trial.label.clone(),
                csv_num(props.youngs_modulus_mpa),
                csv_num(props.r_squared),
                props.fit_region.label().to_string(),
                csv_num(props.uts_mpa),
                csv_num(props.strain_at_break_percent),
                csv_num(props.max_load_n),
                csv_num(props.max_displacement_mm),
                csv_num(props.toughness_mj_per_m3),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes the thermal results, events plus diagnostics, as pretty JSON.
pub fn write_tga_json<P: AsRef<Path>>(
    path: P,
    batch: &ThermalBatch,
    diagnostics: &Diagnostics,
) -> Result<()> {
    #[derive(Serialize)]
    struct Entry<'a> {
        sample: &'a str,
        source: &'a Path,
        points: usize,
        events: &'a crate::thermal::ThermalEvents,
    }
    #[derive(Serialize)]
    struct Report<'a> {
        samples: Vec<Entry<'a>>,
        diagnostics: &'a [Diagnostic],
    }

    let report = Report {
        samples: batch
            .iter()
            .map(|(name, sample)| Entry {
                sample: name,
                source: &sample.source,
                points: sample.curve.len(),
                events: &sample.events,
            })
            .collect(),
        diagnostics: diagnostics.entries(),
    };
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
    Ok(())
}

/// Writes the tensile results, per-trial and per-sample, as pretty JSON.
pub fn write_tensile_json<P: AsRef<Path>>(
    path: P,
    set: &SampleSet,
    diagnostics: &Diagnostics,
) -> Result<()> {
    #[derive(Serialize)]
    struct TrialEntry<'a> {
        label: &'a str,
        points: usize,
        properties: &'a crate::tensile::MechanicalProperties,
    }
    #[derive(Serialize)]
    struct GroupEntry<'a> {
        sample: &'a str,
        trials: Vec<TrialEntry<'a>>,
        summary: SummaryRecord,
    }
    #[derive(Serialize)]
    struct Report<'a> {
        samples: Vec<GroupEntry<'a>>,
        diagnostics: &'a [Diagnostic],
    }

    let report = Report {
        samples: set
            .iter()
            .map(|(name, trials)| GroupEntry {
                sample: name,
                trials: trials
                    .iter()
                    .map(|trial| TrialEntry {
                        label: &trial.label,
                        points: trial.curve.len(),
                        properties: &trial.properties,
                    })
                    .collect(),
                summary: crate::stats::summarize_group(
                    name,
                    &trials.iter().map(|t| t.properties).collect::<Vec<_>>(),
                ),
            })
            .collect(),
        diagnostics: diagnostics.entries(),
    };
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::{ThermalCurve, ThermalEvents};
    use std::path::PathBuf;

    fn batch_with_one_sample() -> ThermalBatch {
        let curve = ThermalCurve::new(
            vec![0.0, 1.0, 2.0],
            vec![25.0, 300.0, 600.0],
            vec![10.0, 6.0, 1.23],
        )
        .expect("curve should build");
        let sample = ThermalSample {
            curve,
            events: ThermalEvents {
                t5_c: Some(310.0),
                t50_c: Some(420.0),
                t_max_c: None,
                residue_percent: Some(12.3),
            },
            source: PathBuf::from("bulk_1.csv"),
        };
        let mut batch = ThermalBatch::new();
        batch.insert("Bulk".to_string(), sample);
        batch
    }

    fn stats(mean: f64, std: f64, cv: f64, n: usize) -> PropertyStats {
        PropertyStats {
            mean,
            std,
            cv_percent: cv,
            n,
        }
    }

    #[test]
    fn test_render_tga_table_layout() {
        let table = render_tga_table(&batch_with_one_sample());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "TGA ANALYSIS SUMMARY");
        assert_eq!(lines[1], "=".repeat(70));
        assert_eq!(lines[2], "TGA Data");
        assert_eq!(lines[3], "-".repeat(70));
        assert_eq!(
            lines[4].trim_end(),
            "Sample                    T5 [°C]  T50 [°C]  Tmax [°C]  Residue [%]"
        );
        assert!(lines[6].starts_with("Bulk                      310      420       N/A        12.3"));
        assert_eq!(lines[7], "-".repeat(70));
    }

    #[test]
    fn test_render_publication_table_cells() {
        let records = vec![
            SummaryRecord {
                sample: "MEK-5%".to_string(),
                n_trials: 3,
                youngs_modulus_mpa: stats(2500.0, 100.0, 4.0, 3),
                uts_mpa: stats(21.5, 1.25, 5.8, 3),
                strain_at_break_percent: stats(380.0, 12.0, 3.2, 3),
                toughness_mj_per_m3: stats(55.25, 2.5, 4.5, 3),
            },
            SummaryRecord {
                sample: "Bulk".to_string(),
                n_trials: 1,
                youngs_modulus_mpa: stats(1800.0, 0.0, 0.0, 1),
                uts_mpa: stats(14.0, 0.0, 0.0, 1),
                strain_at_break_percent: stats(410.0, 0.0, 0.0, 1),
                toughness_mj_per_m3: stats(48.0, 0.0, 0.0, 1),
            },
        ];
        let table = render_publication_table("Summary of engineering stress data", &records);
        assert!(table.starts_with("Table 1. Summary of engineering stress data"));
        assert!(table.contains("21.50 ± 1.25"));
        assert!(table.contains("2500.0 ± 100.0"));
        assert!(table.contains("380 ± 12"));
        // Single-trial rows carry the plain mean.
        assert!(table.contains("14.00 "));
        assert!(!table.contains("14.00 ±"));
        assert!(table.contains("Values are presented as mean ± standard deviation where n > 1"));
        assert!(table.ends_with(&"=".repeat(90)));
    }

    #[test]
    fn test_render_publication_table_without_repeats() {
        let records = vec![SummaryRecord {
            sample: "a-very-long-sample-name".to_string(),
            n_trials: 1,
            youngs_modulus_mpa: stats(1800.0, 0.0, 0.0, 1),
            uts_mpa: stats(14.0, 0.0, 0.0, 1),
            strain_at_break_percent: stats(410.0, 0.0, 0.0, 1),
            toughness_mj_per_m3: stats(48.0, 0.0, 0.0, 1),
        }];
        let table = render_publication_table("Summary of engineering stress data", &records);
        // No group has repeats, so the footnote is dropped.
        assert!(!table.contains("mean ± standard deviation"));
        // Sample names clip at 18 characters.
        assert!(table.contains("a-very-long-sample"));
        assert!(!table.contains("a-very-long-sample-"));
        assert!(table.ends_with(&"=".repeat(90)));
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("MEK 5%"), "MEK_5pct");
        let long = "a".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).len(), 31);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(
            sanitize_file_stem("TGA curves for polyurethane films"),
            "TGA_curves_for_polyurethane_films"
        );
        assert_eq!(
            sanitize_file_stem("Stress-strain: batch 7,"),
            "Stress_strain_batch_7"
        );
    }

    #[test]
    fn test_write_tga_summary_csv() {
        let path = std::env::temp_dir().join("mechtherm_test_tga_summary.csv");
        write_tga_summary_csv(&path, &batch_with_one_sample()).expect("Failed to write CSV");
        let content = std::fs::read_to_string(&path).expect("Failed to read back CSV");
        let _ = std::fs::remove_file(&path);
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("Sample,T5_C,T50_C,Tmax_C,Residue_600C_percent")
        );
        // The undefined Tmax leaves its cell empty.
        assert_eq!(lines.next(), Some("Bulk,310,420,,12.3"));
    }

    #[test]
    fn test_write_tga_json_round_trips() {
        let path = std::env::temp_dir().join("mechtherm_test_tga_results.json");
        let mut diagnostics = Diagnostics::new();
        diagnostics.record(DiagnosticKind::Undefined, "Bulk", "Tmax not defined");
        write_tga_json(&path, &batch_with_one_sample(), &diagnostics)
            .expect("Failed to write JSON");
        let content = std::fs::read_to_string(&path).expect("Failed to read back JSON");
        let _ = std::fs::remove_file(&path);
        let value: serde_json::Value =
            serde_json::from_str(&content).expect("Failed to parse JSON");
        assert_eq!(value["samples"][0]["sample"], "Bulk");
        assert_eq!(value["samples"][0]["events"]["t5_c"], 310.0);
        assert!(value["samples"][0]["events"]["t_max_c"].is_null());
        assert_eq!(value["diagnostics"][0]["kind"], "Undefined");
    }

    #[test]
    fn test_diagnostics_render() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());
        diagnostics.record(
            DiagnosticKind::Skipped,
            "run3.txt",
            "only 4 rows parsed (10 required)",
        );
        let block = diagnostics.render();
        assert!(block.starts_with("Data quality notes:"));
        assert!(block.contains("[skipped] run3.txt: only 4 rows parsed (10 required)"));
    }
}
