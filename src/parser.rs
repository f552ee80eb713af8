//! Readers for instrument export files.
//!
//! TGA exports are comma-separated with named columns. Tensile frames
//! arrive in several vendor flavors, so the reader detects the header
//! block, the field delimiter, and the decimal mark per file.

use crate::thermal::ThermalCurve;
use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Keywords marking a tensile header line rather than a reading.
const HEADER_KEYWORDS: [&str; 5] = ["crosshead", "load", "time", "extension", "force"];

/// Reads a TGA export into a validated thermal curve.
///
/// The file must carry `Time`, `Unsubtracted Weight`, and
/// `Sample Temperature` columns. Rows with missing or non-numeric cells
/// are skipped.
///
/// # Errors
///
/// Returns an error when the file cannot be read, a required column is
/// absent, or no usable rows remain.
pub fn read_tga_file<P: AsRef<Path>>(path: P) -> Result<ThermalCurve> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|header| header == name)
            .with_context(|| format!("missing column '{}' in {}", name, path.display()))
    };
    let time_idx = column("Time")?;
    let weight_idx = column("Unsubtracted Weight")?;
    let temp_idx = column("Sample Temperature")?;

    let mut time_min = Vec::new();
    let mut temperature_c = Vec::new();
    let mut weight_mg = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        let cells = [
            record.get(time_idx),
            record.get(weight_idx),
            record.get(temp_idx),
        ];
        let parsed: Vec<f64> = cells
            .iter()
            .filter_map(|cell| cell.and_then(|s| s.parse::<f64>().ok()))
            .filter(|value| value.is_finite())
            .collect();
        if parsed.len() != cells.len() {
            // Row numbers are 1-based and include the header line.
            log::debug!(
                "skipping row {} of {}: incomplete or non-numeric",
                row + 2,
                path.display()
            );
            continue;
        }
        time_min.push(parsed[0]);
        weight_mg.push(parsed[1]);
        temperature_c.push(parsed[2]);
    }

    ThermalCurve::new(time_min, temperature_c, weight_mg)
        .map_err(|err| anyhow::anyhow!("{}: {}", path.display(), err))
}

/// Reads a tensile frame file into `[crosshead_mm, load_n, time_s]` rows.
///
/// Header lines are recognized by keyword; the first line that starts
/// with a digit or a minus sign opens the data block. Lines that do not
/// yield three numeric fields are skipped.
pub fn read_tensile_file<P: AsRef<Path>>(path: P) -> Result<Vec<[f64; 3]>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let lines: Vec<String> = BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut data_start = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_header_line(trimmed) {
            continue;
        }
        if trimmed.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            data_start = i;
            break;
        }
    }

    let mut rows = Vec::new();
    for line in &lines[data_start..] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(reading) = split_reading(trimmed) {
            rows.push(reading);
        }
    }
    Ok(rows)
}

/// Splits one data line into its first three numeric fields.
///
/// Tab- and space-separated exports may use a decimal comma, which is
/// normalized before parsing. A whitespace-free line is comma-delimited
/// and its fields are taken verbatim.
fn split_reading(line: &str) -> Option<[f64; 3]> {
    let parts: Vec<String> = if line.contains('\t') {
        line.split('\t').map(|part| part.replace(',', ".")).collect()
    } else if line.contains(',') && !line.contains(char::is_whitespace) {
        line.split(',').map(String::from).collect()
    } else {
        line.split_whitespace()
            .map(|part| part.replace(',', "."))
            .collect()
    };
    if parts.len() < 3 {
        return None;
    }
    let crosshead = parts[0].trim().parse::<f64>().ok()?;
    let load = parts[1].trim().parse::<f64>().ok()?;
    let time = parts[2].trim().parse::<f64>().ok()?;
    Some([crosshead, load, time])
}

fn is_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Derives a display name for a sample from its file stem.
///
/// Stems are split on underscores and searched for solvent, blend, and
/// form markers. A stem without any marker names the sample verbatim.
pub fn extract_sample_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sample");
    let mut label_parts: Vec<&str> = Vec::new();
    for part in stem.split('_') {
        let lower = part.to_lowercase();
        if lower.contains("mek") {
            label_parts.push("MEK");
        } else if part.contains('%') {
            label_parts.push(part);
        } else if lower.contains("fabric") {
            label_parts.push("Fabric");
        } else if lower.contains("bulk") {
            label_parts.push("Bulk");
        }
    }
    if label_parts.is_empty() {
        stem.to_string()
    } else {
        label_parts.join("-")
    }
}

/// Collects the input files for a run.
///
/// A file path is passed through untouched. A folder is scanned,
/// non-recursively, for the given extensions and the matches are
/// returned in name order.
pub fn discover_files<P: AsRef<Path>>(input: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input {} is neither a file nor a folder", input.display());
    }
    let mut found = Vec::new();
    let entries =
        fs::read_dir(input).with_context(|| format!("failed to scan {}", input.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let keep = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
            .unwrap_or(false);
        if keep {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
