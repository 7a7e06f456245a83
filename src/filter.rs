use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::Table;

const MEAN_WINDOW: usize = 3;
const MEAN_PASSES: usize = 3;
const MEDIAN_WINDOW: usize = 10;

/// Indices covered by a centred window of `window` samples around `i`.
/// Even windows reach one further back than forward.
fn centered(i: usize, len: usize, window: usize) -> Range<usize> {
    let start = i.saturating_sub(window / 2);
    let end = (i + (window - 1) / 2 + 1).min(len);
    start..end
}

/// Centred rolling reduction over the non-NaN samples of each window.
/// Windows with fewer than `min_samples` samples give NaN.
fn rolling(
    values: &[f64],
    window: usize,
    min_samples: usize,
    reduce: impl Fn(&mut [f64]) -> f64,
) -> Vec<f64> {
    let mut buf = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            buf.clear();
            buf.extend(
                values[centered(i, values.len(), window)]
                    .iter()
                    .filter(|v| !v.is_nan()),
            );
            if buf.is_empty() || buf.len() < min_samples {
                f64::NAN
            } else {
                reduce(&mut buf)
            }
        })
        .collect()
}

pub fn rolling_mean(values: &[f64], window: usize, min_samples: usize) -> Vec<f64> {
    rolling(values, window, min_samples, |w| {
        w.iter().sum::<f64>() / w.len() as f64
    })
}

pub fn rolling_median(values: &[f64], window: usize, min_samples: usize) -> Vec<f64> {
    rolling(values, window, min_samples, |w| {
        w.sort_by(f64::total_cmp);
        let mid = w.len() / 2;
        if w.len() % 2 == 0 {
            (w[mid - 1] + w[mid]) / 2.0
        } else {
            w[mid]
        }
    })
}

/// Three passes of a 3 sample mean, then a 10 sample median.
pub fn smooth(values: &[f64]) -> Vec<f64> {
    let mut smoothed = values.to_vec();
    for _ in 0..MEAN_PASSES {
        smoothed = rolling_mean(&smoothed, MEAN_WINDOW, MEAN_WINDOW / 2);
    }
    rolling_median(&smoothed, MEDIAN_WINDOW, MEDIAN_WINDOW / 2)
}

/// Smooths every height column of a raw table. Frame and Time pass through.
pub fn filter_table(raw: &Table) -> Result<Table> {
    let mut rows = raw.rows.clone();
    for (c, column) in raw.columns.iter().enumerate() {
        if column == "Frame" || column == "Time" {
            continue;
        }
        let smoothed = smooth(&raw.numeric_column(c)?);
        for (row, value) in rows.iter_mut().zip(smoothed) {
            row[c] = if value.is_nan() {
                String::new()
            } else {
                format!("{value:?}")
            };
        }
        log::debug!("Filtered {column}");
    }
    Ok(Table {
        columns: raw.columns.clone(),
        rows,
    })
}

/// Writes a `_filtered.csv` next to every `_raw.csv` in `dir`. Returns the written paths.
pub fn filter_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut raw_files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with("_raw.csv"))
        })
        .collect();
    raw_files.sort();

    let mut written = vec![];
    for raw_path in raw_files {
        log::info!("Filtering {}", raw_path.display());
        let filtered = filter_table(&Table::read(&raw_path)?)?;
        let name = raw_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.replace("_raw.csv", "_filtered.csv"))
            .unwrap_or_default();
        let out_path = raw_path.with_file_name(name);
        filtered.write(&out_path)?;
        log::info!("Wrote {}", out_path.display());
        written.push(out_path);
    }
    Ok(written)
}
