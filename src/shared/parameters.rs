//! The structs used for specifying the thresholds of the numbering pipeline
use anyhow::{Context, Result};
#[cfg(all(feature = "py_binds", feature = "pyo3"))]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[cfg_attr(all(feature = "py_binds", feature = "pyo3"), pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingParameters {
    // Number of sequences decoded together
    pub batch_size: usize,
    // Sequences longer than this go through the window selector first
    pub max_sequence_length: usize,
    // Sequences with a rounded score below the cutoff are rejected
    pub score_cutoff: f64,
    // Minimum number of numeric labels needed for a meaningful score
    pub min_scored_positions: usize,
    // Leading residues are backfilled when the first number is in this range
    pub backfill_min: u16,
    pub backfill_max: u16,
    // Maximal distance to the chain terminal for the tail extension
    pub tail_extension_window: u16,
    // Number of sequences processed together by `number_in_chunks`
    pub chunk_size: usize,
}

#[cfg_attr(all(feature = "py_binds", feature = "pyo3"), pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParameters {
    pub width: usize,
    pub stride: usize,
    pub multi_domain_stride: usize,
    // Residues kept before the best window (single/multi domain)
    pub lead_in: usize,
    pub multi_domain_lead_in: usize,
    // Residues kept from the window start (single/multi domain)
    pub span: usize,
    pub multi_domain_span: usize,
    pub primary_threshold: f64,
    pub fallback_threshold: f64,
    pub multi_domain: bool,
    pub peak_threshold: f64,
    // Minimal distance (in residues) between two accepted domains
    pub min_separation: usize,
    // Motif windows may start this many residues before the first cysteine
    pub motif_lead_in: usize,
    pub motif_span: usize,
}

impl Default for NumberingParameters {
    fn default() -> NumberingParameters {
        NumberingParameters {
            batch_size: 8,
            max_sequence_length: 200,
            score_cutoff: 15.0,
            min_scored_positions: 50,
            backfill_min: 2,
            backfill_max: 8,
            tail_extension_window: 9,
            chunk_size: 1024 * 100,
        }
    }
}

impl Default for WindowParameters {
    fn default() -> WindowParameters {
        WindowParameters {
            width: 90,
            stride: 3,
            multi_domain_stride: 2,
            lead_in: 40,
            multi_domain_lead_in: 20,
            span: 160,
            multi_domain_span: 140,
            primary_threshold: 25.0,
            fallback_threshold: 15.0,
            multi_domain: false,
            peak_threshold: 25.0,
            min_separation: 100,
            motif_lead_in: 40,
            motif_span: 160,
        }
    }
}

impl NumberingParameters {
    pub fn new(batch_size: usize, score_cutoff: f64) -> NumberingParameters {
        NumberingParameters {
            batch_size,
            score_cutoff,
            ..Default::default()
        }
    }

    pub fn load_json(path: &Path) -> Result<NumberingParameters> {
        load_json(path)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

impl WindowParameters {
    pub fn new(multi_domain: bool) -> WindowParameters {
        WindowParameters {
            multi_domain,
            ..Default::default()
        }
    }

    /// Stride of the sliding window for the active policy
    pub fn active_stride(&self) -> usize {
        if self.multi_domain {
            self.multi_domain_stride
        } else {
            self.stride
        }
    }

    pub fn load_json(path: &Path) -> Result<WindowParameters> {
        load_json(path)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot parse parameters in {}", path.display()))
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Cannot write parameters to {}", path.display()))
}

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pymethods]
impl NumberingParameters {
    #[new]
    pub fn py_new() -> Self {
        NumberingParameters::default()
    }

    fn __repr__(&self) -> PyResult<String> {
        Ok(format!(
            "NumberingParameters(batch_size={}, score_cutoff={}, min_scored_positions={}, chunk_size={})",
            self.batch_size, self.score_cutoff, self.min_scored_positions, self.chunk_size
        ))
    }
}

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pymethods]
impl WindowParameters {
    #[new]
    pub fn py_new() -> Self {
        WindowParameters::default()
    }

    fn __repr__(&self) -> PyResult<String> {
        Ok(format!(
            "WindowParameters(width={}, stride={}, multi_domain={}, primary_threshold={})",
            self.width, self.stride, self.multi_domain, self.primary_threshold
        ))
    }
}
