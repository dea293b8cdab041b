#![warn(clippy::large_types_passed_by_value)]

pub mod numbering;
pub mod pipeline;
pub mod schemes;
pub mod shared;
pub mod window;

pub use crate::numbering::{build_inward_list, greedy_decode, score_first_step};
pub use crate::pipeline::{NamedSequence, Numberer};
pub use crate::schemes::{convert, convert_all, Scheme};
pub use crate::shared::{
    Alignment, ChainType, ConversionError, ImgtRegions, Insertion, NumberedResidue,
    NumberedSequence, NumberingParameters, PositionLabel, ReceptorKind, ReconstructionError,
    Rejection, SequenceModel, TargetMask, Vocabulary, WindowParameters,
};
pub use crate::window::{Window, WindowSelector};

/// Group a canonical numbering by IMGT region (fw1, cdr1, ..., fw4).
pub fn imgt_regions(numbering: &[NumberedResidue]) -> ImgtRegions {
    ImgtRegions::from_numbering(numbering)
}

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
use anyhow::{anyhow, Result};

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
use pyo3::prelude::*;

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
use rayon::ThreadPoolBuilder;

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
type PyNumbering = Vec<((u16, String), char)>;

/// Set the number of threads (if not run: all of them)
#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pyfunction]
fn set_number_threads(num_threads: usize) -> Result<()> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| anyhow!("Cannot set the number of threads: {}", e))
}

/// Insertion labels for a run of `length` insertions between `start` and `end`
#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pyfunction]
fn inward_insertions(length: usize, start: u16, end: u16) -> Result<Vec<(u16, String)>> {
    Ok(build_inward_list(length, start, end)?
        .into_iter()
        .map(|l| (l.number, l.insertion.code().to_string()))
        .collect())
}

/// Candidate domain windows `(start, end)` around the Cys-Trp-Cys motif
#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pyfunction]
fn motif_windows(sequence: &str) -> Vec<(usize, usize)> {
    let params = WindowParameters::default();
    crate::window::motif_windows(sequence.to_ascii_uppercase().as_bytes(), &params)
        .into_iter()
        .map(|w| (w.start, w.end))
        .collect()
}

/// Convert an IMGT numbering `[((number, insertion), residue), ...]` to another scheme
#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pyfunction]
fn convert_numbering(numbering: PyNumbering, chain_type: char, scheme: &str) -> Result<PyNumbering> {
    let scheme: Scheme = scheme.parse()?;
    let numbering = numbering
        .into_iter()
        .map(|((number, code), residue)| {
            Ok(NumberedResidue::new(
                PositionLabel::new(number, Insertion::from_code(&code)?),
                residue,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    let sequence = NumberedSequence {
        name: String::new(),
        numbering,
        alignment: Alignment {
            chain_type: ChainType::from_code(chain_type)?,
            score: 0.,
            query_start: None,
            query_end: None,
            error: None,
            scheme: Scheme::Imgt,
        },
    };
    Ok(convert(&sequence, scheme)?
        .numbering
        .into_iter()
        .map(|r| ((r.label.number, r.label.insertion.code().to_string()), r.residue))
        .collect())
}

#[cfg(all(feature = "py_binds", feature = "pyo3"))]
#[pymodule]
#[pyo3(name = "_receptor_numbering")]
fn receptor_numbering_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<crate::shared::parameters::NumberingParameters>()?;
    m.add_class::<crate::shared::parameters::WindowParameters>()?;
    m.add_function(wrap_pyfunction!(set_number_threads, m)?)?;
    m.add_function(wrap_pyfunction!(inward_insertions, m)?)?;
    m.add_function(wrap_pyfunction!(motif_windows, m)?)?;
    m.add_function(wrap_pyfunction!(convert_numbering, m)?)?;
    Ok(())
}
