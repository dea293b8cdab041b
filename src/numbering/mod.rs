//! Numbering decoder: greedy decoding, confidence scoring and reconstruction
pub mod decoder;
pub mod insertions;
pub mod reconstruction;

pub use decoder::{greedy_decode, score_first_step, DecodedBatch};
pub use insertions::build_inward_list;
pub use reconstruction::{acceptance, confidence, reconstruct, Reconstruction};

use crate::shared::errors::Rejection;
use crate::shared::numbering::{Alignment, NumberedSequence};
use crate::shared::parameters::NumberingParameters;
use crate::shared::vocabulary::NumberVocabulary;
use crate::schemes::Scheme;
use log::debug;
use ndarray::ArrayView1;

/// Score, accept and reconstruct one decoded row. Never fails: rejected rows
/// come back with an empty numbering, chain `F` and the reason in `error`.
pub fn number_decoded(
    name: &str,
    tokens: ArrayView1<u32>,
    scores: ArrayView1<f32>,
    residues: &[char],
    numbers: &NumberVocabulary,
    params: &NumberingParameters,
) -> NumberedSequence {
    let confidence = confidence(tokens, scores, numbers, params);
    let outcome = acceptance(&confidence, params).and_then(|_| {
        reconstruct(tokens, residues, numbers, params).map_err(Rejection::from)
    });
    match outcome {
        Ok(rec) => NumberedSequence {
            name: name.to_string(),
            numbering: rec.numbering,
            alignment: Alignment {
                chain_type: rec.chain_type,
                score: confidence.score,
                query_start: Some(rec.query_start),
                query_end: Some(rec.query_end),
                error: None,
                scheme: Scheme::Imgt,
            },
        },
        Err(rejection) => {
            debug!("Sequence {} rejected: {}", name, rejection);
            NumberedSequence::failed(name, confidence.score, rejection)
        }
    }
}
