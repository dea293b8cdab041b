//! Interface to the trained encoder/decoder network.
//!
//! The numbering core never looks inside the network: it hands over padded
//! token batches and masks and gets back next-token logits.
use crate::shared::vocabulary::PAD;
use anyhow::{ensure, Result};
use ndarray::{Array2, ArrayView2};

/// Masks applied to the target (decoder input) at every step.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetMask {
    // [batch, target_len], true where the token is not padding
    pub padding: Array2<bool>,
    // [target_len, target_len], true where position i may attend to j (j <= i)
    pub causal: Array2<bool>,
}

impl TargetMask {
    pub fn new(target: ArrayView2<u32>) -> TargetMask {
        let len = target.ncols();
        TargetMask {
            padding: target.mapv(|t| t != PAD),
            causal: Array2::from_shape_fn((len, len), |(i, j)| j <= i),
        }
    }
}

/// Source padding mask, true where the token is not padding.
pub fn source_mask(source: ArrayView2<u32>) -> Array2<bool> {
    source.mapv(|t| t != PAD)
}

pub trait SequenceModel {
    /// Encoder output, kept alive for all the decode steps of one batch
    type Memory;

    fn encode(&self, source: ArrayView2<u32>, source_mask: ArrayView2<bool>)
        -> Result<Self::Memory>;

    /// Logits of the token following the last target position, shape `[batch, vocab]`.
    fn decode_step(
        &self,
        target: ArrayView2<u32>,
        memory: &Self::Memory,
        target_mask: &TargetMask,
        source_mask: ArrayView2<bool>,
    ) -> Result<Array2<f32>>;
}

/// Fail when a model returns logits that do not match the batch and vocabulary.
pub fn check_logits(logits: &Array2<f32>, batch: usize, vocab: usize) -> Result<()> {
    ensure!(
        logits.nrows() == batch && logits.ncols() == vocab,
        "Model returned logits of shape {:?}, expected [{}, {}]",
        logits.shape(),
        batch,
        vocab
    );
    Ok(())
}
