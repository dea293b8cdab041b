//! Batched greedy decoding of the number stream.
use crate::shared::model::{check_logits, source_mask, SequenceModel, TargetMask};
use crate::shared::utils::{argmax, pad_batch, round3};
use crate::shared::vocabulary::{END, PAD};
use anyhow::{anyhow, ensure, Result};
use log::debug;
use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};

/// Output of `greedy_decode` for one padded batch.
/// Column 0 holds the start token, column 1 the chain marker, column `p >= 2`
/// the label of residue `p - 2`. `scores[[b, t]]` is the logit with which
/// `tokens[[b, t]]` was chosen (0 for the start token and padding).
#[derive(Clone, Debug)]
pub struct DecodedBatch {
    pub tokens: Array2<u32>,
    pub scores: Array2<f32>,
}

impl DecodedBatch {
    pub fn nrows(&self) -> usize {
        self.tokens.nrows()
    }

    pub fn row(&self, index: usize) -> (ArrayView1<'_, u32>, ArrayView1<'_, f32>) {
        (self.tokens.row(index), self.scores.row(index))
    }
}

/// Greedy autoregressive decode of a padded `[batch, len]` source.
///
/// Every step re-feeds the whole prefix under a causal mask and keeps the
/// arg-max token. Decoding stops after `len + 1` tokens, or once every row
/// has produced `<EOS>`; rows that are done are padded.
pub fn greedy_decode<M: SequenceModel>(
    model: &M,
    source: ArrayView2<u32>,
    vocab_size: usize,
) -> Result<DecodedBatch> {
    let (batch, source_len) = source.dim();
    ensure!(batch > 0 && source_len > 0, "Cannot decode an empty batch");
    let target_len = source_len + 1;

    let src_mask = source_mask(source);
    let memory = model.encode(source, src_mask.view())?;

    let mut tokens = Array2::from_elem((batch, target_len), PAD);
    let mut scores = Array2::<f32>::zeros((batch, target_len));
    tokens.column_mut(0).assign(&source.column(0));
    let mut finished = vec![false; batch];

    for t in 1..target_len {
        let target = tokens.slice(s![.., ..t]);
        let target_mask = TargetMask::new(target);
        let logits = model.decode_step(target, &memory, &target_mask, src_mask.view())?;
        check_logits(&logits, batch, vocab_size)?;

        for (b, row) in logits.axis_iter(Axis(0)).enumerate() {
            if finished[b] {
                continue;
            }
            let (token, score) =
                argmax(row).ok_or(anyhow!("Model returned no usable logit for row {}", b))?;
            tokens[[b, t]] = token as u32;
            scores[[b, t]] = score;
            if token as u32 == END {
                finished[b] = true;
            }
        }
        if finished.iter().all(|&f| f) {
            debug!("All {} rows finished after {} steps", batch, t);
            break;
        }
    }
    Ok(DecodedBatch { tokens, scores })
}

/// Single decode step over each source: the rounded top-1 logit of the first
/// output position, used to rank candidate windows.
pub fn score_first_step<M: SequenceModel>(
    model: &M,
    sources: &[Vec<u32>],
    batch_size: usize,
    vocab_size: usize,
) -> Result<Vec<f64>> {
    let mut result = Vec::with_capacity(sources.len());
    for chunk in sources.chunks(batch_size.max(1)) {
        let rows: Vec<&[u32]> = chunk.iter().map(|s| s.as_slice()).collect();
        let source = pad_batch(&rows);
        let src_mask = source_mask(source.view());
        let memory = model.encode(source.view(), src_mask.view())?;

        let target = source.slice(s![.., ..1]);
        let target_mask = TargetMask::new(target);
        let logits = model.decode_step(target, &memory, &target_mask, src_mask.view())?;
        check_logits(&logits, chunk.len(), vocab_size)?;

        for row in logits.axis_iter(Axis(0)) {
            let (_, best) = argmax(row).ok_or(anyhow!("Model returned no usable logit"))?;
            result.push(round3(best as f64));
        }
    }
    Ok(result)
}
