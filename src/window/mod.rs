//! Locate the variable domain(s) inside sequences longer than a single domain.
pub mod motif;

pub use motif::{motif_at, motif_windows};

use crate::numbering::decoder::score_first_step;
use crate::shared::model::SequenceModel;
use crate::shared::parameters::WindowParameters;
use crate::shared::vocabulary::Vocabulary;
use anyhow::Result;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

/// Half-open residue range `[start, end)` of the input sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn slice<'a>(&self, sequence: &'a str) -> &'a str {
        &sequence[self.start..self.end]
    }
}

/// Start positions of the sliding windows, `(len - width) / stride` of them.
pub fn sliding_starts(len: usize, width: usize, stride: usize) -> Vec<usize> {
    let count = len.saturating_sub(width) / stride.max(1);
    (0..count).map(|i| i * stride).collect()
}

/// Expand the window at `index` to the region kept for numbering.
pub fn expand(index: usize, stride: usize, lead_in: usize, span: usize, len: usize) -> Window {
    let position = index * stride;
    Window {
        start: position.saturating_sub(lead_in),
        end: len.min(position + span),
    }
}

/// First window at or above the primary threshold, else the first at or above
/// the fallback threshold, else the best (first on ties).
pub fn pick_single(scores: &[f64], params: &WindowParameters) -> Option<usize> {
    scores
        .iter()
        .position(|&s| s >= params.primary_threshold)
        .or_else(|| scores.iter().position(|&s| s >= params.fallback_threshold))
        .or_else(|| (!scores.is_empty()).then(|| pick_single_best(scores)))
}

/// Local maxima at or above the peak threshold, accepted from the highest
/// score down when at least `min_separation` residues away from every peak
/// already accepted. Returned in sequence order.
pub fn pick_peaks(scores: &[f64], stride: usize, params: &WindowParameters) -> Vec<usize> {
    let n = scores.len();
    let maxima = (0..n).filter(|&i| {
        let s = scores[i];
        s >= params.peak_threshold
            && (i == 0 || s > scores[i - 1])
            && (i + 1 == n || s >= scores[i + 1])
    });
    let mut accepted: Vec<usize> = Vec::new();
    for i in maxima.sorted_by(|&a, &b| scores[b].total_cmp(&scores[a])) {
        if accepted
            .iter()
            .all(|&j| (i * stride).abs_diff(j * stride) >= params.min_separation)
        {
            accepted.push(i);
        }
    }
    accepted.sort_unstable();
    accepted
}

pub struct WindowSelector<'a, M: SequenceModel> {
    pub model: &'a M,
    pub vocabulary: &'a Vocabulary,
    pub params: &'a WindowParameters,
    pub batch_size: usize,
}

impl<'a, M: SequenceModel> WindowSelector<'a, M> {
    pub fn new(
        model: &'a M,
        vocabulary: &'a Vocabulary,
        params: &'a WindowParameters,
        batch_size: usize,
    ) -> Self {
        WindowSelector {
            model,
            vocabulary,
            params,
            batch_size,
        }
    }

    fn score(&self, sequence: &str, windows: &[Window]) -> Result<Vec<f64>> {
        let sources: Vec<Vec<u32>> = windows
            .iter()
            .map(|w| self.vocabulary.residues.encode("window", w.slice(sequence)).0)
            .collect();
        score_first_step(
            self.model,
            &sources,
            self.batch_size,
            self.vocabulary.numbers.len(),
        )
    }

    /// Windows to number for `sequence` (expected upper case ASCII).
    /// Returns a single window unless multi-domain selection finds several.
    pub fn select(&self, sequence: &str) -> Result<Vec<Window>> {
        let len = sequence.len();
        if !self.params.multi_domain {
            let candidates = motif_windows(sequence.as_bytes(), self.params);
            match candidates.len() {
                0 => {}
                1 => return Ok(candidates),
                _ => {
                    let scores = self.score(sequence, &candidates)?;
                    let best = pick_single_best(&scores);
                    debug!(
                        "{} motif windows, keeping {:?} (score {})",
                        candidates.len(),
                        candidates[best],
                        scores[best]
                    );
                    return Ok(vec![candidates[best]]);
                }
            }
        }

        let stride = self.params.active_stride();
        let slides: Vec<Window> = sliding_starts(len, self.params.width, stride)
            .into_iter()
            .map(|start| Window {
                start,
                end: start + self.params.width,
            })
            .collect();
        if slides.is_empty() {
            return Ok(vec![Window { start: 0, end: len }]);
        }
        debug!("No usable motif, scoring {} sliding windows", slides.len());
        let scores = self.score(sequence, &slides)?;

        if self.params.multi_domain {
            let peaks = pick_peaks(&scores, stride, self.params);
            if !peaks.is_empty() {
                return Ok(peaks
                    .into_iter()
                    .map(|i| {
                        expand(
                            i,
                            stride,
                            self.params.multi_domain_lead_in,
                            self.params.multi_domain_span,
                            len,
                        )
                    })
                    .collect());
            }
        }

        let best = pick_single(&scores, self.params).unwrap_or(0);
        Ok(vec![expand(
            best,
            stride,
            self.params.lead_in,
            self.params.span,
            len,
        )])
    }
}

// highest score, first on ties
fn pick_single_best(scores: &[f64]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bs), (i, &s)| {
            if s > bs {
                (i, s)
            } else {
                (bi, bs)
            }
        })
        .0
}
