use crate::shared::vocabulary::PAD;
use ndarray::{Array2, ArrayView1};

/// Round to three decimals, the precision scores are reported with.
pub fn round3(x: f64) -> f64 {
    (x * 1000.).round() / 1000.
}

/// Index and value of the largest entry, first index on ties.
/// NaN entries are never selected.
pub fn argmax(row: ArrayView1<f32>) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best
}

/// Stack token rows into a `[batch, max_len]` array, right padded with `<PAD>`.
pub fn pad_batch(rows: &[&[u32]]) -> Array2<u32> {
    let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut batch = Array2::from_elem((rows.len(), width), PAD);
    for (i, row) in rows.iter().enumerate() {
        for (j, &t) in row.iter().enumerate() {
            batch[[i, j]] = t;
        }
    }
    batch
}

/// Split `0..len` into consecutive ranges of at most `size` elements.
pub fn chunk_ranges(len: usize, size: usize) -> Vec<std::ops::Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}
