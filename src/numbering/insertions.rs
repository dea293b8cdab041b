//! Conversion of runs of insertion tokens into lettered IMGT positions.
//!
//! Outside the CDRs insertions grow forward from the preceding number
//! (`44A, 44B, 44C`). At the three CDR anchors they grow outward from the
//! centre of the loop (`111A, 111B, 112B, 112A`).
use crate::shared::errors::ReconstructionError;
use crate::shared::numbering::{Insertion, PositionLabel, CANONICAL_LENGTH};

/// IMGT positions after which insertions are placed symmetrically.
pub const CDR_ANCHORS: [u16; 3] = [32, 60, 111];

/// Whether `number` lies in one of the IMGT CDRs (27-38, 56-65, 105-117).
pub fn in_imgt_cdr(number: u16) -> bool {
    matches!(number, 27..=38 | 56..=65 | 105..=117)
}

/// Labels for a run of `length` insertion tokens between the numbers `start`
/// and `end`.
pub fn build_inward_list(
    length: usize,
    start: u16,
    end: u16,
) -> Result<Vec<PositionLabel>, ReconstructionError> {
    if CDR_ANCHORS.contains(&start) {
        let midpoint = length / 2;
        let mut labels = Vec::with_capacity(length);
        for i in 0..midpoint {
            labels.push(PositionLabel::new(start, Insertion::cycle(i)));
        }
        for i in midpoint..length {
            // odd runs give the extra residue to `end`
            let mirrored = if length % 2 == 1 {
                2 * midpoint - i
            } else {
                2 * midpoint - (i + 1)
            };
            labels.push(PositionLabel::new(end, Insertion::cycle(mirrored)));
        }
        Ok(labels)
    } else if in_imgt_cdr(start) {
        Err(ReconstructionError::ForbiddenInsertion(start))
    } else if (1..=CANONICAL_LENGTH).contains(&start) {
        Ok((0..length)
            .map(|i| PositionLabel::new(start, Insertion::cycle(i)))
            .collect())
    } else {
        Err(ReconstructionError::InvalidInsertionStart(start))
    }
}
