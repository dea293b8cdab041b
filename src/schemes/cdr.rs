//! Relabelling of CDR residues, as a function of the loop length only.
use crate::shared::numbering::{Insertion, PositionLabel};

/// Kabat-style placement: start from the `base` positions, drop positions in
/// `deletions` order while the loop is shorter than the base, or add lettered
/// insertions after `anchor` while it is longer. Returns `None` when more than
/// 26 insertions would be needed.
pub fn ascending(
    length: usize,
    base: (u16, u16),
    anchor: u16,
    deletions: &[u16],
) -> Option<Vec<PositionLabel>> {
    let (first, last) = base;
    let base_len = (last - first + 1) as usize;
    let mut labels: Vec<PositionLabel> = if length <= base_len {
        let dropped = &deletions[..(base_len - length).min(deletions.len())];
        (first..=last)
            .filter(|n| !dropped.contains(n))
            .map(PositionLabel::plain)
            .collect()
    } else {
        let extra = length - base_len;
        if extra > 26 {
            return None;
        }
        (first..=last)
            .map(PositionLabel::plain)
            .chain((0..extra).filter_map(|i| {
                Insertion::letter(i).map(|ins| PositionLabel::new(anchor, ins))
            }))
            .collect()
    };
    labels.sort();
    labels.truncate(length);
    Some(labels)
}

/// Aho-style placement: the first half of the loop fills slots from `first`
/// upward, the second half ends at `last`, no insertion letters. The extra
/// residue of an odd loop goes to the front. `None` if the loop does not fit.
pub fn symmetric(length: usize, first: u16, last: u16) -> Option<Vec<PositionLabel>> {
    let slots = (last - first + 1) as usize;
    if length > slots {
        return None;
    }
    let front = (length + 1) / 2;
    let back = length / 2;
    Some(
        (first..first + front as u16)
            .chain(last + 1 - back as u16..=last)
            .map(PositionLabel::plain)
            .collect(),
    )
}
