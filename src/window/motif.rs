//! Conserved cysteine / tryptophan / cysteine motif of variable domains.
use crate::shared::parameters::WindowParameters;
use crate::window::Window;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

// Cys, 5-25 residues, Trp, 50-80 residues, Cys
static MOTIF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^C.{5,25}W.{50,80}C").expect("Invalid motif regex")
});

/// Whether the motif starts at `position`.
pub fn motif_at(sequence: &[u8], position: usize) -> bool {
    sequence.get(position) == Some(&b'C') && MOTIF.is_match(&sequence[position..])
}

/// Non-overlapping candidate windows around the motif, left to right.
///
/// For the earliest motif start `m` at or after the scan position `p` the
/// window starts at `max(p, m - lead_in)`, is anchored on the last motif start
/// at most `lead_in` residues after its own start, and runs `span` residues
/// past the anchor. Scanning resumes at the window end.
pub fn motif_windows(sequence: &[u8], params: &WindowParameters) -> Vec<Window> {
    let starts: Vec<usize> = (0..sequence.len())
        .filter(|&m| motif_at(sequence, m))
        .collect();

    let mut windows = Vec::new();
    let mut position = 0;
    while let Some(&first) = starts.iter().find(|&&m| m >= position) {
        let start = position.max(first.saturating_sub(params.motif_lead_in));
        let anchor = starts
            .iter()
            .copied()
            .filter(|&m| m >= start && m <= start + params.motif_lead_in)
            .max()
            .unwrap_or(first);
        let end = sequence.len().min(anchor + params.motif_span);
        windows.push(Window { start, end });
        position = end;
    }
    windows
}
