//! From a decoded label stream to a gap-free canonical numbering.
//!
//! The raw labels are read once (`scan`), the repairs they need (backfilled
//! leading residues, gaps, a literal tail) are planned as an ordered list of
//! edits, and the edits are applied in a single pass before validation.
use crate::numbering::insertions::build_inward_list;
use crate::schemes::Scheme;
use crate::shared::errors::{ReconstructionError, Rejection};
use crate::shared::numbering::{ChainType, NumberedResidue, PositionLabel, CANONICAL_LENGTH};
use crate::shared::parameters::NumberingParameters;
use crate::shared::utils::round3;
use crate::shared::vocabulary::{NumberSymbol, NumberVocabulary};
use ndarray::ArrayView1;
use std::cmp::Ordering;
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Confidence {
    pub score: f64,
    // number of numeric labels the score was averaged over
    pub scored_positions: usize,
}

/// Mean step score over the numeric labels preceding the first `<EOS>`,
/// rounded to 3 decimals. Forced to 0 when fewer than
/// `min_scored_positions` labels are numeric.
pub fn confidence(
    tokens: ArrayView1<u32>,
    scores: ArrayView1<f32>,
    numbers: &NumberVocabulary,
    params: &NumberingParameters,
) -> Confidence {
    let end = tokens
        .iter()
        .position(|&t| numbers.decode(t) == Some(NumberSymbol::End))
        .unwrap_or(tokens.len());
    let scored: Vec<f64> = (0..end)
        .filter(|&i| matches!(numbers.decode(tokens[i]), Some(NumberSymbol::Number(_))))
        .map(|i| scores[i] as f64)
        .collect();
    let score = if scored.len() < params.min_scored_positions || scored.is_empty() {
        0.
    } else {
        round3(scored.iter().sum::<f64>() / scored.len() as f64)
    };
    Confidence {
        score,
        scored_positions: scored.len(),
    }
}

pub fn acceptance(
    confidence: &Confidence,
    params: &NumberingParameters,
) -> Result<(), Rejection> {
    if confidence.scored_positions < params.min_scored_positions {
        Err(Rejection::InsufficientSignal {
            minimum: params.min_scored_positions,
        })
    } else if confidence.score < params.score_cutoff {
        Err(Rejection::LowScore)
    } else {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Gap,
    Backfill,
    TailExtension,
}

/// Entries to insert in front of the `before`-th scanned residue
/// (`before == len` appends).
#[derive(Clone, Debug, PartialEq)]
pub struct Edit {
    pub before: usize,
    pub kind: EditKind,
    pub entries: Vec<NumberedResidue>,
}

impl Edit {
    fn gaps(before: usize, numbers: Range<u16>) -> Edit {
        Edit {
            before,
            kind: EditKind::Gap,
            entries: numbers.map(NumberedResidue::gap).collect(),
        }
    }

    fn literal(before: usize, kind: EditKind, first: u16, residues: &[char]) -> Edit {
        Edit {
            before,
            kind,
            entries: (first..)
                .zip(residues)
                .map(|(n, &c)| NumberedResidue::new(PositionLabel::plain(n), c))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    pub chain_type: ChainType,
    pub numbering: Vec<NumberedResidue>,
    pub query_start: usize,
    pub query_end: usize,
}

#[derive(Debug, Default)]
struct Scan {
    labels: Vec<PositionLabel>,
    residues: Vec<char>,
    // residues predicted as <SKIP> before the first label
    backfill: Vec<char>,
    query_start: Option<usize>,
    // first residue not consumed
    stop: usize,
}

fn close_run(
    labels: &mut [PositionLabel],
    from: usize,
    start: u16,
    end: u16,
) -> Result<(), ReconstructionError> {
    let built = build_inward_list(labels.len() - from, start, end)?;
    labels[from..].copy_from_slice(&built);
    Ok(())
}

fn scan(
    tokens: ArrayView1<u32>,
    residues: &[char],
    numbers: &NumberVocabulary,
) -> Result<Scan, ReconstructionError> {
    let mut scan = Scan::default();
    // (number before the run, index of its first label)
    let mut run: Option<(u16, usize)> = None;
    let mut stop = None;

    for p in 2..tokens.len() {
        let r = p - 2;
        let token = tokens[p];
        let symbol = numbers
            .decode(token)
            .ok_or(ReconstructionError::UnexpectedToken { token, position: p })?;
        if symbol == NumberSymbol::End || r >= residues.len() {
            stop = Some(r);
            break;
        }
        match symbol {
            NumberSymbol::Skip if scan.query_start.is_some() => {
                stop = Some(r);
                break;
            }
            NumberSymbol::Skip => {
                scan.backfill.push(residues[r]);
                continue;
            }
            NumberSymbol::Insertion => {
                if run.is_none() {
                    let previous = scan
                        .labels
                        .last()
                        .ok_or(ReconstructionError::UnanchoredInsertion(p))?;
                    run = Some((previous.number, scan.labels.len()));
                }
                // placeholder, relabelled when the run closes
                scan.labels.push(PositionLabel::plain(0));
            }
            NumberSymbol::Number(n) => {
                if let Some((start, from)) = run.take() {
                    close_run(&mut scan.labels, from, start, n)?;
                }
                scan.labels.push(PositionLabel::plain(n));
            }
            _ => return Err(ReconstructionError::UnexpectedToken { token, position: p }),
        }
        scan.residues.push(residues[r]);
        if scan.query_start.is_none() {
            scan.query_start = Some(r);
        }
    }

    if let Some((start, from)) = run {
        close_run(&mut scan.labels, from, start, start + 1)?;
    }
    scan.stop = stop.unwrap_or(tokens.len().saturating_sub(2).min(residues.len()));
    Ok(scan)
}

struct Plan {
    edits: Vec<Edit>,
    backfilled: usize,
    extended: usize,
}

fn plan_edits(
    scan: &Scan,
    chain_type: ChainType,
    residues: &[char],
    params: &NumberingParameters,
) -> Result<Plan, ReconstructionError> {
    let mut edits = Vec::new();
    let first = scan.labels.first().ok_or(ReconstructionError::Empty)?.number;

    let mut backfilled = 0;
    let mut backfill = None;
    if (params.backfill_min..=params.backfill_max).contains(&first) && !scan.backfill.is_empty()
    {
        backfilled = (first as usize - 1).min(scan.backfill.len());
        let recent = &scan.backfill[scan.backfill.len() - backfilled..];
        backfill = Some(Edit::literal(
            0,
            EditKind::Backfill,
            first - backfilled as u16,
            recent,
        ));
    }
    let first = first - backfilled as u16;
    if first > 1 {
        edits.push(Edit::gaps(0, 1..first));
    }
    edits.extend(backfill);

    for (i, pair) in scan.labels.windows(2).enumerate() {
        let (previous, current) = (pair[0].number, pair[1].number);
        if current < previous {
            return Err(ReconstructionError::Decreasing { previous, current });
        }
        if current > previous + 1 {
            edits.push(Edit::gaps(i + 1, previous + 1..current));
        }
    }

    let end = scan.labels.len();
    let mut last = scan.labels[end - 1].number;
    let terminal = chain_type.terminal_number();
    let mut extended = 0;
    if last < terminal
        && terminal - last <= params.tail_extension_window
        && scan.stop < residues.len()
    {
        extended = ((terminal - last) as usize).min(residues.len() - scan.stop);
        edits.push(Edit::literal(
            end,
            EditKind::TailExtension,
            last + 1,
            &residues[scan.stop..scan.stop + extended],
        ));
        last += extended as u16;
    }
    if last < CANONICAL_LENGTH {
        edits.push(Edit::gaps(end, last + 1..CANONICAL_LENGTH + 1));
    }

    Ok(Plan {
        edits,
        backfilled,
        extended,
    })
}

/// Insert every edit in front of its anchor, edits sharing an anchor in list order.
pub fn apply_edits(base: Vec<NumberedResidue>, mut edits: Vec<Edit>) -> Vec<NumberedResidue> {
    edits.sort_by_key(|e| e.before);
    let extra: usize = edits.iter().map(|e| e.entries.len()).sum();
    let mut result = Vec::with_capacity(base.len() + extra);
    let mut pending = edits.into_iter().peekable();
    for (i, entry) in base.into_iter().enumerate() {
        while let Some(edit) = pending.next_if(|e| e.before <= i) {
            result.extend(edit.entries);
        }
        result.push(entry);
    }
    result.extend(pending.flat_map(|e| e.entries));
    result
}

/// Check the canonical invariants: numbers in 1..=128, labels strictly
/// increasing in IMGT order, and every number present exactly once without an
/// insertion code.
pub fn validate(numbering: &[NumberedResidue]) -> Result<(), ReconstructionError> {
    let mut plain = vec![0usize; CANONICAL_LENGTH as usize + 1];
    let mut previous: Option<PositionLabel> = None;
    for residue in numbering {
        let label = residue.label;
        let number = label.number;
        if !(1..=CANONICAL_LENGTH).contains(&number) {
            return Err(ReconstructionError::OutOfRange(number));
        }
        if let Some(before) = previous {
            if number < before.number {
                return Err(ReconstructionError::Decreasing {
                    previous: before.number,
                    current: number,
                });
            }
            if before.cmp_in(&label, Scheme::Imgt) != Ordering::Less {
                return Err(ReconstructionError::Misordered {
                    previous: before,
                    current: label,
                });
            }
        }
        previous = Some(label);
        if !residue.label.is_insertion() {
            plain[number as usize] += 1;
        }
    }
    match (1..=CANONICAL_LENGTH).find(|&n| plain[n as usize] != 1) {
        Some(n) => Err(ReconstructionError::Coverage(n)),
        None => Ok(()),
    }
}

/// Rebuild the canonical numbering of one accepted row.
/// `residues` are the cleaned source residues of the row (no sentinels).
pub fn reconstruct(
    tokens: ArrayView1<u32>,
    residues: &[char],
    numbers: &NumberVocabulary,
    params: &NumberingParameters,
) -> Result<Reconstruction, ReconstructionError> {
    let chain_type = match tokens.get(1).and_then(|&t| numbers.decode(t)) {
        Some(NumberSymbol::Chain(chain)) => chain,
        _ => return Err(ReconstructionError::MissingChainMarker),
    };

    let scan = scan(tokens, residues, numbers)?;
    let query_start = scan.query_start.ok_or(ReconstructionError::Empty)?;
    let plan = plan_edits(&scan, chain_type, residues, params)?;

    let base = scan
        .labels
        .iter()
        .zip(&scan.residues)
        .map(|(&label, &residue)| NumberedResidue::new(label, residue))
        .collect();
    let numbering = apply_edits(base, plan.edits);
    validate(&numbering)?;

    Ok(Reconstruction {
        chain_type,
        numbering,
        query_start: query_start - plan.backfilled,
        query_end: scan.stop - 1 + plan.extended,
    })
}
