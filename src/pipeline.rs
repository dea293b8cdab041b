//! End-to-end numbering of named sequences with one model.
use crate::numbering::{greedy_decode, number_decoded};
use crate::shared::model::SequenceModel;
use crate::shared::numbering::NumberedSequence;
use crate::shared::parameters::{NumberingParameters, WindowParameters};
use crate::shared::utils::{chunk_ranges, pad_batch};
use crate::shared::vocabulary::{ReceptorKind, Vocabulary, SUBSTITUTE_RESIDUE};
use crate::window::{Window, WindowSelector};
use anyhow::{bail, ensure, Result};
#[cfg(feature = "kdam")]
use kdam::TqdmIterator;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;

/// Characters separating the chains of a paired input (e.g. `VH/VL`)
pub const CHAIN_SEPARATORS: [char; 3] = ['-', '/', '\\'];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: String,
    pub residues: String,
}

impl NamedSequence {
    pub fn new(name: impl Into<String>, residues: impl Into<String>) -> NamedSequence {
        NamedSequence {
            name: name.into(),
            residues: residues.into(),
        }
    }

    /// Split a paired input into `<name>_1`, `<name>_2`, ...
    /// A sequence without separator is returned unchanged.
    pub fn split_chains(&self) -> Vec<NamedSequence> {
        let parts: Vec<&str> = self
            .residues
            .split(&CHAIN_SEPARATORS[..])
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() <= 1 {
            return vec![NamedSequence::new(
                self.name.clone(),
                parts.first().copied().unwrap_or(""),
            )];
        }
        parts
            .into_iter()
            .enumerate()
            .map(|(i, p)| NamedSequence::new(format!("{}_{}", self.name, i + 1), p))
            .collect()
    }
}

impl<N: Into<String>, R: Into<String>> From<(N, R)> for NamedSequence {
    fn from((name, residues): (N, R)) -> NamedSequence {
        NamedSequence::new(name, residues)
    }
}

// One decodable unit: a (possibly windowed) chain with its window offset.
struct Unit {
    name: String,
    residues: Vec<char>,
    tokens: Vec<u32>,
    offset: usize,
}

fn check_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            bail!("Duplicate sequence name: {}", name);
        }
    }
    Ok(())
}

// Long chains may be split into `<name>_<k>` domains: refuse any other chain
// already holding such a name.
fn check_domain_names(chains: &[NamedSequence], long: impl Fn(&NamedSequence) -> bool) -> Result<()> {
    let names: HashSet<&str> = chains.iter().map(|c| c.name.as_str()).collect();
    for chain in chains.iter().filter(|c| long(*c)) {
        for name in &names {
            let suffix = name
                .strip_prefix(chain.name.as_str())
                .and_then(|rest| rest.strip_prefix('_'));
            if let Some(k) = suffix {
                if !k.is_empty() && k.chars().all(|c| c.is_ascii_digit()) {
                    bail!(
                        "Sequence name {} is reserved for the domains of {}",
                        name,
                        chain.name
                    );
                }
            }
        }
    }
    Ok(())
}

pub struct Numberer<M: SequenceModel> {
    pub model: M,
    pub vocabulary: Vocabulary,
    pub params: NumberingParameters,
    pub window_params: WindowParameters,
}

impl<M: SequenceModel> Numberer<M> {
    pub fn new(model: M, kind: ReceptorKind) -> Numberer<M> {
        Numberer {
            model,
            vocabulary: Vocabulary::new(kind),
            params: NumberingParameters::default(),
            window_params: WindowParameters::default(),
        }
    }

    pub fn with_parameters(
        model: M,
        kind: ReceptorKind,
        params: NumberingParameters,
        window_params: WindowParameters,
    ) -> Numberer<M> {
        Numberer {
            model,
            vocabulary: Vocabulary::new(kind),
            params,
            window_params,
        }
    }

    fn prepare(&self, sequences: &[NamedSequence]) -> Result<Vec<Unit>> {
        let chains: Vec<NamedSequence> = sequences.iter().flat_map(|s| s.split_chains()).collect();
        check_names(chains.iter().map(|s| s.name.as_str()))?;
        if self.window_params.multi_domain {
            let max = self.params.max_sequence_length;
            check_domain_names(&chains, |c| c.residues.chars().count() > max)?;
        }

        let selector = WindowSelector::new(
            &self.model,
            &self.vocabulary,
            &self.window_params,
            self.params.batch_size,
        );
        let mut long = 0;
        let mut units = Vec::with_capacity(chains.len());
        for chain in chains {
            let (cleaned, substituted) = self.vocabulary.residues.clean(&chain.residues);
            if substituted > 0 {
                warn!(
                    "Sequence {} contains {} invalid residue(s), replaced by {}",
                    chain.name, substituted, SUBSTITUTE_RESIDUE
                );
            }
            let cleaned: String = cleaned.into_iter().collect();
            let windows = if cleaned.len() > self.params.max_sequence_length {
                long += 1;
                selector.select(&cleaned)?
            } else {
                vec![Window {
                    start: 0,
                    end: cleaned.len(),
                }]
            };
            let multiple = windows.len() > 1;
            for (k, window) in windows.into_iter().enumerate() {
                let name = if multiple {
                    format!("{}_{}", chain.name, k + 1)
                } else {
                    chain.name.clone()
                };
                if window.len() < cleaned.len() {
                    debug!("{}: numbering window {}..{}", name, window.start, window.end);
                }
                let (tokens, residues) = self.vocabulary.residues.encode(&name, window.slice(&cleaned));
                units.push(Unit {
                    name,
                    residues,
                    tokens,
                    offset: window.start,
                });
            }
        }
        if long > 0 {
            info!("{} long sequence(s) windowed around their variable domain", long);
        }
        check_names(units.iter().map(|u| u.name.as_str()))?;
        Ok(units)
    }

    /// Number every sequence. Results come back in input order, paired inputs
    /// and multi-domain sequences expanded in place.
    pub fn number(&self, sequences: &[NamedSequence]) -> Result<Vec<NumberedSequence>> {
        ensure!(!sequences.is_empty(), "No sequence to number");
        check_names(sequences.iter().map(|s| s.name.as_str()))?;
        let units = self.prepare(sequences)?;

        let mut order: Vec<usize> = (0..units.len()).collect();
        order.sort_by_key(|&i| units[i].residues.len());

        let mut results: Vec<Option<NumberedSequence>> = vec![None; units.len()];
        let numbers = &self.vocabulary.numbers;
        let params = &self.params;
        for batch in order.chunks(self.params.batch_size.max(1)) {
            let rows: Vec<&[u32]> = batch.iter().map(|&i| units[i].tokens.as_slice()).collect();
            let source = pad_batch(&rows);
            let decoded = greedy_decode(&self.model, source.view(), numbers.len())?;

            let numbered: Vec<(usize, NumberedSequence)> = batch
                .par_iter()
                .enumerate()
                .map(|(row, &i)| {
                    let unit = &units[i];
                    let (tokens, scores) = decoded.row(row);
                    let mut result =
                        number_decoded(&unit.name, tokens, scores, &unit.residues, numbers, params);
                    result.alignment = result.alignment.offset_by(unit.offset);
                    (i, result)
                })
                .collect();
            for (i, result) in numbered {
                results[i] = Some(result);
            }
        }
        let numbered: Vec<NumberedSequence> = results.into_iter().flatten().collect();
        ensure!(
            numbered.len() == units.len(),
            "Lost track of {} sequence(s) during numbering",
            units.len() - numbered.len()
        );
        Ok(numbered)
    }

    /// Number large inputs `chunk_size` sequences at a time, handing each
    /// chunk's results to `sink` before starting the next one.
    pub fn number_in_chunks<F>(&self, sequences: &[NamedSequence], mut sink: F) -> Result<()>
    where
        F: FnMut(Vec<NumberedSequence>) -> Result<()>,
    {
        ensure!(!sequences.is_empty(), "No sequence to number");
        check_names(sequences.iter().map(|s| s.name.as_str()))?;
        let ranges = chunk_ranges(sequences.len(), self.params.chunk_size);
        info!(
            "Numbering {} sequences in {} chunk(s)",
            sequences.len(),
            ranges.len()
        );
        #[cfg(feature = "kdam")]
        let ranges = ranges.into_iter().tqdm();
        for range in ranges {
            sink(self.number(&sequences[range])?)?;
        }
        Ok(())
    }
}
