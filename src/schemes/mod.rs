//! Conversion of canonical (IMGT) numberings into the other numbering schemes
pub mod cdr;
pub mod tables;

use crate::shared::errors::ConversionError;
use crate::shared::numbering::{
    Alignment, ChainType, Insertion, NumberedResidue, NumberedSequence, PositionLabel,
};
use anyhow::anyhow;
use itertools::Itertools;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tables::{RegionRule, SchemeTable, State, CDR3_REGION, MAX_CDR3_LENGTH};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Imgt,
    Kabat,
    Chothia,
    Martin,
    Aho,
}

impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Imgt => "imgt",
            Scheme::Kabat => "kabat",
            Scheme::Chothia => "chothia",
            Scheme::Martin => "martin",
            Scheme::Aho => "aho",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Scheme {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Scheme> {
        match s.to_lowercase().as_str() {
            "imgt" => Ok(Scheme::Imgt),
            "kabat" => Ok(Scheme::Kabat),
            "chothia" => Ok(Scheme::Chothia),
            "martin" => Ok(Scheme::Martin),
            "aho" => Ok(Scheme::Aho),
            _ => Err(anyhow!("Unknown numbering scheme: {}", s)),
        }
    }
}

/// State of the framework walk, shared across regions.
struct Walk {
    offsets: [i32; 7],
    // last number emitted, any region
    previous: i32,
    // insertion letters used since the last plain number
    counter: usize,
    output: Vec<NumberedResidue>,
}

impl Walk {
    fn emit_number(&mut self, value: i32, imgt: u16, lettered: bool, residue: char) -> Result<(), ConversionError> {
        let number = u16::try_from(value)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ConversionError::OutOfRange(imgt))?;
        let insertion = if lettered || value <= self.previous {
            let letter = Insertion::letter(self.counter).ok_or(ConversionError::OutOfRange(imgt))?;
            self.counter += 1;
            letter
        } else {
            self.counter = 0;
            Insertion::BLANK
        };
        self.previous = value;
        self.output
            .push(NumberedResidue::new(PositionLabel::new(number, insertion), residue));
        Ok(())
    }

    fn framework(
        &mut self,
        table: &SchemeTable,
        region: usize,
        residues: &[NumberedResidue],
    ) -> Result<(), ConversionError> {
        for entry in residues {
            let imgt = entry.label.number;
            let state = table.state_of(imgt);
            let source_insertion = entry.label.is_insertion();
            if state == State::Expandable && !source_insertion {
                self.offsets[region] -= 1;
            }
            if entry.is_gap() {
                continue;
            }
            let value = imgt as i32 + self.offsets[region];
            match (state, source_insertion) {
                (State::Fixed, false) => {
                    self.counter = 0;
                    self.previous = value;
                    let number =
                        u16::try_from(value).map_err(|_| ConversionError::OutOfRange(imgt))?;
                    self.output
                        .push(NumberedResidue::new(PositionLabel::plain(number), entry.residue));
                }
                (State::Expandable, true) => self.emit_number(value, imgt, true, entry.residue)?,
                _ => self.emit_number(value, imgt, false, entry.residue)?,
            }
        }
        Ok(())
    }

    fn region(
        &mut self,
        scheme: Scheme,
        table: &SchemeTable,
        region: usize,
        residues: &[NumberedResidue],
    ) -> Result<(), ConversionError> {
        let observed: Vec<char> = residues
            .iter()
            .filter(|r| !r.is_gap())
            .map(|r| r.residue)
            .collect();
        let current = &table.regions[region];
        let too_long = |capacity: usize| ConversionError::RegionTooLong {
            scheme,
            region: current.name,
            length: observed.len(),
            capacity,
        };
        let labels = match current.rule {
            RegionRule::Ascending {
                base,
                anchor,
                deletions,
            } => cdr::ascending(observed.len(), base, anchor, deletions)
                .ok_or_else(|| too_long((base.1 - base.0 + 1) as usize + 26))?,
            RegionRule::Symmetric { first, last } => cdr::symmetric(observed.len(), first, last)
                .ok_or_else(|| too_long((last - first + 1) as usize))?,
            RegionRule::Framework { .. } => return self.framework(table, region, residues),
        };
        for (label, residue) in labels.into_iter().zip(observed) {
            self.previous = label.number as i32;
            self.counter = 0;
            self.output.push(NumberedResidue::new(label, residue));
        }
        Ok(())
    }
}

/// Convert one canonical numbering into `scheme`. The input is left untouched
/// and must still be numbered with IMGT.
pub fn convert(
    sequence: &NumberedSequence,
    scheme: Scheme,
) -> Result<NumberedSequence, ConversionError> {
    if !sequence.is_numbered() || sequence.alignment.is_failed() {
        return Err(ConversionError::NotNumbered(sequence.name.clone()));
    }
    if sequence.alignment.scheme != Scheme::Imgt {
        return Err(ConversionError::NotCanonical(sequence.alignment.scheme));
    }
    if scheme == Scheme::Imgt {
        return Ok(sequence.clone());
    }

    let chain: ChainType = sequence.alignment.chain_type;
    let table = tables::table(scheme, chain)?;
    let cdr3 = &table.regions[CDR3_REGION];
    let cdr3_length = sequence
        .numbering
        .iter()
        .filter(|r| cdr3.contains(r.label.number) && !r.is_gap())
        .count();
    if cdr3_length > MAX_CDR3_LENGTH {
        return Err(ConversionError::Cdr3TooLong {
            scheme,
            length: cdr3_length,
        });
    }

    let mut walk = Walk {
        offsets: table.offsets(),
        previous: 0,
        counter: 0,
        output: Vec::with_capacity(sequence.numbering.len()),
    };
    for (region, group) in &sequence
        .numbering
        .iter()
        .group_by(|r| table.region_of(r.label.number))
    {
        let residues: Vec<NumberedResidue> = group.copied().collect();
        let region = region.ok_or(ConversionError::OutOfRange(residues[0].label.number))?;
        walk.region(scheme, table, region, &residues)?;
    }

    Ok(NumberedSequence {
        name: sequence.name.clone(),
        numbering: walk.output,
        alignment: Alignment {
            scheme,
            ..sequence.alignment.clone()
        },
    })
}

/// Convert every sequence in parallel. Failures come back empty with the
/// reason in `error`; inputs that were never numbered are returned as they are.
pub fn convert_all(sequences: &[NumberedSequence], scheme: Scheme) -> Vec<NumberedSequence> {
    sequences
        .par_iter()
        .map(|sequence| match convert(sequence, scheme) {
            Ok(converted) => converted,
            Err(ConversionError::NotNumbered(_)) => sequence.clone(),
            Err(e) => {
                debug!("Cannot convert {} to {}: {}", sequence.name, scheme, e);
                NumberedSequence {
                    name: sequence.name.clone(),
                    numbering: Vec::new(),
                    alignment: Alignment {
                        scheme,
                        ..Alignment::failed(sequence.alignment.score, e)
                    },
                }
            }
        })
        .collect()
}
