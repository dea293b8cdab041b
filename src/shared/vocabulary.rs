//! Fixed symbol tables mapping residues and numbering labels to model token ids.
//!
//! Both vocabularies share the layout `<PAD>, <SOS>, <EOS>, <SKIP>, ...`. The
//! residue vocabulary then lists the 26 upper case letters followed by the chain
//! markers, the number vocabulary lists `1..=160`, the insertion token `X` and
//! the chain markers. When a symbol is listed twice (a marker letter that is
//! also a residue letter) it encodes to its last id, which is what the models
//! were trained with.
use crate::shared::numbering::ChainType;
use anyhow::{anyhow, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

pub const PAD: u32 = 0;
pub const START: u32 = 1;
pub const END: u32 = 2;
pub const SKIP: u32 = 3;

/// Largest number token of the number vocabulary (wide schemes need more than 128)
pub const MAX_NUMBER_TOKEN: u16 = 160;

/// Residue used in place of any symbol the residue vocabulary does not know
pub const SUBSTITUTE_RESIDUE: char = 'X';

const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceptorKind {
    Antibody,
    Tcr,
}

impl ReceptorKind {
    pub fn chain_markers(&self) -> &'static [ChainType] {
        match self {
            ReceptorKind::Antibody => &[ChainType::Heavy, ChainType::Lambda, ChainType::Kappa],
            ReceptorKind::Tcr => &[
                ChainType::Alpha,
                ChainType::Beta,
                ChainType::Gamma,
                ChainType::Delta,
            ],
        }
    }
}

impl FromStr for ReceptorKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "antibody" | "shark" => Ok(ReceptorKind::Antibody),
            "tcr" => Ok(ReceptorKind::Tcr),
            _ => Err(anyhow!("Invalid receptor type: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResidueSymbol {
    Pad,
    Start,
    End,
    Skip,
    Residue(char),
    Chain(ChainType),
}

impl ResidueSymbol {
    fn as_char(&self) -> Option<char> {
        match self {
            ResidueSymbol::Residue(c) => Some(*c),
            ResidueSymbol::Chain(chain) => Some(chain.code()),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberSymbol {
    Pad,
    Start,
    End,
    Skip,
    Number(u16),
    Insertion,
    Chain(ChainType),
}

impl NumberSymbol {
    pub fn number(&self) -> Option<u16> {
        match self {
            NumberSymbol::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Residue-side token table
#[derive(Clone, Debug)]
pub struct ResidueVocabulary {
    symbols: Vec<ResidueSymbol>,
    ids: HashMap<char, u32>,
}

impl ResidueVocabulary {
    pub fn new(kind: ReceptorKind) -> ResidueVocabulary {
        let mut symbols = vec![
            ResidueSymbol::Pad,
            ResidueSymbol::Start,
            ResidueSymbol::End,
            ResidueSymbol::Skip,
        ];
        symbols.extend(LETTERS.chars().map(ResidueSymbol::Residue));
        symbols.extend(kind.chain_markers().iter().map(|&c| ResidueSymbol::Chain(c)));

        let mut ids = HashMap::new();
        for (id, symbol) in symbols.iter().enumerate() {
            if let Some(c) = symbol.as_char() {
                // later entries overwrite earlier ones
                ids.insert(c, id as u32);
            }
        }
        ResidueVocabulary { symbols, ids }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn encode_residue(&self, residue: char) -> Option<u32> {
        self.ids.get(&residue).copied()
    }

    pub fn decode(&self, id: u32) -> Option<ResidueSymbol> {
        self.symbols.get(id as usize).copied()
    }

    /// Upper case the sequence and replace every symbol the vocabulary does not
    /// know by `SUBSTITUTE_RESIDUE`. Returns the cleaned residues and the number
    /// of substitutions made.
    pub fn clean(&self, sequence: &str) -> (Vec<char>, usize) {
        let mut substituted = 0;
        let residues = sequence
            .chars()
            .map(|c| {
                let upper = c.to_ascii_uppercase();
                if self.ids.contains_key(&upper) {
                    upper
                } else {
                    substituted += 1;
                    SUBSTITUTE_RESIDUE
                }
            })
            .collect();
        (residues, substituted)
    }

    /// Tokenize a sequence bookended by `<SOS>` and `<EOS>`.
    /// Unknown residues are substituted (with a warning), never rejected.
    pub fn encode(&self, name: &str, sequence: &str) -> (Vec<u32>, Vec<char>) {
        let (residues, substituted) = self.clean(sequence);
        if substituted > 0 {
            warn!(
                "Sequence {} contains {} invalid residue(s), replaced by {}",
                name, substituted, SUBSTITUTE_RESIDUE
            );
        }
        let mut tokens = Vec::with_capacity(residues.len() + 2);
        tokens.push(START);
        // every cleaned residue is in the table
        tokens.extend(residues.iter().filter_map(|&c| self.encode_residue(c)));
        tokens.push(END);
        (tokens, residues)
    }
}

/// Label-side token table
#[derive(Clone, Debug)]
pub struct NumberVocabulary {
    symbols: Vec<NumberSymbol>,
}

impl NumberVocabulary {
    pub fn new(kind: ReceptorKind) -> NumberVocabulary {
        let mut symbols = vec![
            NumberSymbol::Pad,
            NumberSymbol::Start,
            NumberSymbol::End,
            NumberSymbol::Skip,
        ];
        symbols.extend((1..=MAX_NUMBER_TOKEN).map(NumberSymbol::Number));
        symbols.push(NumberSymbol::Insertion);
        symbols.extend(kind.chain_markers().iter().map(|&c| NumberSymbol::Chain(c)));
        NumberVocabulary { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn decode(&self, id: u32) -> Option<NumberSymbol> {
        self.symbols.get(id as usize).copied()
    }

    pub fn encode(&self, symbol: NumberSymbol) -> Option<u32> {
        self.symbols
            .iter()
            .rposition(|&s| s == symbol)
            .map(|id| id as u32)
    }
}

/// Both token tables of one receptor kind, built once and passed around.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    pub kind: ReceptorKind,
    pub residues: ResidueVocabulary,
    pub numbers: NumberVocabulary,
}

impl Vocabulary {
    pub fn new(kind: ReceptorKind) -> Vocabulary {
        Vocabulary {
            kind,
            residues: ResidueVocabulary::new(kind),
            numbers: NumberVocabulary::new(kind),
        }
    }
}
