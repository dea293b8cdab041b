//! Positional labels, numbered residues and the per-sequence alignment record
use crate::numbering::insertions::CDR_ANCHORS;
use crate::schemes::Scheme;
use anyhow::{anyhow, Result};
use phf::phf_map;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Residue character used for positions of the canonical range that are not observed.
pub const GAP: char = '-';

/// Number of positions of the canonical (IMGT) numbering.
pub const CANONICAL_LENGTH: u16 = 128;

// All upper case letters, then all upper case letters doubled, then a blank.
pub const INSERTION_ALPHABET: [&str; 53] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "AA", "BB", "CC", "DD", "EE", "FF", "GG", "HH", "II", "JJ",
    "KK", "LL", "MM", "NN", "OO", "PP", "QQ", "RR", "SS", "TT", "UU", "VV", "WW", "XX", "YY", "ZZ",
    " ",
];

static CHAIN_CODES: phf::Map<char, ChainType> = phf_map! {
    'H' => ChainType::Heavy,
    'K' => ChainType::Kappa,
    'L' => ChainType::Lambda,
    'A' => ChainType::Alpha,
    'B' => ChainType::Beta,
    'G' => ChainType::Gamma,
    'D' => ChainType::Delta,
    'F' => ChainType::Failed,
};

/// Insertion code of a position: blank, or an index in `INSERTION_ALPHABET`
/// (never the trailing blank entry).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Insertion(Option<u8>);

impl Insertion {
    pub const BLANK: Insertion = Insertion(None);

    /// Code at `index` of the insertion alphabet, wrapping around once the
    /// alphabet is exhausted (the wrap passes through the blank code).
    pub fn cycle(index: usize) -> Insertion {
        let i = index % INSERTION_ALPHABET.len();
        if i == INSERTION_ALPHABET.len() - 1 {
            Insertion::BLANK
        } else {
            Insertion(Some(i as u8))
        }
    }

    /// Letter code at `index` without wrapping, `None` past `ZZ`.
    pub fn letter(index: usize) -> Option<Insertion> {
        if index < INSERTION_ALPHABET.len() - 1 {
            Some(Insertion(Some(index as u8)))
        } else {
            None
        }
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_none()
    }

    /// Position in the insertion alphabet, `None` when blank
    pub fn index(&self) -> Option<usize> {
        self.0.map(|i| i as usize)
    }

    /// The code as written in numbering output (" " when blank)
    pub fn code(&self) -> &'static str {
        match self.0 {
            None => " ",
            Some(i) => INSERTION_ALPHABET[i as usize],
        }
    }

    pub fn from_code(code: &str) -> Result<Insertion> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(Insertion::BLANK);
        }
        INSERTION_ALPHABET
            .iter()
            .position(|&c| c == code)
            .map(|i| Insertion(Some(i as u8)))
            .ok_or(anyhow!("Invalid insertion code {}", code))
    }
}

impl fmt::Display for Insertion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code().trim())
    }
}

impl Serialize for Insertion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Insertion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Insertion::from_code(&code).map_err(serde::de::Error::custom)
    }
}

/// A scheme position: number plus insertion code.
/// The derived ordering is (number, insertion) with blank first and letters in
/// alphabet order. `cmp_in` gives the order a given scheme lists labels in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionLabel {
    pub number: u16,
    pub insertion: Insertion,
}

impl PositionLabel {
    pub fn new(number: u16, insertion: Insertion) -> PositionLabel {
        PositionLabel { number, insertion }
    }

    pub fn plain(number: u16) -> PositionLabel {
        PositionLabel {
            number,
            insertion: Insertion::BLANK,
        }
    }

    pub fn is_insertion(&self) -> bool {
        !self.insertion.is_blank()
    }

    /// Order of two labels within a numbering in `scheme`.
    ///
    /// In IMGT the insertions on the far side of a CDR anchor (33, 61, 112)
    /// grow outward from the anchor: they come before the plain number, last
    /// letter first (`112B, 112A, 112`). Everything else is the derived order.
    pub fn cmp_in(&self, other: &PositionLabel, scheme: Scheme) -> Ordering {
        let inward =
            scheme == Scheme::Imgt && CDR_ANCHORS.iter().any(|&anchor| anchor + 1 == self.number);
        match self.number.cmp(&other.number) {
            Ordering::Equal if inward => {
                match (self.insertion.index(), other.insertion.index()) {
                    (Some(a), Some(b)) => b.cmp(&a),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            Ordering::Equal => self.insertion.cmp(&other.insertion),
            order => order,
        }
    }
}

impl fmt::Display for PositionLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.number, self.insertion)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberedResidue {
    pub label: PositionLabel,
    pub residue: char,
}

impl NumberedResidue {
    pub fn new(label: PositionLabel, residue: char) -> NumberedResidue {
        NumberedResidue { label, residue }
    }

    pub fn gap(number: u16) -> NumberedResidue {
        NumberedResidue {
            label: PositionLabel::plain(number),
            residue: GAP,
        }
    }

    pub fn is_gap(&self) -> bool {
        self.residue == GAP
    }
}

/// Receptor chain identifier, as decoded from the chain-type marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum ChainType {
    Heavy,
    Kappa,
    Lambda,
    Alpha,
    Beta,
    Gamma,
    Delta,
    Failed,
}

impl ChainType {
    pub fn code(&self) -> char {
        match self {
            ChainType::Heavy => 'H',
            ChainType::Kappa => 'K',
            ChainType::Lambda => 'L',
            ChainType::Alpha => 'A',
            ChainType::Beta => 'B',
            ChainType::Gamma => 'G',
            ChainType::Delta => 'D',
            ChainType::Failed => 'F',
        }
    }

    pub fn from_code(code: char) -> Result<ChainType> {
        CHAIN_CODES
            .get(&code.to_ascii_uppercase())
            .copied()
            .ok_or(anyhow!("Unknown chain type code {}", code))
    }

    /// Chains built with a D gene run to position 128, the others stop at 127.
    pub fn is_heavy_like(&self) -> bool {
        matches!(self, ChainType::Heavy | ChainType::Beta | ChainType::Delta)
    }

    pub fn is_tcr(&self) -> bool {
        matches!(
            self,
            ChainType::Alpha | ChainType::Beta | ChainType::Gamma | ChainType::Delta
        )
    }

    /// Last canonical position expected to carry a residue
    pub fn terminal_number(&self) -> u16 {
        if self.is_heavy_like() {
            CANONICAL_LENGTH
        } else {
            CANONICAL_LENGTH - 1
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ChainType> for char {
    fn from(chain: ChainType) -> char {
        chain.code()
    }
}

impl TryFrom<char> for ChainType {
    type Error = String;
    fn try_from(code: char) -> Result<Self, Self::Error> {
        ChainType::from_code(code).map_err(|e| e.to_string())
    }
}

/// Per-sequence metadata attached to a numbering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub chain_type: ChainType,
    pub score: f64,
    // first/last residue covered by the numbering, in the input sequence
    pub query_start: Option<usize>,
    pub query_end: Option<usize>,
    pub error: Option<String>,
    pub scheme: Scheme,
}

impl Alignment {
    pub fn failed(score: f64, error: impl ToString) -> Alignment {
        Alignment {
            chain_type: ChainType::Failed,
            score,
            query_start: None,
            query_end: None,
            error: Some(error.to_string()),
            scheme: Scheme::Imgt,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.chain_type == ChainType::Failed
    }

    /// Re-project the query coordinates from a window back onto the full sequence.
    pub fn offset_by(self, offset: usize) -> Alignment {
        Alignment {
            query_start: self.query_start.map(|s| s + offset),
            query_end: self.query_end.map(|e| e + offset),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumberedSequence {
    pub name: String,
    pub numbering: Vec<NumberedResidue>,
    pub alignment: Alignment,
}

impl NumberedSequence {
    pub fn failed(name: &str, score: f64, error: impl ToString) -> NumberedSequence {
        NumberedSequence {
            name: name.to_string(),
            numbering: Vec::new(),
            alignment: Alignment::failed(score, error),
        }
    }

    pub fn is_numbered(&self) -> bool {
        !self.numbering.is_empty()
    }

    /// Residues of the numbering, gaps removed
    pub fn observed(&self) -> String {
        self.numbering
            .iter()
            .filter(|r| !r.is_gap())
            .map(|r| r.residue)
            .collect()
    }
}

/// A canonical numbering split along the IMGT region boundaries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImgtRegions {
    pub fw1: Vec<NumberedResidue>,
    pub cdr1: Vec<NumberedResidue>,
    pub fw2: Vec<NumberedResidue>,
    pub cdr2: Vec<NumberedResidue>,
    pub fw3: Vec<NumberedResidue>,
    pub cdr3: Vec<NumberedResidue>,
    pub fw4: Vec<NumberedResidue>,
}

impl ImgtRegions {
    pub fn from_numbering(numbering: &[NumberedResidue]) -> ImgtRegions {
        let mut regions = ImgtRegions::default();
        for &residue in numbering {
            let region = match residue.label.number {
                1..=26 => &mut regions.fw1,
                27..=38 => &mut regions.cdr1,
                39..=55 => &mut regions.fw2,
                56..=65 => &mut regions.cdr2,
                66..=104 => &mut regions.fw3,
                105..=117 => &mut regions.cdr3,
                _ => &mut regions.fw4,
            };
            region.push(residue);
        }
        regions
    }
}
