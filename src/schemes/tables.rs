//! Static IMGT to Kabat / Chothia / Martin / Aho correspondence tables.
//!
//! Every table cuts the 128 IMGT positions into seven regions. Framework
//! regions are shifted by a running offset, decremented at each expandable
//! (`I`) position; CDR regions are relabelled from their length.
use crate::schemes::Scheme;
use crate::shared::errors::ConversionError;
use crate::shared::numbering::{ChainType, CANONICAL_LENGTH};

/// Index of the CDR3 region in every table
pub const CDR3_REGION: usize = 5;

/// Longest CDR3 any table can number
pub const MAX_CDR3_LENGTH: usize = 36;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Fixed,
    Expandable,
}

impl State {
    pub fn code(&self) -> char {
        match self {
            State::Fixed => 'X',
            State::Expandable => 'I',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionRule {
    Framework {
        offset: i32,
        expandable: &'static [u16],
    },
    Ascending {
        base: (u16, u16),
        anchor: u16,
        deletions: &'static [u16],
    },
    Symmetric {
        first: u16,
        last: u16,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub name: &'static str,
    // IMGT positions covered, inclusive
    pub first: u16,
    pub last: u16,
    pub rule: RegionRule,
}

impl Region {
    pub fn contains(&self, imgt: u16) -> bool {
        (self.first..=self.last).contains(&imgt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemeTable {
    pub regions: [Region; 7],
}

impl SchemeTable {
    pub fn region_of(&self, imgt: u16) -> Option<usize> {
        self.regions.iter().position(|r| r.contains(imgt))
    }

    pub fn state_of(&self, imgt: u16) -> State {
        let expandable = self.region_of(imgt).map_or(false, |i| {
            matches!(self.regions[i].rule, RegionRule::Framework { expandable, .. } if expandable.contains(&imgt))
        });
        if expandable {
            State::Expandable
        } else {
            State::Fixed
        }
    }

    /// Region index of every IMGT position, as a 128-character string
    pub fn region_string(&self) -> String {
        (1..=CANONICAL_LENGTH)
            .map(|n| {
                self.region_of(n)
                    .and_then(|i| char::from_digit(i as u32, 10))
                    .unwrap_or('?')
            })
            .collect()
    }

    /// `X`/`I` state of every IMGT position, as a 128-character string
    pub fn state_string(&self) -> String {
        (1..=CANONICAL_LENGTH)
            .map(|n| self.state_of(n).code())
            .collect()
    }

    /// Starting offsets of the framework regions (0 for CDRs)
    pub fn offsets(&self) -> [i32; 7] {
        self.regions.map(|r| match r.rule {
            RegionRule::Framework { offset, .. } => offset,
            _ => 0,
        })
    }
}

const fn framework(name: &'static str, first: u16, last: u16, offset: i32, expandable: &'static [u16]) -> Region {
    Region {
        name,
        first,
        last,
        rule: RegionRule::Framework { offset, expandable },
    }
}

const fn ascending(
    name: &'static str,
    first: u16,
    last: u16,
    base: (u16, u16),
    anchor: u16,
    deletions: &'static [u16],
) -> Region {
    Region {
        name,
        first,
        last,
        rule: RegionRule::Ascending {
            base,
            anchor,
            deletions,
        },
    }
}

const fn symmetric(name: &'static str, first: u16, last: u16, target: (u16, u16)) -> Region {
    Region {
        name,
        first,
        last,
        rule: RegionRule::Symmetric {
            first: target.0,
            last: target.1,
        },
    }
}

const HEAVY_CDR3_DELETIONS: [u16; 10] = [100, 99, 98, 97, 96, 95, 101, 102, 94, 93];
const LIGHT_CDR3_DELETIONS: [u16; 9] = [95, 94, 93, 92, 91, 96, 97, 90, 89];
const KABAT_HEAVY_CDR1_DELETIONS: [u16; 10] = [35, 34, 33, 32, 31, 30, 29, 28, 27, 26];
const CHOTHIA_HEAVY_CDR1_DELETIONS: [u16; 10] = [31, 30, 32, 29, 33, 28, 34, 27, 35, 26];
const HEAVY_CDR2_DELETIONS: [u16; 7] = [52, 53, 54, 55, 51, 56, 57];
const KABAT_LIGHT_CDR1_DELETIONS: [u16; 8] = [28, 29, 30, 31, 32, 27, 33, 34];
const CHOTHIA_LIGHT_CDR1_DELETIONS: [u16; 8] = [30, 29, 31, 28, 32, 27, 33, 34];
const LIGHT_CDR2_DELETIONS: [u16; 7] = [54, 53, 55, 52, 56, 51, 50];

pub static KABAT_HEAVY: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[10]),
        ascending("cdr1", 27, 40, (26, 35), 35, &KABAT_HEAVY_CDR1_DELETIONS),
        framework("fw2", 41, 55, -5, &[]),
        ascending("cdr2", 56, 65, (51, 57), 52, &HEAVY_CDR2_DELETIONS),
        framework("fw3", 66, 104, -8, &[73, 92, 93, 94]),
        ascending("cdr3", 105, 117, (93, 102), 100, &HEAVY_CDR3_DELETIONS),
        framework("fw4", 118, 128, -15, &[]),
    ],
};

pub static KABAT_LIGHT: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[]),
        ascending("cdr1", 27, 40, (27, 34), 27, &KABAT_LIGHT_CDR1_DELETIONS),
        framework("fw2", 41, 55, -6, &[]),
        ascending("cdr2", 56, 69, (50, 56), 54, &LIGHT_CDR2_DELETIONS),
        framework("fw3", 70, 104, -13, &[73, 81, 82]),
        ascending("cdr3", 105, 117, (89, 97), 95, &LIGHT_CDR3_DELETIONS),
        framework("fw4", 118, 128, -20, &[]),
    ],
};

pub static CHOTHIA_HEAVY: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[10]),
        ascending("cdr1", 27, 40, (26, 35), 31, &CHOTHIA_HEAVY_CDR1_DELETIONS),
        framework("fw2", 41, 55, -5, &[]),
        ascending("cdr2", 56, 65, (51, 57), 52, &HEAVY_CDR2_DELETIONS),
        framework("fw3", 66, 104, -8, &[73, 92, 93, 94]),
        ascending("cdr3", 105, 117, (93, 102), 100, &HEAVY_CDR3_DELETIONS),
        framework("fw4", 118, 128, -15, &[]),
    ],
};

// Chothia CDRs, framework 3 insertions after H72 instead of H82
pub static MARTIN_HEAVY: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[10]),
        ascending("cdr1", 27, 40, (26, 35), 31, &CHOTHIA_HEAVY_CDR1_DELETIONS),
        framework("fw2", 41, 55, -5, &[]),
        ascending("cdr2", 56, 65, (51, 57), 52, &HEAVY_CDR2_DELETIONS),
        framework("fw3", 66, 104, -8, &[73, 82, 83, 84]),
        ascending("cdr3", 105, 117, (93, 102), 100, &HEAVY_CDR3_DELETIONS),
        framework("fw4", 118, 128, -15, &[]),
    ],
};

pub static CHOTHIA_LIGHT: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[]),
        ascending("cdr1", 27, 40, (27, 34), 30, &CHOTHIA_LIGHT_CDR1_DELETIONS),
        framework("fw2", 41, 55, -6, &[]),
        ascending("cdr2", 56, 69, (50, 56), 54, &LIGHT_CDR2_DELETIONS),
        framework("fw3", 70, 104, -13, &[73, 81, 82]),
        ascending("cdr3", 105, 117, (89, 97), 95, &LIGHT_CDR3_DELETIONS),
        framework("fw4", 118, 128, -20, &[]),
    ],
};

pub static AHO: SchemeTable = SchemeTable {
    regions: [
        framework("fw1", 1, 26, 0, &[]),
        symmetric("cdr1", 27, 38, (27, 40)),
        framework("fw2", 39, 55, 2, &[]),
        symmetric("cdr2", 56, 65, (58, 67)),
        framework("fw3", 66, 104, 2, &[]),
        symmetric("cdr3", 105, 117, (107, 138)),
        framework("fw4", 118, 128, 21, &[]),
    ],
};

/// Table for a scheme and chain. Martin shares the Chothia light chain table.
pub fn table(scheme: Scheme, chain: ChainType) -> Result<&'static SchemeTable, ConversionError> {
    let unsupported = ConversionError::UnsupportedChain { scheme, chain };
    if chain == ChainType::Failed || (chain.is_tcr() && scheme != Scheme::Aho) {
        return Err(unsupported);
    }
    match (scheme, chain) {
        (Scheme::Aho, _) => Ok(&AHO),
        (Scheme::Kabat, ChainType::Heavy) => Ok(&KABAT_HEAVY),
        (Scheme::Kabat, _) => Ok(&KABAT_LIGHT),
        (Scheme::Chothia, ChainType::Heavy) => Ok(&CHOTHIA_HEAVY),
        (Scheme::Martin, ChainType::Heavy) => Ok(&MARTIN_HEAVY),
        (Scheme::Chothia | Scheme::Martin, _) => Ok(&CHOTHIA_LIGHT),
        (Scheme::Imgt, _) => Err(unsupported),
    }
}
