//! Typed per-sequence outcomes. Fatal problems go through `anyhow` instead.
use crate::schemes::Scheme;
use crate::shared::numbering::{ChainType, PositionLabel};
use thiserror::Error;

/// Why a decoded sequence did not get a numbering.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("Less than {minimum} non-insertion residues numbered.")]
    InsufficientSignal { minimum: usize },
    #[error("Score less than cut off.")]
    LowScore,
    #[error("Could not apply numbering: {0}")]
    Reconstruction(#[from] ReconstructionError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconstructionError {
    #[error("insertion run at token {0} has no preceding number")]
    UnanchoredInsertion(usize),
    #[error("cannot place insertions after IMGT position {0}, it lies inside a CDR")]
    ForbiddenInsertion(u16),
    #[error("insertion start {0} is outside the numbering range")]
    InvalidInsertionStart(u16),
    #[error("first decoded token is not a chain marker")]
    MissingChainMarker,
    #[error("unexpected token id {token} at position {position}")]
    UnexpectedToken { token: u32, position: usize },
    #[error("no residue was numbered")]
    Empty,
    #[error("number {0} is outside 1..=128")]
    OutOfRange(u16),
    #[error("number {current} follows {previous}")]
    Decreasing { previous: u16, current: u16 },
    #[error("label {current} follows {previous}")]
    Misordered {
        previous: PositionLabel,
        current: PositionLabel,
    },
    #[error("position {0} is not covered exactly once")]
    Coverage(u16),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Too many insertions, cannot apply {scheme} scheme: CDR3 length {length} exceeds 36.")]
    Cdr3TooLong { scheme: Scheme, length: usize },
    #[error("Too many insertions, cannot apply {scheme} scheme: {region} length {length} exceeds {capacity}.")]
    RegionTooLong {
        scheme: Scheme,
        region: &'static str,
        length: usize,
        capacity: usize,
    },
    #[error("{scheme} scheme does not support chain type {chain}")]
    UnsupportedChain { scheme: Scheme, chain: ChainType },
    #[error("Sequence {0} has no numbering to convert")]
    NotNumbered(String),
    #[error("Only IMGT numberings can be converted, this one is numbered with the {0} scheme")]
    NotCanonical(Scheme),
    #[error("IMGT position {0} is outside the canonical numbering")]
    OutOfRange(u16),
}
