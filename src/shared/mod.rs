//! Data structures shared by the window selector, the decoder and the scheme converter
pub mod errors;
pub mod model;
pub mod numbering;
pub mod parameters;
pub mod utils;
pub mod vocabulary;

pub use errors::{ConversionError, ReconstructionError, Rejection};
pub use model::{SequenceModel, TargetMask};
pub use numbering::{
    Alignment, ChainType, ImgtRegions, Insertion, NumberedResidue, NumberedSequence,
    PositionLabel, CANONICAL_LENGTH, GAP, INSERTION_ALPHABET,
};
pub use parameters::{NumberingParameters, WindowParameters};
pub use vocabulary::{NumberSymbol, ReceptorKind, ResidueSymbol, Vocabulary};
