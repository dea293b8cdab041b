#![allow(dead_code)]
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView2};
use receptor_numbering::shared::vocabulary::{NumberSymbol, END, START};
use receptor_numbering::{
    numbering::number_decoded, ChainType, NumberedSequence, NumberingParameters, ReceptorKind,
    SequenceModel, TargetMask, Vocabulary,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trastuzumab heavy chain variable domain
pub const VH: &str = "EVQLVESGGGLVQPGGSLRLSCAASGFNIKDTYIHWVRQAPGKGLEWVARIYPTNGYTRYADSVKGRFTISADTSKNTAYLQMNSLRAEDTAVYYCSRWGGDGFYAMDYWGQGTLVTVSS";

/// Trastuzumab light chain variable domain
pub const VL: &str = "DIQMTQSPSSLSASVGDRVTITCRASQDVNTAVAWYQQKPGKAPKLLIYSASFLYSGVPSRFSGSRSGTDFTLTISSLQPEDFATYYCQQHYTTPPTFGQGTKVEIK";

/// IMGT numbers of the VH residues
pub fn vh_imgt() -> Vec<u16> {
    let mut n: Vec<u16> = (1..=9).collect();
    n.extend(11..=30);
    n.extend(35..=59);
    n.extend(62..=72);
    n.extend(74..=128);
    n
}

/// IMGT numbers of the VL residues
pub fn vl_imgt() -> Vec<u16> {
    let mut n: Vec<u16> = (1..=29).collect();
    n.extend(36..=57);
    n.extend(65..=72);
    n.extend(74..=80);
    n.extend(83..=109);
    n.extend(114..=127);
    n
}

#[derive(Clone, Copy, Debug)]
pub enum Label {
    N(u16),
    X,
    Skip,
    End,
}

pub fn numbers(numbers: &[u16]) -> Vec<Label> {
    numbers.iter().map(|&n| Label::N(n)).collect()
}

/// Decoded token row: start token, chain marker, then one label per residue.
pub fn decoded_row(vocabulary: &Vocabulary, chain: ChainType, labels: &[Label]) -> Vec<u32> {
    let v = &vocabulary.numbers;
    let mut row = vec![START, v.encode(NumberSymbol::Chain(chain)).unwrap()];
    row.extend(labels.iter().map(|l| match l {
        Label::N(n) => v.encode(NumberSymbol::Number(*n)).unwrap(),
        Label::X => v.encode(NumberSymbol::Insertion).unwrap(),
        Label::Skip => v.encode(NumberSymbol::Skip).unwrap(),
        Label::End => END,
    }));
    row
}

/// Model output for a whole sequence, decoded with every step scored `score`.
pub fn number_script(
    vocabulary: &Vocabulary,
    name: &str,
    residues: &str,
    chain: ChainType,
    labels: &[Label],
    score: f32,
) -> NumberedSequence {
    let tokens = Array1::from(decoded_row(vocabulary, chain, labels));
    let scores = Array1::from_elem(tokens.len(), score);
    let residues: Vec<char> = residues.chars().collect();
    number_decoded(
        name,
        tokens.view(),
        scores.view(),
        &residues,
        &vocabulary.numbers,
        &NumberingParameters::default(),
    )
}

pub fn numbered_vh() -> NumberedSequence {
    let vocabulary = Vocabulary::new(ReceptorKind::Antibody);
    let mut labels = numbers(&vh_imgt());
    labels.push(Label::End);
    number_script(&vocabulary, "vh", VH, ChainType::Heavy, &labels, 20.)
}

pub fn numbered_vl() -> NumberedSequence {
    let vocabulary = Vocabulary::new(ReceptorKind::Antibody);
    let mut labels = numbers(&vl_imgt());
    labels.push(Label::End);
    number_script(&vocabulary, "vl", VL, ChainType::Kappa, &labels, 20.)
}

/// Residue tokens of a sequence, bookended by start and end tokens.
pub fn source_tokens(vocabulary: &Vocabulary, residues: &str) -> Vec<u32> {
    vocabulary.residues.encode("test", residues).0
}

/// A model replaying fixed label streams.
///
/// Rows whose source has a script emit the script one token per step with
/// logit `score`. Any other row emits `<EOS>` straight away, with a logit
/// given by `fallback` (used to rank windows).
pub struct ScriptedModel {
    pub vocab_size: usize,
    pub scripts: HashMap<Vec<u32>, Vec<u32>>,
    pub score: f32,
    pub fallback: Box<dyn Fn(&[u32]) -> f32 + Send + Sync>,
    pub encodes: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(vocabulary: &Vocabulary) -> ScriptedModel {
        ScriptedModel {
            vocab_size: vocabulary.numbers.len(),
            scripts: HashMap::new(),
            score: 20.,
            fallback: Box::new(|_| 1.),
            encodes: AtomicUsize::new(0),
        }
    }

    /// Register the labels the model predicts for `residues`.
    pub fn script(
        &mut self,
        vocabulary: &Vocabulary,
        residues: &str,
        chain: ChainType,
        labels: &[Label],
    ) {
        let source = source_tokens(vocabulary, residues);
        // drop the start token, decode positions start at 1
        let script = decoded_row(vocabulary, chain, labels)[1..].to_vec();
        self.scripts.insert(source, script);
    }

    pub fn encode_calls(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }
}

impl SequenceModel for ScriptedModel {
    type Memory = Array2<u32>;

    fn encode(&self, source: ArrayView2<u32>, _source_mask: ArrayView2<bool>) -> Result<Array2<u32>> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        Ok(source.to_owned())
    }

    fn decode_step(
        &self,
        target: ArrayView2<u32>,
        memory: &Array2<u32>,
        _target_mask: &TargetMask,
        _source_mask: ArrayView2<bool>,
    ) -> Result<Array2<f32>> {
        let step = target.ncols();
        let mut logits = Array2::zeros((memory.nrows(), self.vocab_size));
        for (b, row) in memory.rows().into_iter().enumerate() {
            let source: Vec<u32> = row.iter().copied().filter(|&t| t != 0).collect();
            match self.scripts.get(&source) {
                Some(script) => {
                    let token = script.get(step - 1).copied().unwrap_or(END);
                    logits[[b, token as usize]] = self.score;
                }
                None => logits[[b, END as usize]] = (self.fallback)(&source),
            }
        }
        Ok(logits)
    }
}
