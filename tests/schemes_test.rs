mod common;
use anyhow::Result;
use common::{numbered_vh, numbered_vl, VH, VL};
use receptor_numbering::schemes::tables::{table, KABAT_HEAVY, KABAT_LIGHT};
use receptor_numbering::schemes::cdr::{ascending, symmetric};
use receptor_numbering::{
    build_inward_list, convert, convert_all, imgt_regions, ChainType, ConversionError,
    NumberedResidue, NumberedSequence, PositionLabel, Scheme,
};

fn labels(sequence: &NumberedSequence) -> Vec<String> {
    sequence
        .numbering
        .iter()
        .map(|r| r.label.to_string())
        .collect()
}

fn residue_at(sequence: &NumberedSequence, label: &str) -> Option<char> {
    sequence
        .numbering
        .iter()
        .find(|r| r.label.to_string() == label)
        .map(|r| r.residue)
}

/// Heavy chain with `extra` more residues in CDR3, inserted around 111/112.
fn long_cdr3(extra: usize) -> Result<NumberedSequence> {
    let mut sequence = numbered_vh();
    let at = sequence
        .numbering
        .iter()
        .position(|r| r.label == PositionLabel::plain(112))
        .unwrap();
    let inserted: Vec<NumberedResidue> = build_inward_list(extra, 111, 112)?
        .into_iter()
        .map(|label| NumberedResidue::new(label, 'G'))
        .collect();
    sequence.numbering.splice(at..at, inserted);
    Ok(sequence)
}

#[test]
fn imgt_is_the_identity() -> Result<()> {
    let vh = numbered_vh();
    assert_eq!(convert(&vh, Scheme::Imgt)?, vh);
    Ok(())
}

#[test]
fn kabat_heavy() -> Result<()> {
    let kabat = convert(&numbered_vh(), Scheme::Kabat)?;
    assert_eq!(kabat.alignment.scheme, Scheme::Kabat);
    assert_eq!(kabat.alignment.chain_type, ChainType::Heavy);
    assert_eq!(kabat.numbering.len(), 120);
    assert!(kabat.numbering.iter().all(|r| !r.is_gap()));
    assert_eq!(kabat.observed(), VH);

    assert_eq!(residue_at(&kabat, "52"), Some('Y'));
    assert_eq!(residue_at(&kabat, "52A"), Some('P'));
    assert_eq!(residue_at(&kabat, "82"), Some('M'));
    assert_eq!(residue_at(&kabat, "82A"), Some('N'));
    assert_eq!(residue_at(&kabat, "82B"), Some('S'));
    assert_eq!(residue_at(&kabat, "82C"), Some('L'));
    assert_eq!(residue_at(&kabat, "92"), Some('C'));
    assert_eq!(residue_at(&kabat, "103"), Some('W'));

    let all = labels(&kabat);
    let cdr3 = all.iter().position(|l| l == "95").unwrap();
    assert_eq!(
        all[cdr3..cdr3 + 11],
        ["95", "96", "97", "98", "99", "100", "100A", "100B", "100C", "101", "102"]
    );
    assert_eq!(all.last().map(|l| l.as_str()), Some("113"));
    // the input numbering is left as it was
    assert_eq!(numbered_vh().numbering.len(), 128);
    Ok(())
}

#[test]
fn kabat_light() -> Result<()> {
    let kabat = convert(&numbered_vl(), Scheme::Kabat)?;
    let expected: Vec<String> = (1..=107).map(|n: u16| n.to_string()).collect();
    assert_eq!(labels(&kabat), expected);
    assert_eq!(kabat.observed(), VL);
    assert_eq!(residue_at(&kabat, "23"), Some('C'));
    assert_eq!(residue_at(&kabat, "88"), Some('C'));
    Ok(())
}

#[test]
fn martin_heavy_inserts_after_72() -> Result<()> {
    let martin = convert(&numbered_vh(), Scheme::Martin)?;
    assert_eq!(martin.alignment.scheme, Scheme::Martin);
    assert_eq!(martin.numbering.len(), 120);
    assert_eq!(martin.observed(), VH);
    assert_eq!(residue_at(&martin, "72"), Some('D'));
    assert_eq!(residue_at(&martin, "72A"), Some('T'));
    assert_eq!(residue_at(&martin, "72B"), Some('S'));
    assert_eq!(residue_at(&martin, "72C"), Some('K'));
    assert_eq!(residue_at(&martin, "73"), Some('N'));
    assert_eq!(residue_at(&martin, "82"), Some('L'));
    assert_eq!(residue_at(&martin, "82A"), None);
    assert_eq!(residue_at(&martin, "52A"), Some('P'));
    assert_eq!(residue_at(&martin, "100C"), Some('M'));
    assert_eq!(residue_at(&martin, "103"), Some('W'));

    // Chothia keeps its insertions at 82
    let chothia = convert(&numbered_vh(), Scheme::Chothia)?;
    assert_eq!(residue_at(&chothia, "82A"), Some('N'));
    assert_eq!(residue_at(&chothia, "72A"), None);

    // light chains are numbered alike
    let vl = numbered_vl();
    assert_eq!(
        convert(&vl, Scheme::Martin)?.numbering,
        convert(&vl, Scheme::Chothia)?.numbering
    );
    assert!(std::ptr::eq(
        table(Scheme::Martin, ChainType::Lambda)?,
        table(Scheme::Chothia, ChainType::Lambda)?
    ));
    Ok(())
}

#[test]
fn aho_heavy() -> Result<()> {
    let aho = convert(&numbered_vh(), Scheme::Aho)?;
    let all = labels(&aho);
    assert_eq!(all.len(), 120);
    assert!(aho.numbering.iter().all(|r| !r.label.is_insertion()));
    assert_eq!(all.last().map(|l| l.as_str()), Some("149"));
    assert_eq!(residue_at(&aho, "23"), Some('C'));
    assert_eq!(residue_at(&aho, "106"), Some('C'));

    // CDR1 and CDR3 fill from both ends
    let cdr1 = all.iter().position(|l| l == "27").unwrap();
    assert_eq!(all[cdr1..cdr1 + 8], ["27", "28", "29", "30", "37", "38", "39", "40"]);
    let cdr3 = all.iter().position(|l| l == "107").unwrap();
    assert_eq!(
        all[cdr3..cdr3 + 13],
        ["107", "108", "109", "110", "111", "112", "113", "133", "134", "135", "136", "137", "138"]
    );
    Ok(())
}

#[test]
fn cdr_relabelling() -> Result<()> {
    let deletions = [100, 99, 98];
    let short: Vec<String> = ascending(4, (97, 102), 100, &deletions)
        .unwrap()
        .iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(short, ["97", "98", "101", "102"]);
    let long: Vec<String> = ascending(8, (97, 102), 100, &deletions)
        .unwrap()
        .iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(long, ["97", "98", "99", "100", "100A", "100B", "101", "102"]);
    assert!(ascending(30, (97, 99), 98, &deletions).is_none());

    let odd: Vec<String> = symmetric(5, 1, 10)
        .unwrap()
        .iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(odd, ["1", "2", "3", "9", "10"]);
    assert!(symmetric(11, 1, 10).is_none());
    assert_eq!(symmetric(0, 1, 10), Some(vec![]));
    Ok(())
}

#[test]
fn long_cdr3_is_rejected() -> Result<()> {
    let sequence = long_cdr3(27)?;
    let error = convert(&sequence, Scheme::Kabat).unwrap_err();
    assert_eq!(
        error,
        ConversionError::Cdr3TooLong {
            scheme: Scheme::Kabat,
            length: 40
        }
    );
    assert_eq!(
        error.to_string(),
        "Too many insertions, cannot apply kabat scheme: CDR3 length 40 exceeds 36."
    );

    let converted = convert_all(&[numbered_vh(), sequence], Scheme::Kabat);
    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].numbering.len(), 120);
    assert!(converted[1].numbering.is_empty());
    assert_eq!(converted[1].alignment.chain_type, ChainType::Failed);
    assert_eq!(converted[1].alignment.scheme, Scheme::Kabat);
    assert_eq!(converted[1].alignment.score, 20.);
    assert_eq!(
        converted[1].alignment.error.as_deref(),
        Some("Too many insertions, cannot apply kabat scheme: CDR3 length 40 exceeds 36.")
    );
    Ok(())
}

#[test]
fn aho_cdr3_capacity() -> Result<()> {
    // 33 residues: fits the Kabat insertions, not the 32 Aho slots
    let sequence = long_cdr3(20)?;
    let kabat = convert(&sequence, Scheme::Kabat)?;
    assert_eq!(kabat.numbering.len(), 140);
    assert_eq!(residue_at(&kabat, "100W"), Some('M'));
    assert!(matches!(
        convert(&sequence, Scheme::Aho),
        Err(ConversionError::RegionTooLong {
            scheme: Scheme::Aho,
            region: "cdr3",
            length: 33,
            capacity: 32
        })
    ));
    Ok(())
}

#[test]
fn tcr_chains_only_convert_to_aho() -> Result<()> {
    let mut beta = numbered_vh();
    beta.alignment.chain_type = ChainType::Beta;
    assert_eq!(
        convert(&beta, Scheme::Kabat),
        Err(ConversionError::UnsupportedChain {
            scheme: Scheme::Kabat,
            chain: ChainType::Beta
        })
    );
    assert!(convert(&beta, Scheme::Chothia).is_err());
    let aho = convert(&beta, Scheme::Aho)?;
    assert_eq!(aho.numbering, convert(&numbered_vh(), Scheme::Aho)?.numbering);
    assert_eq!(aho.alignment.chain_type, ChainType::Beta);
    Ok(())
}

#[test]
fn only_imgt_numberings_are_converted() -> Result<()> {
    let kabat = convert(&numbered_vh(), Scheme::Kabat)?;
    assert_eq!(
        convert(&kabat, Scheme::Aho),
        Err(ConversionError::NotCanonical(Scheme::Kabat))
    );
    assert_eq!(
        convert(&kabat, Scheme::Imgt),
        Err(ConversionError::NotCanonical(Scheme::Kabat))
    );

    let converted = convert_all(&[kabat], Scheme::Aho);
    assert!(converted[0].numbering.is_empty());
    assert_eq!(converted[0].alignment.chain_type, ChainType::Failed);
    assert_eq!(
        converted[0].alignment.error.as_deref(),
        Some("Only IMGT numberings can be converted, this one is numbered with the kabat scheme")
    );
    Ok(())
}

#[test]
fn failed_sequences_are_passed_through() -> Result<()> {
    let failed = NumberedSequence::failed("junk", 3.2, "Score less than cut off.");
    assert_eq!(
        convert(&failed, Scheme::Kabat),
        Err(ConversionError::NotNumbered("junk".to_string()))
    );
    assert_eq!(convert_all(&[failed.clone()], Scheme::Chothia), vec![failed]);
    Ok(())
}

#[test]
fn scheme_names() -> Result<()> {
    assert_eq!("Kabat".parse::<Scheme>()?, Scheme::Kabat);
    assert_eq!("aho".parse::<Scheme>()?, Scheme::Aho);
    assert!("honegger".parse::<Scheme>().is_err());
    assert_eq!(Scheme::default(), Scheme::Imgt);
    assert_eq!(serde_json::to_string(&Scheme::Martin)?, r#""martin""#);
    Ok(())
}

#[test]
fn table_layout() -> Result<()> {
    let states = KABAT_HEAVY.state_string();
    assert_eq!(states.len(), 128);
    let expandable: Vec<usize> = states
        .char_indices()
        .filter(|&(_, c)| c == 'I')
        .map(|(i, _)| i + 1)
        .collect();
    assert_eq!(expandable, vec![10, 73, 92, 93, 94]);

    let regions = KABAT_LIGHT.region_string();
    assert_eq!(regions.len(), 128);
    assert!(!regions.contains('?'));
    assert_eq!(&regions[..26], "0".repeat(26));
    assert_eq!(&regions[55..69], "3".repeat(14));
    assert_eq!(&regions[117..], "6".repeat(11));
    Ok(())
}

#[test]
fn imgt_region_split() -> Result<()> {
    let regions = imgt_regions(&numbered_vh().numbering);
    let observed = |part: &[NumberedResidue]| -> String {
        part.iter().filter(|r| !r.is_gap()).map(|r| r.residue).collect()
    };
    assert_eq!(observed(&regions.cdr3), "SRWGGDGFYAMDY");
    assert_eq!(observed(&regions.cdr1), "GFNIKDTY");
    assert_eq!(regions.cdr1.len(), 12);
    assert_eq!(regions.fw4.len(), 11);
    Ok(())
}
