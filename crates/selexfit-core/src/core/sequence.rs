use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Character '{0}' is not a valid DNA base (expected A, C, G or T)")]
    InvalidBase(char),

    #[error("Read of length {read_len} is shorter than the motif length {motif_len}")]
    ReadTooShort { read_len: usize, motif_len: usize },

    #[error("Motif length must be at least 1")]
    EmptyMotif,
}

/// A DNA base. The discriminant is the base rank used throughout the
/// indicator encoding (A = 0 is the zero-offset reference base).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Base {
    A = 0,
    C = 1,
    G = 2,
    T = 3,
}

pub const BASES: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

impl Base {
    pub fn from_char(c: char) -> Result<Self, SequenceError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'T' => Ok(Base::T),
            other => Err(SequenceError::InvalidBase(other)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }

    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn complement(self) -> Self {
        BASES[3 - self.rank()]
    }

    pub fn from_rank(rank: usize) -> Option<Self> {
        BASES.get(rank).copied()
    }
}

/// One binding site of a read in sparse indicator form: the offset indices
/// `position * 3 + (base_rank - 1)` of every non-reference base. The layout
/// matches [`EnergyModel`](crate::core::energy::EnergyModel) offset indexing
/// exactly, so scoring reduces to a sparse dot product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSite {
    indices: Vec<usize>,
}

impl EncodedSite {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

/// All binding sites of a fixed-length read: every offset within the read,
/// in both strand orientations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRead {
    sites: Vec<EncodedSite>,
}

impl EncodedRead {
    pub fn sites(&self) -> &[EncodedSite] {
        &self.sites
    }

    /// Number of binding sites in the read (both strands, all offsets).
    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }
}

/// Parses an ACGT string into bases.
pub fn parse_read(s: &str) -> Result<Vec<Base>, SequenceError> {
    s.chars().map(Base::from_char).collect()
}

/// Encodes a read into its binding sites. For each offset the forward
/// subsequence and its reverse complement are encoded; the reverse-complement
/// indices are mirrored and base-complemented so they address the same offset
/// table as the forward strand.
pub fn encode_read(bases: &[Base], motif_len: usize) -> Result<EncodedRead, SequenceError> {
    if motif_len == 0 {
        return Err(SequenceError::EmptyMotif);
    }
    if bases.len() < motif_len {
        return Err(SequenceError::ReadTooShort {
            read_len: bases.len(),
            motif_len,
        });
    }

    let mut sites = Vec::with_capacity(2 * (bases.len() - motif_len + 1));
    for offset in 0..=(bases.len() - motif_len) {
        let subseq = &bases[offset..offset + motif_len];

        let forward = subseq
            .iter()
            .enumerate()
            .filter(|(_, base)| base.rank() != 0)
            .map(|(pos, base)| pos * 3 + base.rank() - 1)
            .collect();
        sites.push(EncodedSite { indices: forward });

        // Reverse complement: complement rank is 3 - rank, so a base whose
        // complement is A (rank 3, i.e. T) contributes no index.
        let reverse = subseq
            .iter()
            .rev()
            .enumerate()
            .filter(|(_, base)| base.rank() != 3)
            .map(|(pos, base)| pos * 3 + 2 - base.rank())
            .collect();
        sites.push(EncodedSite { indices: reverse });
    }

    Ok(EncodedRead { sites })
}

/// Uniform random read, used by the bootstrap estimator and the simulator.
pub fn random_read(len: usize, rng: &mut impl Rng) -> Vec<Base> {
    (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect()
}
