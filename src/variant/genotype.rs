use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing a genotype string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenotypeError {
    /// Genotype field was empty.
    #[error("empty genotype")]
    Empty,

    /// A call token was neither `.` nor a non-negative integer.
    #[error("malformed allele call '{token}' in genotype '{genotype}'")]
    MalformedToken {
        /// Full genotype string.
        genotype: String,
        /// Offending token.
        token: String,
    },

    /// More than two calls (polyploid genotypes are not modelled).
    #[error("genotype '{genotype}' has {count} allele calls, at most 2 are supported")]
    TooManyCalls {
        /// Full genotype string.
        genotype: String,
        /// Number of calls found.
        count: usize,
    },
}

/// Call made for one allele of a genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlleleCall {
    /// Allele carries the reference sequence.
    Reference,
    /// No call was made.
    NoCall,
    /// Allele carries the alternative at this index (0-based).
    Alt(usize),
}

impl AlleleCall {
    /// Alternative index, when the call names one.
    pub fn alt_index(self) -> Option<usize> {
        match self {
            AlleleCall::Alt(index) => Some(index),
            _ => None,
        }
    }

    fn parse_token(genotype: &str, token: &str) -> Result<Self, GenotypeError> {
        match token {
            "." => Ok(AlleleCall::NoCall),
            "0" => Ok(AlleleCall::Reference),
            _ => token
                .parse::<usize>()
                .ok()
                .filter(|&index| index > 0)
                .map(|index| AlleleCall::Alt(index - 1))
                .ok_or_else(|| GenotypeError::MalformedToken {
                    genotype: genotype.to_string(),
                    token: token.to_string(),
                }),
        }
    }
}

impl fmt::Display for AlleleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlleleCall::Reference => write!(f, "0"),
            AlleleCall::NoCall => write!(f, "."),
            AlleleCall::Alt(index) => write!(f, "{}", index + 1),
        }
    }
}

/// Zygosity of a genome at a locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Zygosity {
    /// No alternative is carried.
    Reference,
    /// Both calls carry the same alternative.
    Homozygous,
    /// The two calls differ and at least one carries an alternative.
    Heterozygous,
    /// A single informative call carries an alternative.
    Hemizygous,
    /// No informative call.
    NoCall,
}

impl Zygosity {
    /// Whether the genome carries at least one alternative.
    pub fn is_variant(self) -> bool {
        matches!(
            self,
            Zygosity::Homozygous | Zygosity::Heterozygous | Zygosity::Hemizygous
        )
    }
}

/// Parsed genotype: one call per allele (one or two).
///
/// Phasing is dropped: `|` is treated exactly like `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genotype {
    calls: [AlleleCall; 2],
    len: usize,
}

impl Genotype {
    /// Parse a genotype string such as `"0/1"`, `"1|1"`, `"./."` or `"1"`.
    pub fn parse(genotype: &str) -> Result<Self, GenotypeError> {
        let trimmed = genotype.trim();
        if trimmed.is_empty() {
            return Err(GenotypeError::Empty);
        }

        let normalized = trimmed.replace('|', "/");
        let tokens: Vec<&str> = normalized.split('/').collect();
        if tokens.len() > 2 {
            return Err(GenotypeError::TooManyCalls {
                genotype: trimmed.to_string(),
                count: tokens.len(),
            });
        }

        let mut calls = [AlleleCall::NoCall; 2];
        for (slot, token) in calls.iter_mut().zip(&tokens) {
            *slot = AlleleCall::parse_token(trimmed, token)?;
        }

        Ok(Self {
            calls,
            len: tokens.len(),
        })
    }

    /// Calls in allele order.
    pub fn calls(&self) -> &[AlleleCall] {
        &self.calls[..self.len]
    }

    /// Number of calls (1 = haploid, 2 = diploid).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: a parsed genotype holds at least one call.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distinct alternative indices carried by this genotype, in call order.
    pub fn alt_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.calls()
            .iter()
            .enumerate()
            .filter_map(move |(i, call)| {
                let index = call.alt_index()?;
                let seen_before = self.calls[..i].iter().any(|c| c.alt_index() == Some(index));
                (!seen_before).then_some(index)
            })
    }

    /// Classify the genotype.
    pub fn zygosity(&self) -> Zygosity {
        let informative: Vec<AlleleCall> = self
            .calls()
            .iter()
            .copied()
            .filter(|call| *call != AlleleCall::NoCall)
            .collect();

        match informative.as_slice() {
            [] => Zygosity::NoCall,
            [AlleleCall::Alt(_)] => Zygosity::Hemizygous,
            [_] => Zygosity::Reference,
            [a, b] if a == b => match a {
                AlleleCall::Alt(_) => Zygosity::Homozygous,
                _ => Zygosity::Reference,
            },
            _ => Zygosity::Heterozygous,
        }
    }
}

impl FromStr for Genotype {
    type Err = GenotypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genotype::parse(s)
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.calls() {
            [only] => write!(f, "{only}"),
            [first, second] => write!(f, "{first}/{second}"),
            _ => Ok(()),
        }
    }
}
