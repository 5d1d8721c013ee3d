//! Opcode sets for decipherer declarations.
//!
//! A `CodeSet` selects the opcode values that share one compiled
//! program. Patterns work like IPv4 netaddr/netmask pairs written
//! digit by digit: `0x4?` is every value whose high nibble is 4,
//! `0b01???110` fixes five bits, and `-` subtracts further patterns
//! from the first one (`0b01??????-0x76`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeSetError {
    #[error("invalid masked value {0:?}: unknown radix prefix")]
    BadPrefix(String),
    #[error("invalid masked value {0:?}: no digits")]
    NoDigits(String),
    #[error("invalid masked value {value:?}: bad digit {digit:?}")]
    BadDigit { value: String, digit: char },
}

/// Predicate over opcode values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSet {
    /// Matches `candidate & mask == bits`.
    Masked { bits: u32, mask: u32 },
    /// Matches the left set minus the right set.
    Difference(Box<CodeSet>, Box<CodeSet>),
}

impl CodeSet {
    pub fn matches(&self, candidate: u32) -> bool {
        match self {
            CodeSet::Masked { bits, mask } => candidate & mask == *bits,
            CodeSet::Difference(left, right) => {
                left.matches(candidate) && !right.matches(candidate)
            }
        }
    }

    /// Parse a `-`-separated chain of masked values, folding them
    /// left to right into differences.
    pub fn parse(s: &str) -> Result<CodeSet, CodeSetError> {
        let mut terms = s.split('-');
        // split() always yields at least one item
        let first = terms.next().unwrap_or_default();
        let mut set = parse_masked(first.trim())?;
        for term in terms {
            let right = parse_masked(term.trim())?;
            set = CodeSet::Difference(Box::new(set), Box::new(right));
        }
        Ok(set)
    }

    /// All byte values in the set, ascending.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&b| self.matches(b as u32))
    }
}

fn parse_masked(s: &str) -> Result<CodeSet, CodeSetError> {
    let (digits, width, radix) = if let Some(d) = s.strip_prefix("0x") {
        (d, 4, 16)
    } else if let Some(d) = s.strip_prefix("0o") {
        (d, 3, 8)
    } else if let Some(d) = s.strip_prefix("0b") {
        (d, 1, 2)
    } else {
        return Err(CodeSetError::BadPrefix(s.to_string()));
    };

    // Bits above the written digits stay in the mask, so they must
    // be zero in the candidate.
    let mut bits: u32 = 0;
    let mut mask: u32 = !0;
    let mut seen = false;
    for c in digits.chars() {
        match c {
            '_' => continue,
            '?' => {
                bits <<= width;
                mask <<= width;
            }
            _ => {
                let d = c.to_digit(radix).ok_or_else(|| {
                    CodeSetError::BadDigit {
                        value: s.to_string(),
                        digit: c,
                    }
                })?;
                bits = (bits << width) | d;
                mask = (mask << width) | ((1 << width) - 1);
            }
        }
        seen = true;
    }
    if !seen {
        return Err(CodeSetError::NoDigits(s.to_string()));
    }
    Ok(CodeSet::Masked { bits, mask })
}
