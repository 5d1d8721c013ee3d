//! ZX Spectrum five-byte floating-point numbers.
//!
//! The first byte is the exponent biased by 128; the remaining four
//! hold the significand big-endian, with the sign in place of its
//! always-set top bit. A zero exponent marks the small-integer form:
//! a sign byte (`0x00` or `0xFF`) and a little-endian wyde.
//!
//! The ROM calculator stores literals in a condensed form: the top two
//! bits of the first byte give the significand length less one, the
//! low six bits the exponent less 0x50. A zero exponent field means
//! the exponent follows in its own byte.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZxFloat(pub [u8; 5]);

impl ZxFloat {
    /// Expand a condensed literal, reading its bytes through `fetch`
    /// by offset from the start of the literal.
    pub fn from_condensed<E>(
        mut fetch: impl FnMut(usize) -> Result<u8, E>,
    ) -> Result<ZxFloat, E> {
        let first = fetch(0)?;
        let significand_len = (first >> 6) as usize + 1;
        let (exponent, start) = match first & 0x3f {
            0 => (fetch(1)?, 2),
            e => (e, 1),
        };
        let mut bytes = [0u8; 5];
        // wraps for the small-integer form: 0xB0 + 0x50 is 0x00
        bytes[0] = exponent.wrapping_add(0x50);
        for i in 0..significand_len {
            bytes[i + 1] = fetch(start + i)?;
        }
        Ok(ZxFloat(bytes))
    }

    pub fn value(&self) -> f64 {
        let [exponent, b1, b2, b3, b4] = self.0;
        if exponent == 0 {
            let magnitude = u16::from_le_bytes([b2, b3]) as i32;
            return match b1 {
                0xff => (magnitude - 0x10000) as f64,
                _ => magnitude as f64,
            };
        }
        let significand = u32::from_be_bytes([b1 | 0x80, b2, b3, b4]) as f64;
        let value = significand * 2f64.powi(exponent as i32 - 128 - 32);
        if b1 & 0x80 != 0 {
            -value
        } else {
            value
        }
    }
}

impl fmt::Display for ZxFloat {
    /// Plain decimal for moderate magnitudes, scientific otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.value();
        let magnitude = v.abs();
        if v == 0.0 || (1e-5..1e16).contains(&magnitude) {
            write!(f, "{v}")
        } else {
            write!(f, "{v:e}")
        }
    }
}
