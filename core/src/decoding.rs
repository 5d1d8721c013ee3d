//! Character decodings for the hex dump's character column.
//!
//! Full decoding tables belong to the container-format layer; this
//! module carries the lookup interface and a few built-in tables.

/// One-way byte to character mapping.
pub trait Decoding {
    fn name(&self) -> &str;

    /// Printable character for `code`, or `None`.
    fn decode(&self, code: u8) -> Option<char>;
}

/// Printable 7-bit ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl Decoding for Ascii {
    fn name(&self) -> &str {
        "ascii"
    }

    fn decode(&self, code: u8) -> Option<char> {
        (0x20..=0x7e).contains(&code).then_some(code as char)
    }
}

/// ISO 8859-1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl Decoding for Latin1 {
    fn name(&self) -> &str {
        "latin-1"
    }

    fn decode(&self, code: u8) -> Option<char> {
        match code {
            0x20..=0x7e | 0xa0..=0xff => Some(code as char),
            _ => None,
        }
    }
}

/// ZX Spectrum character set: ASCII with three substitutions.
/// Block graphics and tokens have no single-character rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZxSpectrum;

impl Decoding for ZxSpectrum {
    fn name(&self) -> &str {
        "zx-spectrum"
    }

    fn decode(&self, code: u8) -> Option<char> {
        match code {
            0x5e => Some('\u{2191}'),
            0x60 => Some('\u{a3}'),
            0x7f => Some('\u{a9}'),
            0x20..=0x7e => Some(code as char),
            _ => None,
        }
    }
}

/// Look a built-in decoding up by name. `latin1` is accepted as an
/// alias.
pub fn builtin(name: &str) -> Option<Box<dyn Decoding>> {
    match name.to_ascii_lowercase().as_str() {
        "ascii" => Some(Box::new(Ascii)),
        "latin-1" | "latin1" => Some(Box::new(Latin1)),
        "zx-spectrum" => Some(Box::new(ZxSpectrum)),
        _ => None,
    }
}
