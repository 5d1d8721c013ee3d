//! Hexadecimal formatting, number parsing and the hex dump.

use std::io::{self, Write};

use crate::decoding::Decoding;

/// Two upper-case hex digits of the low byte.
pub fn hex_b(x: u32) -> String {
    format!("{:02X}", x & 0xff)
}

/// Four upper-case hex digits of the low wyde.
pub fn hex_w(x: u32) -> String {
    format!("{:04X}", x & 0xffff)
}

/// Eight upper-case hex digits (a tetrabyte).
pub fn hex_t(x: u32) -> String {
    format!("{x:08X}")
}

/// Parse `0x1F`, `$1F` or decimal `31`.
pub fn parse_unsigned(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(h) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(h, 16).ok()
    } else if let Some(h) = s.strip_prefix('$') {
        u32::from_str_radix(h, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// How bytes flagged in a dump mask are set apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Flagged bytes are drawn in blue using ANSI escapes.
    Ansi,
    /// Flagged bytes are written in lower-case hex, the rest in
    /// upper case.
    Plain,
}

const ANSI_MASKED: &str = "\x1b[34m";
const ANSI_RESET: &str = "\x1b[0m";

/// Accumulates one dump row, switching between plain and masked
/// rendering only when the mode changes.
struct RowBuilder {
    style: Style,
    line: String,
    masked: bool,
}

impl RowBuilder {
    fn new(style: Style) -> Self {
        Self {
            style,
            line: String::with_capacity(96),
            masked: false,
        }
    }

    fn set_masked(&mut self, masked: bool) {
        if self.masked != masked && self.style == Style::Ansi {
            self.line.push_str(if masked { ANSI_MASKED } else { ANSI_RESET });
        }
        self.masked = masked;
    }

    fn push_str(&mut self, s: &str) {
        if self.masked && self.style == Style::Plain {
            self.line.push_str(&s.to_ascii_lowercase());
        } else {
            self.line.push_str(s);
        }
    }

    fn push(&mut self, c: char) {
        self.line.push(c);
    }

    fn finish(mut self, out: &mut dyn Write) -> io::Result<()> {
        self.set_masked(false);
        writeln!(out, "{}", self.line.trim_end())
    }
}

/// Write a 16-bytes-per-row hex dump of `data` loaded at `origin`.
///
/// Rows are aligned to the origin's 16-byte boundary. When
/// `decoding` is given, a character column follows. Bytes whose
/// `mask` entry is `true` are rendered distinctly per `style`.
pub fn hex_dump(
    data: &[u8],
    origin: u32,
    decoding: Option<&dyn Decoding>,
    mask: Option<&[bool]>,
    style: Style,
    out: &mut dyn Write,
) -> io::Result<()> {
    if data.is_empty() {
        return writeln!(out, "(nothing to dump)");
    }
    let flagged =
        |offset: usize| mask.is_some_and(|m| m.get(offset) == Some(&true));
    let origin = origin as u64;
    let end = origin + data.len() as u64;
    let mut row = origin & !0xf;
    while row < end {
        let mut rb = RowBuilder::new(style);
        rb.push_str(&hex_t(row as u32));
        rb.push(':');
        for col in 0..16u64 {
            rb.push(' ');
            if col & 3 == 0 {
                rb.push(' ');
            }
            let addr = row + col;
            if addr >= origin && addr < end {
                let offset = (addr - origin) as usize;
                rb.set_masked(flagged(offset));
                rb.push_str(&hex_b(data[offset] as u32));
            } else {
                rb.set_masked(false);
                rb.push_str("  ");
            }
        }
        rb.set_masked(false);
        if let Some(decoding) = decoding {
            rb.push_str("  ");
            for col in 0..16u64 {
                let addr = row + col;
                if addr < origin {
                    rb.push(' ');
                } else if addr < end {
                    let offset = (addr - origin) as usize;
                    rb.set_masked(flagged(offset));
                    rb.push(decoding.decode(data[offset]).unwrap_or('.'));
                } else {
                    break;
                }
            }
        }
        rb.finish(out)?;
        row += 16;
    }
    Ok(())
}
