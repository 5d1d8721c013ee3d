//! Listing printer.
//!
//! ```text
//!           .switch z80
//! 00008000: ld a, 0x05
//!       02: call 0x0008
//!       05: ret
//!
//! External points of interest:
//! 00000008: z80
//! ```

use std::io::{self, Write};

use rdis_core::hex::{hex_b, hex_dump, hex_t, Style};

use crate::disassembler::{Disassembler, TAG_FALLBACK};

const INDENT: &str = "          ";

impl Disassembler<'_> {
    /// Write the listing, the external points of interest and a hex
    /// dump with the bytes no instruction covers set apart.
    pub fn print_results(
        &self,
        out: &mut dyn Write,
        style: Style,
    ) -> io::Result<()> {
        let origin = self.format().origin;
        let mut last_offset = 0usize;
        let mut last_lang: Option<&str> = None;
        for (&offset, insns) in self.results() {
            if offset > last_offset {
                writeln!(out)?;
            }
            for (tag, insn) in insns {
                if offset < last_offset {
                    let back = last_offset - offset;
                    writeln!(out, "{INDENT}! retreat {back}")?;
                }
                if last_lang != Some(tag.as_str())
                    && !tag.starts_with('!')
                    && !self.langs().resolve(tag).is_trivial()
                {
                    writeln!(out, "{INDENT}.switch {tag}")?;
                    last_lang = Some(tag.as_str());
                }

                let address = origin.wrapping_add(offset as u32);
                if self.entry_points().contains(&offset) {
                    write!(out, "{}: ", hex_t(address))?;
                } else {
                    write!(out, "      {}: ", hex_b(address))?;
                }
                if tag == TAG_FALLBACK {
                    write!(out, "{TAG_FALLBACK} ")?;
                }
                writeln!(out, "{}", insn.text)?;
                last_offset = offset + insn.size;
            }
        }

        writeln!(out)?;
        writeln!(out, "External points of interest:")?;
        if self.external_points().is_empty() {
            writeln!(out, "    (none)")?;
        }
        for (address, langs) in self.external_points() {
            let names: Vec<&str> = langs.iter().map(String::as_str).collect();
            writeln!(out, "{}: {}", hex_t(*address), names.join(", "))?;
        }
        writeln!(out)?;
        hex_dump(
            self.data(),
            origin,
            Some(self.format().decoding.as_ref()),
            Some(self.undeciphered()),
            style,
            out,
        )
    }

    /// The listing as a string, without colour.
    pub fn listing(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.print_results(&mut buf, Style::Plain);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
