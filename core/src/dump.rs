//! Language dump: human-readable text output for a compiled `Lang`.
//!
//! The header lines use the description syntax so the output reads
//! like the source it was compiled from. Each mapped opcode shows its
//! program with literal text inline and operators as `<0x..>` groups.
//! Where a program fetches the dispatch byte and feeds it straight
//! into a minitable, the lookup is resolved for that opcode.

use std::io::{self, Write};

use crate::bytecode::{is_literal, Operator, COMPLETE, GET_BYTE_0};
use crate::decoding::Ascii;
use crate::hex::{hex_b, hex_dump, Style};
use crate::lang::Lang;

/// Dump `lang` to the given writer.
pub fn dump_lang(lang: &Lang, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "# {} is a tabular language", lang.name())?;
    writeln!(w, "Dispatch-suboffset: {}", lang.dispatch_suboffset())?;
    writeln!(w, "Default-countdown: {}", lang.default_countdown())?;
    if lang.is_trivial() {
        writeln!(w, "Trivial: true")?;
    }
    for table in lang.linkage().minitables() {
        writeln!(w, "{}[] {}", table.name(), table.entries().join(", "))?;
    }
    for (slot, name) in lang.linkage().referred().iter().enumerate() {
        writeln!(w, "# referred lang {slot} is {name}")?;
    }

    let mut buf = String::with_capacity(128);
    for opcode in 0..=u8::MAX {
        if opcode & 0x0f == 0 {
            writeln!(w)?;
        }
        match lang.entry(opcode) {
            Some(start) => {
                buf.clear();
                fmt_program(lang, opcode, start, &mut buf);
                writeln!(w, "0x{} (@{start}) {buf}", hex_b(opcode as u32))?;
            }
            None => writeln!(w, "0x{} -", hex_b(opcode as u32))?,
        }
    }
    writeln!(w)?;
    hex_dump(lang.program(), 0, Some(&Ascii), None, Style::Plain, w)
}

/// Render the program starting at `start` as `opcode` would run it.
fn fmt_program(lang: &Lang, opcode: u8, start: usize, buf: &mut String) {
    let program = lang.program();
    let dispatch_fetch = GET_BYTE_0 + lang.dispatch_suboffset();
    let mut bracketed = false;
    let mut i = start;
    while i < program.len() {
        let b = program[i];
        if b == COMPLETE {
            break;
        }
        if b == dispatch_fetch {
            if let Some((text, next)) = resolve_lookup(lang, opcode, i + 1) {
                close(buf, &mut bracketed);
                buf.push_str(text);
                i = next;
                continue;
            }
        }
        if is_literal(b) {
            close(buf, &mut bracketed);
            buf.push(b as char);
            i += 1;
            continue;
        }
        let len = Operator::decode(b).map_or(0, Operator::operand_len);
        for &byte in &program[i..(i + 1 + len).min(program.len())] {
            if bracketed {
                buf.push_str(", ");
            } else {
                buf.push('<');
                bracketed = true;
            }
            buf.push_str("0x");
            buf.push_str(&hex_b(byte as u32));
        }
        i += 1 + len;
    }
    close(buf, &mut bracketed);
}

fn close(buf: &mut String, bracketed: &mut bool) {
    if *bracketed {
        buf.push('>');
        *bracketed = false;
    }
}

/// Follow `shr`/`and` steps from `pos` applied to `opcode`; if they
/// end in a minitable lookup, return its entry and the position after
/// the lookup.
fn resolve_lookup(
    lang: &Lang,
    opcode: u8,
    mut pos: usize,
) -> Option<(&str, usize)> {
    let program = lang.program();
    let mut value = opcode as u32;
    loop {
        match Operator::decode(*program.get(pos)?)? {
            Operator::Shr => {
                let n = *program.get(pos + 1)? as u32;
                value = value.checked_shr(n).unwrap_or(0);
                pos += 2;
            }
            Operator::And => {
                let lo = *program.get(pos + 1)? as u32;
                let hi = *program.get(pos + 2)? as u32;
                value &= lo | (hi << 8);
                pos += 3;
            }
            Operator::Minitable(slot) => {
                let table = lang.linkage().minitables().get(slot)?;
                return Some((table.lookup(value), pos + 1));
            }
            _ => return None,
        }
    }
}
