//! Decipherer bytecode interpreter.
//!
//! One call to `decipher` decodes one instruction: it runs the program
//! the language maps the opcode to, appending text to the output and
//! acting on the sequencer. Sub-dispatch recurses with the same base
//! offset and size tracker, so prefix bytes and the bytes of the
//! sub-instruction count towards a single instruction.

use std::rc::Rc;

use thiserror::Error;

use rdis_core::bytecode::{is_literal, Operator};
use rdis_core::hex::{hex_b, hex_w};
use rdis_core::{Lang, LangRegistry, ZxFloat};

use crate::api::Api;
use crate::sequencer::LangSequencer;

/// Recoverable failure to decode one instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFault {
    #[error("unknown {lang} opcode")]
    UnknownOpcode { lang: String },
    #[error("instruction runs past the end of the image")]
    IncompleteInstruction,
}

/// Everything a program can observe or affect while decoding one
/// instruction at `base`.
pub struct DecodeContext<'a> {
    data: &'a [u8],
    origin: u32,
    base: usize,
    size: usize,
    pub sequencer: &'a mut LangSequencer,
    pub langs: &'a LangRegistry,
    pub api: Option<&'a Api>,
    entry_points: Vec<(u32, Rc<Lang>)>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(
        data: &'a [u8],
        origin: u32,
        base: usize,
        sequencer: &'a mut LangSequencer,
        langs: &'a LangRegistry,
        api: Option<&'a Api>,
    ) -> Self {
        Self {
            data,
            origin,
            base,
            size: 0,
            sequencer,
            langs,
            api,
            entry_points: Vec::new(),
        }
    }

    /// Bytes the instruction has fetched so far, counted from `base`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry points noted so far, in the order they were seen.
    pub fn entry_points(&self) -> &[(u32, Rc<Lang>)] {
        &self.entry_points
    }

    pub fn take_entry_points(&mut self) -> Vec<(u32, Rc<Lang>)> {
        std::mem::take(&mut self.entry_points)
    }

    fn fetch(
        &mut self,
        suboffset: usize,
        width: usize,
    ) -> Result<&[u8], DecodeFault> {
        let start = self.base + suboffset;
        let bytes = self
            .data
            .get(start..start + width)
            .ok_or(DecodeFault::IncompleteInstruction)?;
        self.size = self.size.max(suboffset + width);
        Ok(bytes)
    }

    pub fn fetch_byte(&mut self, suboffset: usize) -> Result<u32, DecodeFault> {
        Ok(self.fetch(suboffset, 1)?[0] as u32)
    }

    pub fn fetch_lewyde(
        &mut self,
        suboffset: usize,
    ) -> Result<u32, DecodeFault> {
        let b = self.fetch(suboffset, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]) as u32)
    }

    fn note_entry_point(&mut self, address: u32, lang: Rc<Lang>) {
        self.entry_points.push((address, lang));
    }
}

/// Decode `opcode` in `lang`, appending the rendering to `out`.
///
/// # Panics
///
/// On malformed bytecode or a referred language that cannot be
/// loaded; both are defects of the language tables.
pub fn decipher(
    lang: &Lang,
    opcode: u8,
    ctx: &mut DecodeContext<'_>,
    out: &mut String,
) -> Result<(), DecodeFault> {
    let Some(start) = lang.entry(opcode) else {
        return Err(DecodeFault::UnknownOpcode {
            lang: lang.name().to_string(),
        });
    };
    execute(lang, start, ctx, out)
}

fn execute(
    lang: &Lang,
    start: usize,
    ctx: &mut DecodeContext<'_>,
    out: &mut String,
) -> Result<(), DecodeFault> {
    let program = lang.program();
    let linkage = lang.linkage();
    let mut value: u32 = 0;
    let mut pc = start;
    loop {
        let b = program[pc];
        pc += 1;
        if is_literal(b) {
            out.push(b as char);
            continue;
        }
        let Some(op) = Operator::decode(b) else {
            panic!("bad operator 0x{b:02X} in {} at {}", lang.name(), pc - 1);
        };
        match op {
            Operator::Complete => return Ok(()),
            Operator::Decimal => out.push_str(&value.to_string()),
            Operator::SignedRel => {
                let width = program[pc] as u32;
                pc += 1;
                value = (value as u8 as i8 as i32 as u32)
                    .wrapping_add(ctx.origin)
                    .wrapping_add(ctx.base as u32)
                    .wrapping_add(width);
            }
            Operator::Entry => {
                let current = ctx.sequencer.current();
                ctx.note_entry_point(value, current);
            }
            Operator::SubrEntry => {
                let current = ctx.sequencer.current();
                ctx.note_entry_point(value, current);
                if let Some(effect) = ctx.api.and_then(|a| a.effect(value)) {
                    effect.apply(ctx.sequencer);
                }
            }
            Operator::UnsignedByte => {
                out.push_str("0x");
                out.push_str(&hex_b(value));
            }
            Operator::UnsignedWyde => {
                out.push_str("0x");
                out.push_str(&hex_w(value));
            }
            Operator::SignedByte => {
                let v = value as u8 as i8;
                if v < 0 {
                    out.push('-');
                }
                out.push_str("0x");
                out.push_str(&hex_b(v.unsigned_abs() as u32));
            }
            Operator::SignedWyde => {
                let v = value as u16 as i16;
                if v < 0 {
                    out.push('-');
                }
                out.push_str("0x");
                out.push_str(&hex_w(v.unsigned_abs() as u32));
            }
            Operator::And => {
                let mask = u16::from_le_bytes([program[pc], program[pc + 1]]);
                pc += 2;
                value &= mask as u32;
            }
            Operator::Shr => {
                value = value.checked_shr(program[pc] as u32).unwrap_or(0);
                pc += 1;
            }
            Operator::SetCountdown => {
                ctx.sequencer.set_countdown(program[pc] as u32);
                pc += 1;
            }
            Operator::SwitchBack => ctx.sequencer.switch_back(),
            Operator::Terminate => ctx.sequencer.terminate(),
            Operator::ZxsFloat => {
                let n = ZxFloat::from_condensed(|k| {
                    ctx.fetch_byte(k).map(|b| b as u8)
                })?;
                out.push_str(&n.to_string());
            }
            Operator::Minitable(slot) => {
                out.push_str(linkage.minitable(slot).lookup(value));
            }
            Operator::GetByte(k) => value = ctx.fetch_byte(k as usize)?,
            Operator::GetLewyde(k) => value = ctx.fetch_lewyde(k as usize)?,
            Operator::Dispatch(slot) => {
                let sub = ctx.langs.resolve(linkage.referred_lang(slot));
                decipher(&sub, value as u8, ctx, out)?;
            }
            Operator::TempSwitch(slot) => {
                let next = ctx.langs.resolve(linkage.referred_lang(slot));
                ctx.sequencer.switch_temporarily(next);
            }
            Operator::Switch(slot) => {
                let next = ctx.langs.resolve(linkage.referred_lang(slot));
                ctx.sequencer.switch_permanently(next);
            }
            Operator::EntryIn(slot) => {
                let target = ctx.langs.resolve(linkage.referred_lang(slot));
                ctx.note_entry_point(value, target);
            }
        }
    }
}
