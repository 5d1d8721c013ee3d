//! Language description compiler.
//!
//! A description is line oriented:
//!
//! ```text
//! # comment
//! Dispatch-suboffset: 1
//! Default-countdown: 0
//! Trivial: false
//! r[] b, c, d, e, h, l, (hl), a
//! [0b01??????-0x76] ld <byte 0, shr 3, r>, <byte 0, r>
//! ```
//!
//! Each decipherer line compiles its pattern into the shared program
//! buffer and points every opcode matched by its code set at it.

use tracing::debug;

use crate::bytecode::{
    self, lookup_step, Effect, Operand, Requirement, StepDef,
    StepLookupError, ValueState, COMPLETE, MAX_MINITABLES,
    MAX_REFERRED_LANGS, MAX_SUBOFFSET, MINITABLE_0,
};
use crate::codeset::CodeSet;
use crate::error::{LangError, ParseErrorKind};
use crate::hex::parse_unsigned;
use crate::lang::{is_valid_name, Lang, Linkage, Minitable};

type ParseResult<T> = Result<T, ParseErrorKind>;

struct LangParser {
    dispatch_suboffset: u8,
    default_countdown: u32,
    trivial: bool,
    dispatch: [Option<u32>; 256],
    program: Vec<u8>,
    linkage: Linkage,
}

/// Compile the description `source` of language `name`.
pub fn compile(name: &str, source: &str) -> Result<Lang, LangError> {
    let mut p = LangParser::new();
    for (lineno, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        p.parse_line(line).map_err(|kind| LangError::Parse {
            lang: name.to_string(),
            line: lineno + 1,
            kind,
        })?;
    }
    let lang = p.finish(name);
    debug!(
        lang = name,
        opcodes = lang.coverage(),
        program_len = lang.program().len(),
        "compiled language"
    );
    Ok(lang)
}

impl LangParser {
    fn new() -> Self {
        Self {
            dispatch_suboffset: 0,
            default_countdown: 0,
            trivial: false,
            dispatch: [None; 256],
            program: Vec::new(),
            linkage: Linkage::default(),
        }
    }

    fn finish(self, name: &str) -> Lang {
        Lang {
            name: name.to_string(),
            default_countdown: self.default_countdown,
            trivial: self.trivial,
            terminal: false,
            dispatch_suboffset: self.dispatch_suboffset,
            dispatch: self.dispatch,
            program: self.program,
            linkage: self.linkage,
        }
    }

    fn parse_line(&mut self, line: &str) -> ParseResult<()> {
        if let Some(rest) = line.strip_prefix('[') {
            return self.parse_decipherer(rest);
        }
        if let Some((name, values)) = split_minitable(line) {
            return self.parse_minitable(name, values);
        }
        if let Some((key, value)) = line.split_once(':') {
            return self.parse_header(key.trim(), value.trim());
        }
        Err(ParseErrorKind::Syntax)
    }

    fn parse_header(&mut self, key: &str, value: &str) -> ParseResult<()> {
        let bad = || ParseErrorKind::BadHeader(value.to_string());
        match key {
            "Dispatch-suboffset" => {
                self.dispatch_suboffset = parse_unsigned(value)
                    .filter(|&n| n <= MAX_SUBOFFSET as u32)
                    .ok_or_else(bad)? as u8;
            }
            "Default-countdown" => {
                self.default_countdown = parse_unsigned(value).ok_or_else(bad)?;
            }
            "Trivial" => {
                self.trivial = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(bad()),
                };
            }
            _ => return Err(ParseErrorKind::Syntax),
        }
        Ok(())
    }

    fn parse_minitable(&mut self, name: &str, values: &str) -> ParseResult<()> {
        if self.minitable_slot(name).is_some() {
            return Err(ParseErrorKind::DuplicateMinitable(name.to_string()));
        }
        if self.linkage.minitables.len() >= MAX_MINITABLES {
            return Err(ParseErrorKind::TooManyMinitables);
        }
        let entries: Vec<String> =
            values.split(',').map(|v| v.trim().to_string()).collect();
        if let Some(c) = entries
            .iter()
            .flat_map(|e| e.chars())
            .find(|&c| !c.is_ascii() || !bytecode::is_literal(c as u8))
        {
            return Err(ParseErrorKind::NonPrintable(c));
        }
        let len = entries.len();
        let table = Minitable::new(name, entries).ok_or_else(|| {
            ParseErrorKind::MinitableSize {
                name: name.to_string(),
                len,
            }
        })?;
        self.linkage.minitables.push(table);
        Ok(())
    }

    fn parse_decipherer(&mut self, rest: &str) -> ParseResult<()> {
        let close = rest.find(']').ok_or(ParseErrorKind::UnterminatedCodeSet)?;
        let set = CodeSet::parse(&rest[..close])?;
        let opcodes: Vec<u8> = set.bytes().collect();
        if opcodes.is_empty() {
            return Err(ParseErrorKind::EmptyCodeSet);
        }
        if let Some(&dup) =
            opcodes.iter().find(|&&op| self.dispatch[op as usize].is_some())
        {
            return Err(ParseErrorKind::DuplicateOpcode(dup));
        }

        let start = self.program.len() as u32;
        self.compile_pattern(rest[close + 1..].trim())?;
        self.program.push(COMPLETE);
        for op in opcodes {
            self.dispatch[op as usize] = Some(start);
        }
        Ok(())
    }

    fn compile_pattern(&mut self, pattern: &str) -> ParseResult<()> {
        let mut rest = pattern;
        while let Some(c) = rest.chars().next() {
            if c == '<' {
                let close =
                    rest.find('>').ok_or(ParseErrorKind::UnterminatedStepList)?;
                self.compile_steps(&rest[1..close])?;
                rest = &rest[close + 1..];
            } else {
                if !c.is_ascii() || !bytecode::is_literal(c as u8) {
                    return Err(ParseErrorKind::NonPrintable(c));
                }
                self.program.push(c as u8);
                rest = &rest[1..];
            }
        }
        Ok(())
    }

    /// Compile one `<...>` list, tracking the value register's width
    /// so that ill-typed lists are rejected here rather than at
    /// decode time.
    fn compile_steps(&mut self, list: &str) -> ParseResult<()> {
        let mut state = ValueState::default();
        for raw in list.split(',') {
            let step = raw.trim();
            let (name, arg) = match step.split_once(char::is_whitespace) {
                Some((n, a)) => (n, Some(a.trim())),
                None => (step, None),
            };

            if arg.is_none() {
                if let Some(slot) = self.minitable_slot(name) {
                    if !state.admits(Requirement::Any) {
                        return Err(ParseErrorKind::StepType {
                            step: step.to_string(),
                            state: state.to_string(),
                        });
                    }
                    self.program.push(MINITABLE_0 + slot as u8);
                    state.apply(Effect::Consume);
                    continue;
                }
            }

            let def = lookup_step(name, arg.is_some(), state).map_err(|e| {
                let step = step.to_string();
                match e {
                    StepLookupError::Unknown => {
                        ParseErrorKind::UnknownStep(step)
                    }
                    StepLookupError::OperandForm => {
                        ParseErrorKind::OperandForm { step }
                    }
                    StepLookupError::State => ParseErrorKind::StepType {
                        step,
                        state: state.to_string(),
                    },
                }
            })?;
            self.emit_step(def, arg.unwrap_or_default(), step)?;
            state.apply(def.effect);
        }
        if !state.is_settled() {
            return Err(ParseErrorKind::UnconsumedValue);
        }
        Ok(())
    }

    fn emit_step(
        &mut self,
        def: &StepDef,
        arg: &str,
        step: &str,
    ) -> ParseResult<()> {
        let bad = || ParseErrorKind::BadOperand {
            step: step.to_string(),
        };
        match def.operand {
            Operand::None => self.program.push(def.code),
            Operand::Suboffset => {
                let n = parse_unsigned(arg)
                    .filter(|&n| n <= MAX_SUBOFFSET as u32)
                    .ok_or_else(bad)?;
                self.program.push(def.code + n as u8);
            }
            Operand::Imm8 => {
                let n = parse_unsigned(arg)
                    .filter(|&n| n <= 0xff)
                    .ok_or_else(bad)?;
                self.program.extend([def.code, n as u8]);
            }
            Operand::Imm16 => {
                let n = parse_unsigned(arg)
                    .filter(|&n| n <= 0xffff)
                    .ok_or_else(bad)?;
                self.program.push(def.code);
                self.program.extend((n as u16).to_le_bytes());
            }
            Operand::Lang => {
                if !is_valid_name(arg) {
                    return Err(bad());
                }
                let slot = self.referred_slot(arg)?;
                self.program.push(def.code + slot as u8);
            }
        }
        Ok(())
    }

    fn minitable_slot(&self, name: &str) -> Option<usize> {
        self.linkage
            .minitables
            .iter()
            .position(|t| t.name() == name)
    }

    fn referred_slot(&mut self, lang: &str) -> ParseResult<usize> {
        if let Some(slot) = self.linkage.referred.iter().position(|r| r == lang)
        {
            return Ok(slot);
        }
        if self.linkage.referred.len() >= MAX_REFERRED_LANGS {
            return Err(ParseErrorKind::TooManyReferredLangs);
        }
        self.linkage.referred.push(lang.to_string());
        Ok(self.linkage.referred.len() - 1)
    }
}

/// Split `name[] v1, v2, ...` into its name and value list.
fn split_minitable(line: &str) -> Option<(&str, &str)> {
    let (name, values) = line.split_once("[]")?;
    let name = name.trim();
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then_some((name, values))
}
