//! Decipherer bytecode.
//!
//! A compiled program is a byte string. Printable ASCII
//! (`0x20..=0x7E`) is literal output; every other byte is an
//! operator, possibly followed by immediate operand bytes. `COMPLETE`
//! ends the program. The encoding is internal to one process and
//! may change between versions.
//!
//! Step names used in language descriptions are resolved through the
//! static `STEPS` table, which also drives the compile-time checking
//! of value widths.

// -- Operators --

pub const COMPLETE: u8 = 0x00;
/// Output the value in decimal.
pub const DECIMAL: u8 = 0x01;
/// Sign-extend the byte value and add the instruction address plus
/// the immediate width.
pub const SIGNEDREL: u8 = 0x02;
/// Note the value as an entry point in the current language.
pub const ENTRY: u8 = 0x04;
/// Like `ENTRY`, then apply the API vector effect, if any.
pub const SUBRENTRY: u8 = 0x05;
pub const UNSIGNED_BYTE: u8 = 0x08;
pub const UNSIGNED_WYDE: u8 = 0x09;
pub const SIGNED_BYTE: u8 = 0x0A;
pub const SIGNED_WYDE: u8 = 0x0B;
/// AND with a 16-bit little-endian immediate.
pub const AND: u8 = 0x0C;
/// Logical shift right by an 8-bit immediate.
pub const SHR: u8 = 0x10;
/// Overwrite the countdown of the sequencer's top frame.
pub const SET_COUNTDOWN: u8 = 0x11;
pub const SWITCH_BACK: u8 = 0x12;
/// Stop the sequence once the current instruction completes.
pub const TERMINATE: u8 = 0x13;
/// Render the ZX Spectrum condensed float at the instruction base.
pub const ZXS_FLOAT: u8 = 0x14;

pub const MINITABLE_0: u8 = 0x18;
pub const MAX_MINITABLES: usize = 8;

pub const GET_BYTE_0: u8 = 0x80;
pub const GET_LEWYDE_0: u8 = 0x88;
pub const MAX_SUBOFFSET: u8 = 7;

pub const DISPATCH_0: u8 = 0xA0;
pub const TEMPSWITCH_0: u8 = 0xA8;
pub const SWITCH_0: u8 = 0xB0;
pub const ENTRY_0: u8 = 0xB8;
pub const MAX_REFERRED_LANGS: usize = 8;

pub fn is_literal(b: u8) -> bool {
    (0x20..=0x7e).contains(&b)
}

/// Decoded view of one operator byte. Linked operators carry their
/// linkage slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Complete,
    Decimal,
    SignedRel,
    Entry,
    SubrEntry,
    UnsignedByte,
    UnsignedWyde,
    SignedByte,
    SignedWyde,
    And,
    Shr,
    SetCountdown,
    SwitchBack,
    Terminate,
    ZxsFloat,
    Minitable(usize),
    GetByte(u8),
    GetLewyde(u8),
    Dispatch(usize),
    TempSwitch(usize),
    Switch(usize),
    EntryIn(usize),
}

impl Operator {
    pub fn decode(b: u8) -> Option<Operator> {
        let op = match b {
            COMPLETE => Operator::Complete,
            DECIMAL => Operator::Decimal,
            SIGNEDREL => Operator::SignedRel,
            ENTRY => Operator::Entry,
            SUBRENTRY => Operator::SubrEntry,
            UNSIGNED_BYTE => Operator::UnsignedByte,
            UNSIGNED_WYDE => Operator::UnsignedWyde,
            SIGNED_BYTE => Operator::SignedByte,
            SIGNED_WYDE => Operator::SignedWyde,
            AND => Operator::And,
            SHR => Operator::Shr,
            SET_COUNTDOWN => Operator::SetCountdown,
            SWITCH_BACK => Operator::SwitchBack,
            TERMINATE => Operator::Terminate,
            ZXS_FLOAT => Operator::ZxsFloat,
            0x18..=0x1f => Operator::Minitable((b - MINITABLE_0) as usize),
            0x80..=0x87 => Operator::GetByte(b - GET_BYTE_0),
            0x88..=0x8f => Operator::GetLewyde(b - GET_LEWYDE_0),
            0xa0..=0xa7 => Operator::Dispatch((b - DISPATCH_0) as usize),
            0xa8..=0xaf => Operator::TempSwitch((b - TEMPSWITCH_0) as usize),
            0xb0..=0xb7 => Operator::Switch((b - SWITCH_0) as usize),
            0xb8..=0xbf => Operator::EntryIn((b - ENTRY_0) as usize),
            _ => return None,
        };
        Some(op)
    }

    /// Number of immediate bytes following the operator.
    pub fn operand_len(self) -> usize {
        match self {
            Operator::And => 2,
            Operator::SignedRel | Operator::Shr | Operator::SetCountdown => 1,
            _ => 0,
        }
    }
}

// -- Step table --

/// What a step expects of the value register at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// No value, or one that has already been consumed.
    Settled,
    /// A value of any width.
    Any,
    /// A value of exactly this width in bytes.
    Width(u8),
}

/// What a step does to the value register at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Load a fresh value of the given width.
    Fetch(u8),
    /// Modify the value, optionally changing its width.
    Transform(Option<u8>),
    /// Use the value for output or control.
    Consume,
    /// Act on the sequencer; the value is left alone.
    Control,
}

/// How a step's argument is written and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    /// Sub-offset `0..=MAX_SUBOFFSET`, added to the opcode.
    Suboffset,
    /// One immediate byte after the opcode.
    Imm8,
    /// Two immediate bytes (little-endian) after the opcode.
    Imm16,
    /// A language name, resolved to a linkage slot added to the
    /// opcode.
    Lang,
}

/// Static definition of a decipherer step.
#[derive(Debug, Clone, Copy)]
pub struct StepDef {
    pub name: &'static str,
    pub code: u8,
    pub operand: Operand,
    pub requires: Requirement,
    pub effect: Effect,
}

const fn step(
    name: &'static str,
    code: u8,
    operand: Operand,
    requires: Requirement,
    effect: Effect,
) -> StepDef {
    StepDef {
        name,
        code,
        operand,
        requires,
        effect,
    }
}

use Effect::{Consume, Control, Fetch, Transform};
use Requirement::{Any, Settled, Width};

/// Every named step. A name may appear more than once; the first
/// entry whose operand form and requirement fit is chosen, which is
/// how `unsigned` picks the byte or wyde variant.
pub static STEPS: &[StepDef] = &[
    step("byte", GET_BYTE_0, Operand::Suboffset, Settled, Fetch(1)),
    step("lewyde", GET_LEWYDE_0, Operand::Suboffset, Settled, Fetch(2)),
    step("shr", SHR, Operand::Imm8, Any, Transform(None)),
    step("and", AND, Operand::Imm16, Any, Transform(None)),
    step("signedrel", SIGNEDREL, Operand::Imm8, Width(1), Transform(Some(2))),
    step("unsigned", UNSIGNED_BYTE, Operand::None, Width(1), Consume),
    step("unsigned", UNSIGNED_WYDE, Operand::None, Width(2), Consume),
    step("signed", SIGNED_BYTE, Operand::None, Width(1), Consume),
    step("signed", SIGNED_WYDE, Operand::None, Width(2), Consume),
    step("decimal", DECIMAL, Operand::None, Any, Consume),
    step("entry", ENTRY, Operand::None, Any, Consume),
    step("entry", ENTRY_0, Operand::Lang, Any, Consume),
    step("subrentry", SUBRENTRY, Operand::None, Any, Consume),
    step("dispatch", DISPATCH_0, Operand::Lang, Width(1), Consume),
    step("tempswitch", TEMPSWITCH_0, Operand::Lang, Settled, Control),
    step("switch", SWITCH_0, Operand::Lang, Settled, Control),
    step("set-countdown", SET_COUNTDOWN, Operand::Imm8, Settled, Control),
    step("switchback", SWITCH_BACK, Operand::None, Settled, Control),
    step("terminate", TERMINATE, Operand::None, Settled, Control),
    step("zxs-float", ZXS_FLOAT, Operand::None, Settled, Control),
];

/// Compile-time view of the value register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueState {
    /// Width in bytes; zero when nothing has been fetched.
    pub width: u8,
    pub consumed: bool,
}

impl ValueState {
    pub fn is_settled(self) -> bool {
        self.width == 0 || self.consumed
    }

    pub fn admits(self, req: Requirement) -> bool {
        match req {
            Requirement::Settled => self.is_settled(),
            Requirement::Any => self.width != 0,
            Requirement::Width(w) => self.width == w,
        }
    }

    pub fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Fetch(w) => {
                self.width = w;
                self.consumed = false;
            }
            Effect::Transform(w) => {
                if let Some(w) = w {
                    self.width = w;
                }
                self.consumed = false;
            }
            Effect::Consume => self.consumed = true,
            Effect::Control => {}
        }
    }
}

impl std::fmt::Display for ValueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.width, self.consumed) {
            (0, _) => write!(f, "no value"),
            (w, true) => write!(f, "consumed {w}-byte value"),
            (w, false) => write!(f, "unconsumed {w}-byte value"),
        }
    }
}

/// Why `lookup_step` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepLookupError {
    Unknown,
    /// The step exists but not with (or without) an argument.
    OperandForm,
    /// The step exists but does not accept the current value.
    State,
}

/// Find the step definition for `name` given whether an argument was
/// written and the current value state.
pub fn lookup_step(
    name: &str,
    has_arg: bool,
    state: ValueState,
) -> Result<&'static StepDef, StepLookupError> {
    let mut named = STEPS.iter().filter(|s| s.name == name).peekable();
    if named.peek().is_none() {
        return Err(StepLookupError::Unknown);
    }
    let mut formed = named
        .filter(|s| (s.operand != Operand::None) == has_arg)
        .peekable();
    if formed.peek().is_none() {
        return Err(StepLookupError::OperandForm);
    }
    formed
        .find(|s| state.admits(s.requires))
        .ok_or(StepLookupError::State)
}
