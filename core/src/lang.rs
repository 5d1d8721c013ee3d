//! Compiled instruction languages.

use std::fmt;

/// Name of the terminal sentinel language.
pub const NONE: &str = "none";

/// A power-of-two sized string table indexed by a masked value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minitable {
    name: String,
    entries: Vec<String>,
}

impl Minitable {
    /// Returns `None` unless `entries.len()` is a non-zero power of
    /// two.
    pub fn new(name: &str, entries: Vec<String>) -> Option<Minitable> {
        if !entries.len().is_power_of_two() {
            return None;
        }
        Some(Minitable {
            name: name.to_string(),
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Entry at `value mod len`.
    pub fn lookup(&self, value: u32) -> &str {
        &self.entries[value as usize & (self.entries.len() - 1)]
    }
}

/// Per-language minitables and referred language names. Bytecode
/// addresses both by slot index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linkage {
    pub(crate) minitables: Vec<Minitable>,
    pub(crate) referred: Vec<String>,
}

impl Linkage {
    pub fn minitables(&self) -> &[Minitable] {
        &self.minitables
    }

    pub fn minitable(&self, slot: usize) -> &Minitable {
        &self.minitables[slot]
    }

    /// Names of the languages this one refers to, in slot order.
    pub fn referred(&self) -> &[String] {
        &self.referred
    }

    pub fn referred_lang(&self, slot: usize) -> &str {
        &self.referred[slot]
    }
}

/// One instruction language: a 256-entry dispatch table into a shared
/// bytecode buffer, plus its linkage.
pub struct Lang {
    pub(crate) name: String,
    pub(crate) default_countdown: u32,
    pub(crate) trivial: bool,
    pub(crate) terminal: bool,
    pub(crate) dispatch_suboffset: u8,
    pub(crate) dispatch: [Option<u32>; 256],
    pub(crate) program: Vec<u8>,
    pub(crate) linkage: Linkage,
}

impl Lang {
    /// The terminal sentinel. Activating it ends the current
    /// sequence.
    pub fn none() -> Lang {
        Lang {
            name: NONE.to_string(),
            default_countdown: 0,
            trivial: true,
            terminal: true,
            dispatch_suboffset: 0,
            dispatch: [None; 256],
            program: Vec::new(),
            linkage: Linkage::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_countdown(&self) -> u32 {
        self.default_countdown
    }

    /// Trivial languages are not announced by `.switch` lines.
    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn dispatch_suboffset(&self) -> u8 {
        self.dispatch_suboffset
    }

    /// Program start for `opcode`, or `None` if unmapped.
    pub fn entry(&self, opcode: u8) -> Option<usize> {
        self.dispatch[opcode as usize].map(|p| p as usize)
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn linkage(&self) -> &Linkage {
        &self.linkage
    }

    /// Number of mapped opcodes.
    pub fn coverage(&self) -> usize {
        self.dispatch.iter().filter(|d| d.is_some()).count()
    }
}

impl fmt::Debug for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lang")
            .field("name", &self.name)
            .field("default_countdown", &self.default_countdown)
            .field("trivial", &self.trivial)
            .field("coverage", &self.coverage())
            .field("program_len", &self.program.len())
            .finish()
    }
}

/// Language names are lower-case letters, digits and inner hyphens.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
