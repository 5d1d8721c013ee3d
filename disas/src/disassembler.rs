//! Worklist driver.
//!
//! Entry points are queued in discovery order. Each one starts a
//! sequence: instructions are decoded back to back, in whatever
//! language the sequencer selects, until the sequencer runs out or a
//! (offset, language) pair comes up a second time.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt::Write as _;
use std::rc::Rc;

use tracing::{trace, warn};

use rdis_core::decoding::Ascii;
use rdis_core::hex::hex_b;
use rdis_core::{Decoding, Lang, LangRegistry};

use crate::api::Api;
use crate::interp::{decipher, DecodeContext, DecodeFault};
use crate::sequencer::{Frame, LangSequencer};

/// Result tag of decode diagnostics.
pub const TAG_PROBLEM: &str = "!";
/// Result tag of raw fallback renderings.
pub const TAG_FALLBACK: &str = "!!";

/// How the image is loaded and presented.
pub struct Format {
    pub origin: u32,
    pub decoding: Box<dyn Decoding>,
    pub api: Option<Rc<Api>>,
}

impl Format {
    pub fn new(origin: u32) -> Format {
        Format {
            origin,
            decoding: Box::new(Ascii),
            api: None,
        }
    }

    pub fn with_decoding(mut self, decoding: Box<dyn Decoding>) -> Format {
        self.decoding = decoding;
        self
    }

    pub fn with_api(mut self, api: Rc<Api>) -> Format {
        self.api = Some(api);
        self
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::new(0)
    }
}

/// A queued sequence start.
#[derive(Debug, Clone)]
pub struct PendingEntryPoint {
    pub offset: usize,
    pub frames: Vec<Frame>,
}

/// One decoded instruction, or a diagnostic with size zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecipheredInstruction {
    pub size: usize,
    pub text: String,
}

/// Result store: offset, then language tag. `!` and `!!` sort before
/// language names.
pub type Results = BTreeMap<usize, BTreeMap<String, DecipheredInstruction>>;

pub struct Disassembler<'a> {
    data: &'a [u8],
    format: Format,
    langs: &'a LangRegistry,
    sequencer: LangSequencer,
    queue: VecDeque<PendingEntryPoint>,
    processed: HashSet<(usize, String)>,
    deciphered: Results,
    undeciphered: Vec<bool>,
    entry_points: BTreeSet<usize>,
    external: BTreeMap<u32, BTreeSet<String>>,
}

impl<'a> Disassembler<'a> {
    pub fn new(
        data: &'a [u8],
        format: Format,
        langs: &'a LangRegistry,
    ) -> Self {
        Self {
            data,
            format,
            langs,
            sequencer: LangSequencer::new(Rc::new(Lang::none())),
            queue: VecDeque::new(),
            processed: HashSet::new(),
            deciphered: BTreeMap::new(),
            undeciphered: vec![true; data.len()],
            entry_points: BTreeSet::new(),
            external: BTreeMap::new(),
        }
    }

    /// Note that code in `lang` starts at absolute `address`.
    ///
    /// Inside the image the offset becomes a genuine entry point and is
    /// queued unless already decoded in `lang`. Outside it, the address
    /// is kept as an external point of interest. The terminal sentinel
    /// is ignored.
    pub fn note_entry_point(&mut self, address: u32, lang: &Rc<Lang>) {
        if lang.is_terminal() {
            return;
        }
        let offset = address.wrapping_sub(self.format.origin) as usize;
        if offset < self.data.len() {
            self.entry_points.insert(offset);
            if !self.is_processed(offset, lang.name()) {
                trace!(offset, lang = lang.name(), "queued entry point");
                self.queue.push_back(PendingEntryPoint {
                    offset,
                    frames: vec![Frame::new(Rc::clone(lang))],
                });
            }
        } else {
            self.external
                .entry(address)
                .or_default()
                .insert(lang.name().to_string());
        }
    }

    /// Queue a sequence with an explicit sequencer state.
    pub fn enqueue(&mut self, pending: PendingEntryPoint) {
        self.queue.push_back(pending);
    }

    /// Process the queue until it is empty.
    pub fn run(&mut self) {
        while let Some(pending) = self.queue.pop_front() {
            self.sequencer.init(pending.frames);
            let mut offset = pending.offset;
            loop {
                let lang = self.sequencer.current();
                if lang.is_terminal() {
                    break;
                }
                let key = (offset, lang.name().to_string());
                if !self.processed.insert(key) {
                    break;
                }
                match self.decode_one(offset, &lang) {
                    Some(size) => offset += size,
                    None => break,
                }
                self.sequencer.advance();
                if !self.sequencer.has_more() {
                    break;
                }
            }
        }
    }

    /// Decode and record the instruction at `offset`. Returns its size,
    /// or `None` if decoding failed and the sequence must stop.
    fn decode_one(&mut self, offset: usize, lang: &Rc<Lang>) -> Option<usize> {
        let mut text = String::new();
        let mut ctx = DecodeContext::new(
            self.data,
            self.format.origin,
            offset,
            &mut self.sequencer,
            self.langs,
            self.format.api.as_deref(),
        );
        let result = ctx.fetch_byte(0).and_then(|opcode| {
            decipher(lang, opcode as u8, &mut ctx, &mut text)
        });
        let size = ctx.size();
        let found = ctx.take_entry_points();
        for (address, target) in &found {
            self.note_entry_point(*address, target);
        }

        match result {
            Ok(()) => {
                trace!(offset, lang = lang.name(), size, %text, "deciphered");
                self.record(offset, lang.name(), size, text);
                self.mark_deciphered(offset, size);
                Some(size)
            }
            Err(DecodeFault::UnknownOpcode { lang: culprit }) => {
                warn!(offset, lang = %culprit, "unknown opcode");
                let message = format!("unknown {culprit} opcode");
                self.record_problem(offset, &message);
                let mut raw = String::from("byte ");
                let bytes = &self.data[offset..offset + size];
                for (i, b) in bytes.iter().enumerate() {
                    if i != 0 {
                        raw.push_str(", ");
                    }
                    let _ = write!(raw, "0x{}", hex_b(*b as u32));
                }
                self.record(offset, TAG_FALLBACK, size, raw);
                self.mark_deciphered(offset, size);
                None
            }
            Err(DecodeFault::IncompleteInstruction) => {
                warn!(offset, lang = lang.name(), "instruction runs past end");
                self.record_problem(
                    offset,
                    &format!("abrupt end of {} code", lang.name()),
                );
                None
            }
        }
    }

    fn record(&mut self, offset: usize, tag: &str, size: usize, text: String) {
        self.deciphered
            .entry(offset)
            .or_default()
            .insert(tag.to_string(), DecipheredInstruction { size, text });
    }

    fn record_problem(&mut self, offset: usize, message: &str) {
        self.record(offset, TAG_PROBLEM, 0, format!("! {message}"));
    }

    fn mark_deciphered(&mut self, offset: usize, size: usize) {
        for flag in &mut self.undeciphered[offset..offset + size] {
            *flag = false;
        }
    }

    fn is_processed(&self, offset: usize, lang: &str) -> bool {
        self.processed.contains(&(offset, lang.to_string()))
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn langs(&self) -> &LangRegistry {
        self.langs
    }

    pub fn results(&self) -> &Results {
        &self.deciphered
    }

    /// Offsets that some instruction or caller declared as entry
    /// points.
    pub fn entry_points(&self) -> &BTreeSet<usize> {
        &self.entry_points
    }

    /// Referenced addresses outside the image, with the languages
    /// they were referenced in.
    pub fn external_points(&self) -> &BTreeMap<u32, BTreeSet<String>> {
        &self.external
    }

    /// `true` for every byte no decoded instruction covers.
    pub fn undeciphered(&self) -> &[bool] {
        &self.undeciphered
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}
