//! Table-driven disassembly engine.
//!
//! Compiled languages from `rdis_core` are run by a small bytecode
//! interpreter. A language sequencer decides which language governs
//! each instruction, and a breadth-first worklist driver follows code
//! from the declared entry points to every reachable instruction.

pub mod api;
pub mod disassembler;
pub mod interp;
pub mod listing;
pub mod sequencer;

pub use api::{Api, ApiError, SequencerEffect};
pub use disassembler::{
    DecipheredInstruction, Disassembler, Format, PendingEntryPoint, Results,
};
pub use interp::{decipher, DecodeContext, DecodeFault};
pub use sequencer::{Frame, LangSequencer};
