use thiserror::Error;

use crate::codeset::CodeSetError;

/// Failure to load or compile a language description.
///
/// Language descriptions ship with the project, so callers normally
/// treat these as fatal configuration defects.
#[derive(Debug, Error)]
pub enum LangError {
    #[error("unknown language {0:?}")]
    Unknown(String),
    #[error("invalid language name {0:?}")]
    InvalidName(String),
    #[error("reading language {name:?}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{lang}:{line}: {kind}")]
    Parse {
        lang: String,
        line: usize,
        kind: ParseErrorKind,
    },
    #[error("language {lang:?} refers to unusable language {referred:?}")]
    Reference {
        lang: String,
        referred: String,
        #[source]
        source: Box<LangError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unrecognised line")]
    Syntax,
    #[error("bad header value {0:?}")]
    BadHeader(String),
    #[error("minitable {name:?} has {len} entries, not a power of two")]
    MinitableSize { name: String, len: usize },
    #[error("duplicate minitable {0:?}")]
    DuplicateMinitable(String),
    #[error("too many minitables")]
    TooManyMinitables,
    #[error("too many referred languages")]
    TooManyReferredLangs,
    #[error(transparent)]
    CodeSet(#[from] CodeSetError),
    #[error("unterminated code set")]
    UnterminatedCodeSet,
    #[error("code set matches no opcode")]
    EmptyCodeSet,
    #[error("opcode 0x{0:02X} already deciphered")]
    DuplicateOpcode(u8),
    #[error("unterminated step list")]
    UnterminatedStepList,
    #[error("unknown step {0:?}")]
    UnknownStep(String),
    #[error("step {step:?} written with a wrong argument form")]
    OperandForm { step: String },
    #[error("bad operand in step {step:?}")]
    BadOperand { step: String },
    #[error("step {step:?} does not apply to {state}")]
    StepType { step: String, state: String },
    #[error("step list ends with an unconsumed value")]
    UnconsumedValue,
    #[error("non-printable character {0:?} in pattern")]
    NonPrintable(char),
}
