pub mod bytecode;
pub mod codeset;
pub mod compile;
pub mod decoding;
pub mod dump;
pub mod error;
pub mod hex;
pub mod lang;
pub mod registry;
pub mod zxfloat;

pub use codeset::{CodeSet, CodeSetError};
pub use compile::compile;
pub use decoding::Decoding;
pub use dump::dump_lang;
pub use error::{LangError, ParseErrorKind};
pub use lang::{Lang, Linkage, Minitable, NONE};
pub use registry::LangRegistry;
pub use zxfloat::ZxFloat;
