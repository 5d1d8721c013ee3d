//! API vector tables.
//!
//! An API table names the well-known call targets of a platform's
//! firmware whose calls change how the following bytes must be read:
//! a call that never returns, or one that interprets the bytes after
//! it as another language.
//!
//! ```text
//! # ZX Spectrum 48K ROM
//! 0x0008 terminate
//! 0x0028 switch-temporarily zxs-calc
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use rdis_core::hex::parse_unsigned;
use rdis_core::{Lang, LangError, LangRegistry};

use crate::sequencer::LangSequencer;

/// API tables compiled into the crate.
pub static BUILTIN_APIS: &[(&str, &str)] = &[
    ("none", include_str!("../apis/none.api")),
    ("zxs", include_str!("../apis/zxs.api")),
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown API {0:?}")]
    Unknown(String),
    #[error("reading API {name:?}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{api}:{line}: duplicate API vector declaration {text:?}")]
    Duplicate { api: String, line: usize, text: String },
    #[error("{api}:{line}: invalid API vector declaration {text:?}")]
    Malformed { api: String, line: usize, text: String },
    #[error("{api}:{line}: invalid address in API vector declaration {text:?}")]
    BadAddress { api: String, line: usize, text: String },
    #[error("{api}:{line}: unknown language in API vector {text:?}")]
    Lang {
        api: String,
        line: usize,
        text: String,
        #[source]
        source: LangError,
    },
}

/// What a call to an API vector does to the sequence being decoded.
#[derive(Debug, Clone)]
pub enum SequencerEffect {
    Terminate,
    SwitchPermanently(Rc<Lang>),
    SwitchTemporarily(Rc<Lang>),
}

impl SequencerEffect {
    pub fn apply(&self, sequencer: &mut LangSequencer) {
        match self {
            SequencerEffect::Terminate => sequencer.terminate(),
            SequencerEffect::SwitchPermanently(lang) => {
                sequencer.switch_permanently(Rc::clone(lang))
            }
            SequencerEffect::SwitchTemporarily(lang) => {
                sequencer.switch_temporarily(Rc::clone(lang))
            }
        }
    }
}

#[derive(Debug)]
pub struct Api {
    name: String,
    vectors: HashMap<u32, SequencerEffect>,
}

impl Api {
    /// An API with no vectors.
    pub fn empty(name: &str) -> Api {
        Api {
            name: name.to_string(),
            vectors: HashMap::new(),
        }
    }

    /// Parse an API table, resolving its languages through `langs`.
    pub fn parse(
        name: &str,
        source: &str,
        langs: &LangRegistry,
    ) -> Result<Api, ApiError> {
        let mut api = Api::empty(name);
        for (lineno, raw) in source.lines().enumerate() {
            let text = strip_comment(raw).trim();
            if text.is_empty() {
                continue;
            }
            let line = lineno + 1;
            let err_text = text.to_string();
            let fields: Vec<&str> = text.split_whitespace().collect();

            let address = parse_unsigned(fields[0]).ok_or_else(|| {
                ApiError::BadAddress {
                    api: name.to_string(),
                    line,
                    text: err_text.clone(),
                }
            })?;
            if api.vectors.contains_key(&address) {
                return Err(ApiError::Duplicate {
                    api: name.to_string(),
                    line,
                    text: err_text,
                });
            }
            let lang = |lang_name: &str| {
                langs.get(lang_name).map_err(|source| ApiError::Lang {
                    api: name.to_string(),
                    line,
                    text: err_text.clone(),
                    source,
                })
            };
            let effect = match fields[1..] {
                ["terminate"] => SequencerEffect::Terminate,
                ["switch-temporarily", l] => {
                    SequencerEffect::SwitchTemporarily(lang(l)?)
                }
                ["switch-permanently", l] => {
                    SequencerEffect::SwitchPermanently(lang(l)?)
                }
                _ => {
                    return Err(ApiError::Malformed {
                        api: name.to_string(),
                        line,
                        text: err_text.clone(),
                    })
                }
            };
            api.vectors.insert(address, effect);
        }
        debug!(api = name, vectors = api.vectors.len(), "parsed API");
        Ok(api)
    }

    /// Load API `name`, from `<dir>/<name>.api` if `dir` has one,
    /// otherwise from the built-in tables.
    pub fn load(
        name: &str,
        dir: Option<&Path>,
        langs: &LangRegistry,
    ) -> Result<Api, ApiError> {
        if let Some(path) = dir.map(|d| d.join(format!("{name}.api"))) {
            if path.is_file() {
                let source = std::fs::read_to_string(&path).map_err(
                    |source| ApiError::Io {
                        name: name.to_string(),
                        source,
                    },
                )?;
                return Api::parse(name, &source, langs);
            }
        }
        let (_, source) = BUILTIN_APIS
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| ApiError::Unknown(name.to_string()))?;
        Api::parse(name, source, langs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn effect(&self, address: u32) -> Option<&SequencerEffect> {
        self.vectors.get(&address)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}
