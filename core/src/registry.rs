//! Compiled language cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;

use crate::compile::compile;
use crate::error::LangError;
use crate::lang::{is_valid_name, Lang, NONE};

/// Language descriptions compiled into the crate.
pub static BUILTIN_LANGS: &[(&str, &str)] = &[
    ("byte", include_str!("../langs/byte.lang")),
    ("lewyde", include_str!("../langs/lewyde.lang")),
    ("z80", include_str!("../langs/z80.lang")),
    ("z80-cb", include_str!("../langs/z80-cb.lang")),
    ("z80-ed", include_str!("../langs/z80-ed.lang")),
    ("z80-dd", include_str!("../langs/z80-dd.lang")),
    ("z80-fd", include_str!("../langs/z80-fd.lang")),
    ("z80-ddcb", include_str!("../langs/z80-ddcb.lang")),
    ("z80-fdcb", include_str!("../langs/z80-fdcb.lang")),
    ("zxs-calc", include_str!("../langs/zxs-calc.lang")),
    ("zxs-condensed", include_str!("../langs/zxs-condensed.lang")),
];

/// Lazily compiled, append-only set of languages.
///
/// A language is compiled on first request and shared as `Rc<Lang>`
/// afterwards. Referred languages are loaded eagerly after the
/// referring one is cached, so a broken reference surfaces when the
/// referring language is first requested, and cycles terminate.
/// A failed request leaves the cache as it was before the request.
pub struct LangRegistry {
    search_path: Vec<PathBuf>,
    sources: RefCell<HashMap<String, String>>,
    cache: RefCell<HashMap<String, Rc<Lang>>>,
}

impl Default for LangRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LangRegistry {
    pub fn new() -> Self {
        let mut cache = HashMap::new();
        cache.insert(NONE.to_string(), Rc::new(Lang::none()));
        Self {
            search_path: Vec::new(),
            sources: RefCell::new(HashMap::new()),
            cache: RefCell::new(cache),
        }
    }

    /// Add a directory of `<name>.lang` files. Directories are searched
    /// in the order added, before the built-in descriptions.
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_path.push(dir.into());
        self
    }

    /// Provide the description of `name` directly. Takes precedence
    /// over the search path; has no effect once `name` is compiled.
    pub fn register_source(&self, name: &str, source: &str) {
        self.sources
            .borrow_mut()
            .insert(name.to_string(), source.to_string());
    }

    /// Names of the built-in languages, `none` included.
    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        std::iter::once(NONE).chain(BUILTIN_LANGS.iter().map(|(n, _)| *n))
    }

    /// Get the compiled language `name`, compiling it and everything
    /// it refers to on first use. On failure, nothing compiled during
    /// the call stays cached.
    pub fn get(&self, name: &str) -> Result<Rc<Lang>, LangError> {
        let mut loaded = Vec::new();
        let result = self.load(name, &mut loaded);
        if result.is_err() {
            let mut cache = self.cache.borrow_mut();
            for name in &loaded {
                cache.remove(name);
            }
        }
        result
    }

    /// Compile `name` and its references, recording each newly cached
    /// name in `loaded`.
    fn load(
        &self,
        name: &str,
        loaded: &mut Vec<String>,
    ) -> Result<Rc<Lang>, LangError> {
        if let Some(lang) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(lang));
        }
        if !is_valid_name(name) {
            return Err(LangError::InvalidName(name.to_string()));
        }
        let source = self.load_source(name)?;
        let lang = Rc::new(compile(name, &source)?);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&lang));
        loaded.push(name.to_string());

        for referred in lang.linkage().referred() {
            if let Err(e) = self.load(referred, loaded) {
                return Err(LangError::Reference {
                    lang: name.to_string(),
                    referred: referred.clone(),
                    source: Box::new(e),
                });
            }
        }
        debug!(lang = name, "loaded language");
        Ok(lang)
    }

    /// Get a language that is known to be loadable, such as one
    /// referred to by an already loaded language.
    ///
    /// # Panics
    ///
    /// If the language cannot be loaded.
    pub fn resolve(&self, name: &str) -> Rc<Lang> {
        match self.get(name) {
            Ok(lang) => lang,
            Err(e) => panic!("language {name:?} vanished: {e}"),
        }
    }

    /// Whether `name` has already been compiled.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.cache.borrow().contains_key(name)
    }

    fn load_source(&self, name: &str) -> Result<String, LangError> {
        if let Some(source) = self.sources.borrow().get(name) {
            return Ok(source.clone());
        }
        for dir in &self.search_path {
            let path = dir.join(format!("{name}.lang"));
            if path.is_file() {
                debug!(lang = name, path = %path.display(), "reading language");
                return std::fs::read_to_string(&path).map_err(|source| {
                    LangError::Io {
                        name: name.to_string(),
                        source,
                    }
                });
            }
        }
        BUILTIN_LANGS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, source)| source.to_string())
            .ok_or_else(|| LangError::Unknown(name.to_string()))
    }
}
