//! Language sequencer: which language governs the next instruction.
//!
//! The stack's top frame is the active language. A frame with a
//! non-zero countdown governs that many instructions and then pops;
//! a zero countdown is indefinite. The current language is derived
//! lazily, once per instruction: `advance()` drops the cached value
//! and the next `current()` takes one down from the top frame.

use std::rc::Rc;

use rdis_core::Lang;

/// One activation of a language.
#[derive(Debug, Clone)]
pub struct Frame {
    pub countdown: u32,
    pub lang: Rc<Lang>,
}

impl Frame {
    /// An activation with the language's own default countdown.
    pub fn new(lang: Rc<Lang>) -> Frame {
        Frame {
            countdown: lang.default_countdown(),
            lang,
        }
    }

    /// Decrement an active countdown; true if it has run out.
    fn take_one_down(&mut self) -> bool {
        if self.countdown == 0 {
            return false;
        }
        self.countdown -= 1;
        self.countdown == 0
    }
}

pub struct LangSequencer {
    stack: Vec<Frame>,
    current: Option<Rc<Lang>>,
    none: Rc<Lang>,
}

impl LangSequencer {
    /// `none` is the terminal sentinel reported once the stack runs
    /// empty.
    pub fn new(none: Rc<Lang>) -> Self {
        Self {
            stack: Vec::new(),
            current: None,
            none,
        }
    }

    /// Replace the whole state with `frames`, bottom first.
    pub fn init(&mut self, frames: Vec<Frame>) {
        self.current = None;
        self.stack = frames;
    }

    /// The language of the instruction being decoded.
    pub fn current(&mut self) -> Rc<Lang> {
        if let Some(lang) = &self.current {
            return Rc::clone(lang);
        }
        let lang = match self.stack.last_mut() {
            Some(top) => {
                let lang = Rc::clone(&top.lang);
                if top.take_one_down() {
                    self.stack.pop();
                }
                lang
            }
            None => Rc::clone(&self.none),
        };
        self.current = Some(Rc::clone(&lang));
        lang
    }

    /// End the sequence after the current instruction.
    pub fn terminate(&mut self) {
        self.stack.clear();
    }

    /// Continue in `lang` with nothing to return to. Activating the
    /// terminal sentinel ends the sequence, as an empty stack does.
    pub fn switch_permanently(&mut self, lang: Rc<Lang>) {
        self.terminate();
        self.switch_temporarily(lang);
    }

    /// Push an activation of `lang` with its default countdown.
    pub fn switch_temporarily(&mut self, lang: Rc<Lang>) {
        self.stack.push(Frame::new(lang));
    }

    pub fn switch_temporarily_with(&mut self, lang: Rc<Lang>, countdown: u32) {
        self.stack.push(Frame { countdown, lang });
    }

    pub fn switch_back(&mut self) {
        self.stack.pop();
    }

    /// Overwrite the top frame's countdown. No-op on an empty stack.
    pub fn set_countdown(&mut self, countdown: u32) {
        if let Some(top) = self.stack.last_mut() {
            top.countdown = countdown;
        }
    }

    /// Move on to the next instruction.
    pub fn advance(&mut self) {
        self.current = None;
    }

    pub fn has_more(&mut self) -> bool {
        !self.current().is_terminal()
    }

    /// Copy of the stack for resuming at a branch target.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.stack.clone()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
