use std::path::Path;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, IterMut};

use crate::lexer::tokenize;
use crate::token::Token;

/// Ordered set of source modules keyed by origin.
///
/// Iteration follows insertion order; merge output, provenance markers and
/// option comparison all depend on it. Re-inserting an origin replaces its
/// tokens but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBundle {
    sources: IndexMap<String, Vec<Token>>,
}

impl SourceBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module from source text.
    #[must_use]
    pub fn source(self, origin: impl Into<String>, text: &str) -> Self {
        self.tokens(origin, tokenize(text))
    }

    /// Add an already tokenized module.
    #[must_use]
    pub fn tokens(mut self, origin: impl Into<String>, tokens: Vec<Token>) -> Self {
        self.insert(origin, tokens);
        self
    }

    pub fn insert(&mut self, origin: impl Into<String>, tokens: Vec<Token>) {
        self.sources.insert(origin.into(), tokens);
    }

    #[must_use]
    pub fn get(&self, origin: &str) -> Option<&[Token]> {
        self.sources.get(origin).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Vec<Token>> {
        self.sources.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, String, Vec<Token>> {
        self.sources.iter_mut()
    }
}

/// Whether `origin` names a class module (`.cls`, any case).
#[must_use]
pub fn is_class_module(origin: &str) -> bool {
    Path::new(origin)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cls"))
}

impl IntoIterator for SourceBundle {
    type Item = (String, Vec<Token>);
    type IntoIter = IntoIter<String, Vec<Token>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.into_iter()
    }
}

impl<'a> IntoIterator for &'a SourceBundle {
    type Item = (&'a String, &'a Vec<Token>);
    type IntoIter = Iter<'a, String, Vec<Token>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// Collect `(origin, source text)` pairs, tokenizing each text.
impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for SourceBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (origin, text) in iter {
            bundle.insert(origin, tokenize(text.as_ref()));
        }
        bundle
    }
}
