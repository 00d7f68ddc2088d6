//! Token pattern matching.
//!
//! A pattern is a space-separated list of elements. Each element lists
//! alternatives separated by `|`; wrapping an element in `[...]` makes it
//! optional. Alternatives are compared case-insensitively against the
//! whole token text, except for two wildcards:
//!
//! - `.*` matches any single token that is not a line break,
//! - `\n` matches a line break.
//!
//! Blank tokens between elements are skipped, so
//! `[private|public] sub|function` matches `Private  Function` as well as
//! a bare `Sub`.

use crate::token::{Token, TokenKind};

/// A compiled token pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    alternatives: Vec<Alternative>,
    optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Alternative {
    Any,
    LineBreak,
    Word(String),
}

impl Pattern {
    /// Compile a pattern. An empty pattern never matches.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            elements: pattern.split_whitespace().map(Element::parse).collect(),
        }
    }

    /// Try to match starting exactly at `start`.
    ///
    /// Returns the index one past the last token consumed. A match must
    /// consume at least one token; optional elements that do not match
    /// consume nothing.
    #[must_use]
    pub fn match_at(&self, tokens: &[Token], start: usize) -> Option<usize> {
        let mut pos = start;
        let mut end = None;

        for element in &self.elements {
            pos = skip_spaces(tokens, pos);
            match tokens.get(pos) {
                Some(token) if element.matches(token) => {
                    pos += 1;
                    end = Some(pos);
                }
                _ if element.optional => {}
                _ => return None,
            }
        }

        end
    }
}

impl Element {
    fn parse(source: &str) -> Self {
        let (inner, optional) = source
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .map_or((source, false), |inner| (inner, true));

        Self {
            alternatives: inner
                .split('|')
                .filter(|alt| !alt.is_empty())
                .map(Alternative::parse)
                .collect(),
            optional,
        }
    }

    fn matches(&self, token: &Token) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(token))
    }
}

impl Alternative {
    fn parse(source: &str) -> Self {
        match source {
            ".*" => Self::Any,
            "\\n" => Self::LineBreak,
            word => Self::Word(word.to_ascii_lowercase()),
        }
    }

    fn matches(&self, token: &Token) -> bool {
        match self {
            Self::Any => !token.is_newline(),
            Self::LineBreak => token.is_newline(),
            Self::Word(word) => !token.is_newline() && token.text.eq_ignore_ascii_case(word),
        }
    }
}

fn skip_spaces(tokens: &[Token], mut pos: usize) -> usize {
    while tokens.get(pos).is_some_and(Token::is_space) {
        pos += 1;
    }
    pos
}

/// Whether only blanks separate `index` from the previous line break or
/// from the start of `tokens`.
#[must_use]
pub fn is_line_start(tokens: &[Token], index: usize) -> bool {
    tokens[..index.min(tokens.len())]
        .iter()
        .rev()
        .find(|t| !t.is_space())
        .is_none_or(|t| t.kind == TokenKind::Newline)
}

/// Find all non-overlapping matches of `pattern`, scanning left to right.
///
/// Yields `(start, end)` token index pairs, `end` exclusive. With
/// `on_line_start` a match must begin on the first non-blank token of a
/// line; `start` then points at that token, past the indentation.
#[must_use]
pub const fn match_tokens<'t, 'p>(
    tokens: &'t [Token],
    pattern: &'p Pattern,
    on_line_start: bool,
) -> Matches<'t, 'p> {
    Matches {
        tokens,
        pattern,
        on_line_start,
        pos: 0,
    }
}

/// Iterator returned by [`match_tokens`].
#[derive(Debug, Clone)]
pub struct Matches<'t, 'p> {
    tokens: &'t [Token],
    pattern: &'p Pattern,
    on_line_start: bool,
    pos: usize,
}

impl Matches<'_, '_> {
    /// Begin scanning at token `pos` instead of the start. Line-start
    /// anchoring still looks at the tokens before `pos`.
    #[must_use]
    pub const fn starting_at(mut self, pos: usize) -> Self {
        self.pos = pos;
        self
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.tokens.len() {
            let start = self.pos;
            self.pos += 1;

            if self.tokens[start].is_space()
                || (self.on_line_start && !is_line_start(self.tokens, start))
            {
                continue;
            }

            if let Some(end) = self.pattern.match_at(self.tokens, start) {
                self.pos = end;
                return Some((start, end));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn all(source: &str, pattern: &str, on_line_start: bool) -> Vec<(usize, usize)> {
        let tokens = tokenize(source);
        let pattern = Pattern::new(pattern);
        match_tokens(&tokens, &pattern, on_line_start).collect()
    }

    #[test]
    fn literal_sequence() {
        assert_eq!(all("End Function", "end function", false), [(0, 3)]);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(all("END FUNCTION", "end function", false), [(0, 3)]);
    }

    #[test]
    fn optional_element_may_be_absent() {
        assert_eq!(all("Function F", "[private|public] function", false), [(0, 1)]);
        assert_eq!(
            all("Public Function F", "[private|public] function", false),
            [(0, 3)]
        );
    }

    #[test]
    fn trailing_optional_does_not_extend_end() {
        assert_eq!(all("Dim x As Long", "dim .* as [new]", false), [(0, 5)]);
    }

    #[test]
    fn line_start_anchor_skips_indentation() {
        assert_eq!(all("x\n    Sub Foo", "sub", true), [(3, 4)]);
        assert!(all("Exit Sub", "sub", true).is_empty());
    }

    #[test]
    fn wildcard_does_not_cross_lines() {
        assert!(all("Dim\nx", "dim .*", false).is_empty());
        assert_eq!(all("Dim\nx", "dim \\n .*", false), [(0, 3)]);
    }

    #[test]
    fn matches_do_not_overlap() {
        assert_eq!(all("a a a", "a a", false), [(0, 3)]);
    }

    #[test]
    fn empty_pattern_never_matches() {
        assert!(all("anything", "", false).is_empty());
    }

    #[test]
    fn starting_at_keeps_line_context() {
        let tokens = tokenize("x Sub");
        let pattern = Pattern::new("sub");
        let found: Vec<_> = match_tokens(&tokens, &pattern, true)
            .starting_at(2)
            .collect();
        assert!(found.is_empty());
    }
}
