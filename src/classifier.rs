//! Partition a token sequence into typed sections.
//!
//! Four finders propose candidate spans independently: conditional
//! compilation blocks, procedure/enum/type blocks, single-line
//! declarations (`Declare`, `Option`, `Attribute`) and module-level
//! variables/constants. Overlapping candidates are merged, keeping the
//! kind of the earlier one, and every token left over becomes part of an
//! [`SectionKind::Unknown`] section. The result always covers the input
//! exactly once, in order.

use std::fmt;
use std::sync::LazyLock;

use crate::matcher::{Pattern, match_tokens};
use crate::token::{Directive, Token, TokenKind, end_of_line, tokens_to_string};

static PROCEDURE_START: LazyLock<Pattern> = LazyLock::new(|| {
    Pattern::new("[private|public|friend] [static] property|sub|function|enum|type")
});
static DECLARATION: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("[private|public] declare|option|attribute"));
static GLOBAL_VARIABLE: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("private|public|global|dim|static [withevents] .*"));
static GLOBAL_CONST: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("[private|public|global] const .*"));

/// Words that may follow a visibility keyword without starting a variable.
const NOT_A_VARIABLE: &[&str] = &[
    "const", "declare", "enum", "event", "function", "property", "static", "sub", "type",
];

/// Coarse classification of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `Attribute ...` line.
    Attribute,
    /// `Option ...` line.
    Option,
    /// `Declare` of an external procedure.
    Declare,
    /// `Function`, `Sub` or `Property` block.
    Function,
    /// `Enum ... End Enum` block.
    Enum,
    /// `Type ... End Type` block.
    Type,
    /// Top-level `#If ... #End If` block.
    Conditional,
    /// Module-level variable or constant.
    Global,
    /// Anything no finder claimed: blank lines, comments, stray code.
    Unknown,
}

impl SectionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Option => "option",
            Self::Declare => "declare",
            Self::Function => "function",
            Self::Enum => "enum",
            Self::Type => "type",
            Self::Conditional => "#if",
            Self::Global => "global",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open token range `[start, end)` tagged with a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SectionKind,
}

/// A classified, contiguous run of tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tokens: Vec<Token>,
    pub kind: SectionKind,
    /// Origin key of the source the tokens came from.
    pub origin: Option<String>,
    /// The section starts with `Private`.
    pub private: bool,
}

/// Field-by-field update for a [`Section`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionPatch {
    pub kind: Option<SectionKind>,
    pub origin: Option<String>,
    pub private: Option<bool>,
    /// Tokens to put in front of the section's own.
    pub prefix: Option<Vec<Token>>,
}

impl Section {
    #[must_use]
    pub fn new(tokens: Vec<Token>, kind: SectionKind) -> Self {
        let private = tokens.iter().take(2).any(|t| t.is_word("private"));
        Self {
            tokens,
            kind,
            origin: None,
            private,
        }
    }

    /// Apply every field set in `patch`.
    pub fn apply(&mut self, patch: SectionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(origin) = patch.origin {
            self.origin = Some(origin);
        }
        if let Some(private) = patch.private {
            self.private = private;
        }
        if let Some(mut prefix) = patch.prefix {
            prefix.append(&mut self.tokens);
            self.tokens = prefix;
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        tokens_to_string(&self.tokens)
    }
}

/// Classify `tokens` into sections covering the whole input.
#[must_use]
pub fn classify(tokens: &[Token]) -> Vec<Section> {
    classify_spans(tokens)
        .into_iter()
        .map(|span| Section::new(tokens[span.start..span.end].to_vec(), span.kind))
        .collect()
}

/// [`classify`], tagging every section with `origin`.
#[must_use]
pub fn classify_origin(tokens: &[Token], origin: &str) -> Vec<Section> {
    let mut sections = classify(tokens);
    for section in &mut sections {
        section.apply(SectionPatch {
            origin: Some(origin.to_string()),
            ..SectionPatch::default()
        });
    }
    sections
}

/// Classify `tokens` into gap-free, non-overlapping spans.
#[must_use]
pub fn classify_spans(tokens: &[Token]) -> Vec<SectionSpan> {
    let mut candidates = find_conditionals(tokens);
    candidates.extend(find_procedures(tokens));
    candidates.extend(find_declarations(tokens));
    candidates.extend(find_globals(tokens));

    log::trace!(
        "{} candidate sections over {} tokens",
        candidates.len(),
        tokens.len()
    );

    fill_gaps(merge_overlaps(candidates), tokens.len())
}

/// Top-level `#If ... #End If` blocks; nested blocks stay inside.
fn find_conditionals(tokens: &[Token]) -> Vec<SectionSpan> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut open = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Conditional(Directive::If) => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            TokenKind::Conditional(Directive::EndIf) => {
                if depth == 1 {
                    spans.push(SectionSpan {
                        start: open,
                        end: i + 1,
                        kind: SectionKind::Conditional,
                    });
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }

    if depth > 0 {
        log::warn!("unterminated #If starting at token {open} left unclassified");
    }

    spans
}

/// `Function`/`Sub`/`Property`/`Enum`/`Type` through the matching `End`.
fn find_procedures(tokens: &[Token]) -> Vec<SectionSpan> {
    let mut spans = Vec::new();
    let mut from = 0;

    while let Some((start, header_end)) = match_tokens(tokens, &PROCEDURE_START, true)
        .starting_at(from)
        .next()
    {
        let keyword = tokens[header_end - 1].text.to_ascii_lowercase();
        let closer = Pattern::new(&format!("end {keyword}"));
        let Some((_, end)) = match_tokens(tokens, &closer, true)
            .starting_at(header_end)
            .next()
        else {
            break;
        };

        let kind = match keyword.as_str() {
            "enum" => SectionKind::Enum,
            "type" => SectionKind::Type,
            _ => SectionKind::Function,
        };
        spans.push(SectionSpan { start, end, kind });
        from = end;
    }

    spans
}

/// One logical line starting with `Declare`, `Option` or `Attribute`.
fn find_declarations(tokens: &[Token]) -> Vec<SectionSpan> {
    match_tokens(tokens, &DECLARATION, true)
        .map(|(start, end)| {
            let kind = match tokens[end - 1].text.to_ascii_lowercase().as_str() {
                "declare" => SectionKind::Declare,
                "option" => SectionKind::Option,
                _ => SectionKind::Attribute,
            };
            SectionSpan {
                start,
                end: end_of_line(tokens, end),
                kind,
            }
        })
        .collect()
}

/// Module-level `Dim`/`Private`/`Public` variables and constants.
///
/// A variable line is any declarator list after the keyword, so array
/// bounds, several variables and a missing `As` clause all count.
fn find_globals(tokens: &[Token]) -> Vec<SectionSpan> {
    let variables = match_tokens(tokens, &GLOBAL_VARIABLE, true)
        .filter(|&(_, end)| is_variable_name(&tokens[end - 1]));
    let constants = match_tokens(tokens, &GLOBAL_CONST, true);

    variables
        .chain(constants)
        .map(|(start, end)| SectionSpan {
            start,
            end: end_of_line(tokens, end),
            kind: SectionKind::Global,
        })
        .collect()
}

fn is_variable_name(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Name | TokenKind::Reserved)
        && !NOT_A_VARIABLE.iter().any(|word| token.is_word(word))
}

/// Sort by position and fold every overlapping candidate into the one
/// before it.
fn merge_overlaps(mut candidates: Vec<SectionSpan>) -> Vec<SectionSpan> {
    candidates.sort_by_key(|span| (span.start, span.end));

    let mut merged: Vec<SectionSpan> = Vec::with_capacity(candidates.len());
    for span in candidates {
        match merged.last_mut() {
            Some(last) if span.start < last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

fn fill_gaps(spans: Vec<SectionSpan>, len: usize) -> Vec<SectionSpan> {
    let mut out = Vec::with_capacity(spans.len() * 2 + 1);
    let mut pos = 0;

    for span in spans {
        if span.start > pos {
            out.push(SectionSpan {
                start: pos,
                end: span.start,
                kind: SectionKind::Unknown,
            });
        }
        pos = span.end;
        out.push(span);
    }

    if pos < len {
        out.push(SectionSpan {
            start: pos,
            end: len,
            kind: SectionKind::Unknown,
        });
    }

    out
}
