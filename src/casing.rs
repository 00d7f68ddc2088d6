//! Consistent identifier casing across modules.
//!
//! The VBA editor re-cases every occurrence of an identifier project-wide
//! to the spelling it saw last, which makes diffs noisy. [`CasingFixer`]
//! pins each identifier to a single spelling, optionally following a
//! [`CaseStyle`], and restores reserved words to their canonical form.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::keywords;
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind, tokens_to_string};

/// Identifier casing convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    /// `myValue`
    Camel,
    /// `MyValue`
    Pascal,
}

/// A case style name other than `camel` or `pascal`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported case style `{0}`, expected `camel` or `pascal`")]
pub struct UnknownCaseStyle(pub String);

impl FromStr for CaseStyle {
    type Err = UnknownCaseStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "camel" => Ok(Self::Camel),
            "pascal" => Ok(Self::Pascal),
            _ => Err(UnknownCaseStyle(s.to_string())),
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camel => f.write_str("camel"),
            Self::Pascal => f.write_str("pascal"),
        }
    }
}

/// Re-case `name` per `style`.
///
/// Camel case lowers the first character, except for all-caps names like
/// `URL`, which are kept; single characters are always lowered. Pascal
/// case raises the first character.
#[must_use]
pub fn change_case(name: &str, style: CaseStyle) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let rest = chars.as_str();

    match style {
        CaseStyle::Camel if rest.is_empty() => name.to_lowercase(),
        CaseStyle::Camel if name.to_uppercase() == name => name.to_string(),
        CaseStyle::Camel => first.to_lowercase().chain(rest.chars()).collect(),
        CaseStyle::Pascal => first.to_uppercase().chain(rest.chars()).collect(),
    }
}

/// Names from an overrides file: one per line, `#` starts a comment.
#[must_use]
pub fn parse_overrides(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Applies one spelling per identifier across every token stream it sees.
#[derive(Debug, Clone, Default)]
pub struct CasingFixer {
    style: Option<CaseStyle>,
    names: HashMap<String, String>,
}

impl CasingFixer {
    /// Without a style, the first spelling seen for a name wins.
    #[must_use]
    pub fn new(style: Option<CaseStyle>) -> Self {
        Self {
            style,
            names: HashMap::new(),
        }
    }

    /// Pin the spelling of `names`, regardless of style.
    #[must_use]
    pub fn with_overrides<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.names.insert(name.to_lowercase(), name);
        }
        self
    }

    /// The spelling assigned to `name` so far.
    #[must_use]
    pub fn spelling(&self, name: &str) -> Option<&str> {
        self.names.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Re-case `tokens` in place. Returns the number of tokens changed.
    pub fn fix(&mut self, tokens: &mut [Token]) -> usize {
        let mut changed = 0;

        for index in 0..tokens.len() {
            let replacement = match tokens[index].kind {
                TokenKind::Reserved => keywords::canonical(&tokens[index].text).map(str::to_string),
                TokenKind::Name if is_external_name(tokens, index) => None,
                TokenKind::Name => Some(self.name_spelling(&tokens[index].text)),
                _ => None,
            };

            if let Some(text) = replacement {
                if tokens[index].text != text {
                    tokens[index].text = text;
                    changed += 1;
                }
            }
        }

        changed
    }

    /// [`fix`](Self::fix) over source text.
    pub fn fix_source(&mut self, source: &str) -> String {
        let mut tokens = tokenize(source);
        self.fix(&mut tokens);
        tokens_to_string(&tokens)
    }

    fn name_spelling(&mut self, name: &str) -> String {
        let style = self.style;
        self.names
            .entry(name.to_lowercase())
            .or_insert_with(|| style.map_or_else(|| name.to_string(), |s| change_case(name, s)))
            .clone()
    }
}

/// The DLL entry point in `Declare Function <name> Lib`: its case matters
/// to the linker, not to VBA.
fn is_external_name(tokens: &[Token], index: usize) -> bool {
    let before = tokens[..index].iter().rev().find(|t| !t.is_space());
    let after = tokens[index + 1..].iter().find(|t| !t.is_space());

    before.is_some_and(|t| t.is_word("function") || t.is_word("sub"))
        && after.is_some_and(|t| t.is_word("lib"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_style_names() {
        assert_eq!("Camel".parse::<CaseStyle>(), Ok(CaseStyle::Camel));
        assert_eq!("PASCAL".parse::<CaseStyle>(), Ok(CaseStyle::Pascal));
        assert_eq!(
            "snake".parse::<CaseStyle>(),
            Err(UnknownCaseStyle("snake".to_string()))
        );
    }

    #[test]
    fn camel_case_rules() {
        assert_eq!(change_case("MyValue", CaseStyle::Camel), "myValue");
        assert_eq!(change_case("X", CaseStyle::Camel), "x");
        assert_eq!(change_case("URL", CaseStyle::Camel), "URL");
        assert_eq!(change_case("", CaseStyle::Camel), "");
    }

    #[test]
    fn pascal_case_rules() {
        assert_eq!(change_case("myValue", CaseStyle::Pascal), "MyValue");
        assert_eq!(change_case("über", CaseStyle::Pascal), "Über");
    }

    #[test]
    fn overrides_file_format() {
        let names = parse_overrides("# header\nhWnd  # window handle\n\n  URL\n");
        assert_eq!(names, ["hWnd", "URL"]);
    }

    #[test]
    fn first_spelling_wins_without_style() {
        let mut fixer = CasingFixer::new(None);
        assert_eq!(
            fixer.fix_source("dim Total as long\ntotal = TOTAL + 1"),
            "Dim Total As Long\nTotal = Total + 1"
        );
    }

    #[test]
    fn table_persists_across_sources() {
        let mut fixer = CasingFixer::new(Some(CaseStyle::Pascal));
        fixer.fix_source("counter = 1");
        assert_eq!(fixer.spelling("COUNTER"), Some("Counter"));
        assert_eq!(fixer.fix_source("x = counter"), "X = Counter");
    }

    #[test]
    fn overrides_beat_style() {
        let mut fixer = CasingFixer::new(Some(CaseStyle::Pascal)).with_overrides(["hWnd"]);
        assert_eq!(fixer.fix_source("HWND = 0"), "hWnd = 0");
    }

    #[test]
    fn dll_entry_point_is_untouched() {
        let mut fixer = CasingFixer::new(Some(CaseStyle::Pascal));
        let source = "Declare Function sndPlaySound Lib \"winmm\" (ByVal s As String) As Long";
        let mut tokens = tokenize(source);
        assert_eq!(fixer.fix(&mut tokens), 1);
        assert_eq!(
            tokens_to_string(&tokens),
            "Declare Function sndPlaySound Lib \"winmm\" (ByVal S As String) As Long"
        );
    }
}
