/// Conditional-compilation directive recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `#If`
    If,
    /// `#ElseIf`
    ElseIf,
    /// `#Else`
    Else,
    /// `#End If` (also `#EndIf`)
    EndIf,
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier that is not a reserved word.
    Name,
    /// Reserved VBA keyword (matched case-insensitively).
    Reserved,
    /// Double-quoted string literal, quotes included.
    String,
    /// `'` or `Rem` comment up to (not including) the line break.
    Comment,
    /// Blanks, line continuations and a leading byte order mark.
    Space,
    /// Line break, keeping its original `\n`, `\r\n` or `\r` text.
    Newline,
    /// `#If`, `#ElseIf`, `#Else` or `#End If`.
    Conditional(Directive),
    /// Anything else: operators, punctuation, numeric literals.
    Unknown,
}

/// A single token with its kind and exact source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// True for a name or reserved word spelled `word`, ignoring case.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Name | TokenKind::Reserved)
            && self.text.eq_ignore_ascii_case(word)
    }

    #[must_use]
    pub const fn is_space(&self) -> bool {
        matches!(self.kind, TokenKind::Space)
    }

    #[must_use]
    pub const fn is_newline(&self) -> bool {
        matches!(self.kind, TokenKind::Newline)
    }
}

/// Concatenate token texts back into source text.
#[must_use]
pub fn tokens_to_string(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Index one past the newline that ends the logical line containing
/// `from`, or `tokens.len()` on the last line.
#[must_use]
pub fn end_of_line(tokens: &[Token], from: usize) -> usize {
    tokens
        .iter()
        .skip(from)
        .position(Token::is_newline)
        .map_or(tokens.len(), |offset| from + offset + 1)
}
