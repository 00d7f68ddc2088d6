use crate::keywords;
use crate::token::{Directive, Token, TokenKind};

/// Tokenize VBA module source into a sequence of tokens.
///
/// Tokenizing never fails: text that no rule claims becomes
/// [`TokenKind::Unknown`]. Every input byte lands in exactly one token,
/// so concatenating the token texts reproduces `input`, line endings
/// included.
///
/// The quoted value of an `Attribute VB_Name = "..."` line is split
/// into quote, [`TokenKind::Name`], quote so the module name can be
/// renamed like any other identifier.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Lexer::new(input).tokenize();
    retag_module_name(&mut tokens);
    tokens
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Only blanks since the last line break.
    line_start: bool,
    /// Last non-blank token was a `:` statement separator.
    after_colon: bool,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line_start: true,
            after_colon: false,
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        if self.input.starts_with('\u{FEFF}') {
            self.pos = '\u{FEFF}'.len_utf8();
            tokens.push(Token::new(TokenKind::Space, '\u{FEFF}'));
        }

        while let Some(byte) = self.peek() {
            let token = match byte {
                b'\r' | b'\n' => self.read_newline(),
                b' ' | b'\t' => self.read_space(),
                b'"' => self.read_string(),
                b'\'' => self.read_comment(),
                b'#' if self.line_start => {
                    self.read_directive().unwrap_or_else(|| self.read_unknown())
                }
                b'&' => self.read_radix_literal().unwrap_or_else(|| self.read_unknown()),
                ch if ch.is_ascii_alphabetic() => self.read_word(),
                ch if ch.is_ascii_digit() || ch == b'_' => self.read_literal(),
                _ => self.read_unknown(),
            };

            match token.kind {
                TokenKind::Newline => {
                    self.line_start = true;
                    self.after_colon = false;
                }
                TokenKind::Space => {}
                _ => {
                    self.line_start = false;
                    self.after_colon = token.kind == TokenKind::Unknown && token.text == ":";
                }
            }

            tokens.push(token);
        }

        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn take(&mut self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, &self.input[start..self.pos])
    }

    fn skip_while(&self, mut at: usize, pred: impl Fn(u8) -> bool) -> usize {
        while self.bytes.get(at).is_some_and(|&b| pred(b)) {
            at += 1;
        }
        at
    }

    fn read_newline(&mut self) -> Token {
        let start = self.pos;
        if self.peek() == Some(b'\r') && self.peek_at(1) == Some(b'\n') {
            self.pos += 2;
        } else {
            self.pos += 1;
        }
        self.take(TokenKind::Newline, start)
    }

    /// Blanks, folding any ` _` line continuations into the same token.
    fn read_space(&mut self) -> Token {
        let start = self.pos;
        loop {
            self.pos = self.skip_while(self.pos, is_blank);
            match self.continuation_len() {
                Some(len) => self.pos += len,
                None => break,
            }
        }
        self.take(TokenKind::Space, start)
    }

    /// Length of a continuation at the cursor: `_`, trailing blanks, the
    /// line break and the indentation of the continued line.
    fn continuation_len(&self) -> Option<usize> {
        if self.peek() != Some(b'_') {
            return None;
        }
        let mut end = self.skip_while(self.pos + 1, is_blank);
        match self.bytes.get(end) {
            Some(b'\r') if self.bytes.get(end + 1) == Some(&b'\n') => end += 2,
            Some(b'\r' | b'\n') => end += 1,
            _ => return None,
        }
        end = self.skip_while(end, is_blank);
        Some(end - self.pos)
    }

    /// `"..."` with `""` as an escaped quote. An unterminated literal
    /// stops at the end of the line.
    fn read_string(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1; // opening quote
        loop {
            match self.peek() {
                Some(b'"') if self.peek_at(1) == Some(b'"') => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\r' | b'\n') | None => break,
                Some(_) => self.pos += 1,
            }
        }
        self.take(TokenKind::String, start)
    }

    fn read_comment(&mut self) -> Token {
        let start = self.pos;
        self.pos = self.skip_while(self.pos, |b| b != b'\r' && b != b'\n');
        self.take(TokenKind::Comment, start)
    }

    /// `#If`, `#ElseIf`, `#Else`, `#End If` or `#EndIf`, blanks allowed
    /// after `#` and between `End` and `If`.
    fn read_directive(&mut self) -> Option<Token> {
        let (word, mut end) = self.word_at(self.skip_while(self.pos + 1, is_blank))?;
        let directive = match word.to_ascii_lowercase().as_str() {
            "if" => Directive::If,
            "elseif" => Directive::ElseIf,
            "else" => Directive::Else,
            "endif" => Directive::EndIf,
            "end" => {
                let (word, if_end) = self.word_at(self.skip_while(end, is_blank))?;
                if !word.eq_ignore_ascii_case("if") {
                    return None;
                }
                end = if_end;
                Directive::EndIf
            }
            _ => return None,
        };
        let start = self.pos;
        self.pos = end;
        Some(self.take(TokenKind::Conditional(directive), start))
    }

    /// Identifier starting at byte `at`, with the index just past it.
    fn word_at(&self, at: usize) -> Option<(&'a str, usize)> {
        if !self.bytes.get(at)?.is_ascii_alphabetic() {
            return None;
        }
        let end = self.skip_while(at, is_word_byte);
        Some((&self.input[at..end], end))
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        self.pos = self.skip_while(self.pos, is_word_byte);
        let word = &self.input[start..self.pos];

        if (self.line_start || self.after_colon)
            && word.eq_ignore_ascii_case("rem")
            && self.peek().is_none_or(|b| is_blank(b) || b == b'\r' || b == b'\n')
        {
            self.pos = self.skip_while(self.pos, |b| b != b'\r' && b != b'\n');
            return self.take(TokenKind::Comment, start);
        }

        if keywords::is_reserved(word) {
            self.take(TokenKind::Reserved, start)
        } else {
            self.take(TokenKind::Name, start)
        }
    }

    /// Numbers and other word runs that cannot start an identifier.
    fn read_literal(&mut self) -> Token {
        let start = self.pos;
        self.pos = self.skip_while(self.pos, is_word_byte);
        self.take(TokenKind::Unknown, start)
    }

    /// `&HFF`, `&O17` and their `&` type-suffixed forms.
    fn read_radix_literal(&mut self) -> Option<Token> {
        let digits: fn(u8) -> bool = match self.peek_at(1)? {
            b'h' | b'H' => |b| b.is_ascii_hexdigit(),
            b'o' | b'O' => |b| (b'0'..=b'7').contains(&b),
            _ => return None,
        };
        if !self.peek_at(2).is_some_and(digits) {
            return None;
        }
        let start = self.pos;
        self.pos = self.skip_while(self.pos + 2, digits);
        if self.peek() == Some(b'&') {
            self.pos += 1;
        }
        Some(self.take(TokenKind::Unknown, start))
    }

    fn read_unknown(&mut self) -> Token {
        let start = self.pos;
        self.pos += self.input[start..].chars().next().map_or(1, char::len_utf8);
        self.take(TokenKind::Unknown, start)
    }
}

const fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split the string of `Attribute VB_Name = "X"` into `"`, `X`, `"`.
fn retag_module_name(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i + 2 < tokens.len() {
        if tokens[i].kind == TokenKind::Reserved
            && tokens[i].is_word("attribute")
            && tokens[i + 1].is_space()
            && tokens[i + 2].kind == TokenKind::Reserved
            && tokens[i + 2].is_word("vb_name")
        {
            let value = tokens[i + 3..]
                .iter()
                .take_while(|t| !t.is_newline())
                .position(|t| t.kind == TokenKind::String)
                .map(|offset| i + 3 + offset);

            if let Some(at) = value {
                let text = &tokens[at].text;
                if text.len() > 2 && text.ends_with('"') {
                    let name = text[1..text.len() - 1].to_string();
                    tokens.splice(
                        at..=at,
                        [
                            Token::new(TokenKind::Unknown, "\""),
                            Token::new(TokenKind::Name, name),
                            Token::new(TokenKind::Unknown, "\""),
                        ],
                    );
                }
            }
        }
        i += 1;
    }
}
