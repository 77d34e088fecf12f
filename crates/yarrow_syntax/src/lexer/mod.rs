//! Lexer for type strings, switch patterns and computed-field expressions.
//!
//! Handles tokenization including:
//! - Identifiers and the `as` keyword
//! - Decimal and hexadecimal integers (arbitrary precision), floats, quoted strings
//! - Operators and punctuation (`**`, `->`, `<`, `?`, ...)
//!
//! ## Notes
//! - Inputs are YAML scalars, so token locations are computed relative to the scalar's own location: the first line
//!   is offset by the scalar's column, later lines start at column 1.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use num_bigint::BigInt;
use num_traits::Num;

use crate::ast::SourceLocation;
use crate::diagnostics::Diagnostic;

/// Tokenize `source`, positioning tokens relative to `base`.
///
/// The token stream always ends with an `Eof` token.
pub fn lex(source: &str, base: &SourceLocation) -> Result<Vec<Token>, Vec<Diagnostic>> {
    Lexer::new(source, base).tokenize()
}

// ============================================================================
// LEXER STATE
// ============================================================================

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    base: &'a SourceLocation,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
    errors: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, base: &'a SourceLocation) -> Self {
        Self {
            chars: source.chars().peekable(),
            base,
            line: 0,
            column: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Diagnostic>> {
        while self.peek().is_some() {
            self.scan_token();
        }

        let eof = self.location();
        self.tokens.push(Token::new(TokenKind::Eof, eof));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn location(&self) -> SourceLocation {
        if self.line == 0 {
            self.base.offset_columns(self.column)
        } else {
            SourceLocation::new(self.base.file.clone(), self.base.line + self.line, self.column + 1)
        }
    }

    fn push(&mut self, kind: TokenKind, location: SourceLocation) {
        self.tokens.push(Token::new(kind, location));
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    fn scan_token(&mut self) {
        let start = self.location();
        let Some(c) = self.advance() else {
            return;
        };

        let kind = match c {
            ' ' | '\t' | '\r' | '\n' => return,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '<' => TokenKind::LAngle,
            '>' => TokenKind::RAngle,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '+' => TokenKind::Plus,
            '/' => TokenKind::Slash,
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '.' => {
                if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                    self.number('.', &start)
                } else {
                    TokenKind::Dot
                }
            }
            '"' | '\'' => match self.string(c) {
                Some(value) => TokenKind::String(value),
                None => {
                    self.errors.push(Diagnostic::syntax("unterminated string", &start));
                    return;
                }
            },
            c if c.is_ascii_digit() => self.number(c, &start),
            c if c.is_alphabetic() || c == '_' => self.identifier(c),
            other => {
                self.errors
                    .push(Diagnostic::syntax(format!("unexpected character '{other}'"), &start));
                return;
            }
        };

        self.push(kind, start);
    }

    fn identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if name == "as" {
            TokenKind::As
        } else {
            TokenKind::Ident(name)
        }
    }

    fn string(&mut self, quote: char) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.advance()? {
                c if c == quote => return Some(value),
                '\\' => match self.advance()? {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    other => value.push(other),
                },
                c => value.push(c),
            }
        }
    }

    fn number(&mut self, first: char, start: &SourceLocation) -> TokenKind {
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                digits.push(c);
                self.advance();
            }
            return match BigInt::from_str_radix(&digits, 16) {
                Ok(value) => TokenKind::Int(value),
                Err(_) => {
                    self.errors.push(Diagnostic::syntax("invalid hexadecimal literal", start));
                    TokenKind::Int(BigInt::default())
                }
            };
        }

        let mut text = String::from(first);
        let mut is_float = first == '.';
        self.digits(&mut text);

        if !is_float && self.peek() == Some('.') && self.peek_second().is_none_or(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.advance();
            self.digits(&mut text);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mut ahead = self.chars.clone();
            ahead.next();
            let sign = ahead.peek().copied().filter(|c| *c == '+' || *c == '-');
            if sign.is_some() {
                ahead.next();
            }
            if ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.advance();
                if let Some(sign) = sign {
                    text.push(sign);
                    self.advance();
                }
                self.digits(&mut text);
            }
        }

        if is_float {
            return TokenKind::Float(text);
        }
        match BigInt::from_str_radix(&text, 10) {
            Ok(value) => TokenKind::Int(value),
            Err(_) => {
                self.errors.push(Diagnostic::syntax("invalid integer literal", start));
                TokenKind::Int(BigInt::default())
            }
        }
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source, &SourceLocation::new("t.yml", 1, 1))
            .expect("lexes")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            kinds("a ** b->c*"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::StarStar,
                TokenKind::Ident("b".into()),
                TokenKind::Arrow,
                TokenKind::Ident("c".into()),
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1F")[0], TokenKind::Int(BigInt::from(31)));
        assert_eq!(kinds("1.5")[0], TokenKind::Float("1.5".into()));
        assert_eq!(kinds(".5")[0], TokenKind::Float(".5".into()));
        assert_eq!(kinds("2e-3")[0], TokenKind::Float("2e-3".into()));
        assert_eq!(
            kinds("18446744073709551616")[0],
            TokenKind::Int("18446744073709551616".parse::<BigInt>().expect("bigint"))
        );
    }

    #[test]
    fn test_as_is_only_a_keyword_as_a_whole_word() {
        assert_eq!(kinds("x as int")[1], TokenKind::As);
        assert_eq!(kinds("ascii")[0], TokenKind::Ident("ascii".into()));
    }

    #[test]
    fn test_locations_are_offset_by_the_scalar_column() {
        let tokens = lex("a + b", &SourceLocation::new("t.yml", 4, 10)).expect("lexes");
        assert_eq!(tokens[2].location, SourceLocation::new("t.yml", 4, 14));
    }

    #[test]
    fn test_unterminated_string() {
        let errors = lex("'abc", &SourceLocation::new("t.yml", 1, 1)).expect_err("should fail");
        assert_eq!(errors[0].message, "unterminated string");
    }
}
