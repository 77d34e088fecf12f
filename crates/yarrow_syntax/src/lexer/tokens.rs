//! Token types shared by the type-string, pattern and expression grammars.

use std::fmt;

use num_bigint::BigInt;

use crate::ast::SourceLocation;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(BigInt),
    /// Floating-point literal text, kept verbatim.
    Float(String),
    String(String),

    // ========== Keywords ==========
    As,

    // ========== Punctuation ==========
    LParen,
    RParen,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    Comma,
    Colon,
    Dot,
    Question,

    // ========== Operators ==========
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Arrow,

    // ========== Special ==========
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "{name}"),
            TokenKind::Int(value) => write!(f, "{value}"),
            TokenKind::Float(text) => write!(f, "{text}"),
            TokenKind::String(value) => write!(f, "\"{value}\""),
            TokenKind::As => write!(f, "as"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LAngle => write!(f, "<"),
            TokenKind::RAngle => write!(f, ">"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }
}
