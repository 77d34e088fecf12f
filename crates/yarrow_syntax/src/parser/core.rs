/// Parser core type and token helpers.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser`.
/// - Grammar methods return `Result<_, Diagnostic>` and stop at the first error; scalars are short, so there is no
///   recovery.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Create a parser over a token stream ending in `Eof`.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Token helpers
    // ========================================================================

    fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn error_here(&self, message: &str) -> Diagnostic {
        let token = self.peek();
        let message = if matches!(token.kind, TokenKind::Eof) {
            format!("{message}, found end of input")
        } else {
            format!("{message}, found '{}'", token.kind)
        };
        Diagnostic::syntax(message, &token.location)
    }

    fn identifier(&mut self, message: &str) -> Result<(String, SourceLocation), Diagnostic> {
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                let token = self.advance();
                Ok((name, token.location))
            }
            _ => Err(self.error_here(message)),
        }
    }

    fn expect_end(&self, what: &str) -> Result<(), Diagnostic> {
        if self.is_at_end() {
            Ok(())
        } else {
            let token = self.peek();
            Err(Diagnostic::syntax(
                format!("unexpected trailing '{}' in {what}", token.kind),
                &token.location,
            ))
        }
    }
}
