/// Switch-case pattern parsing.
///
/// ## Notes
/// - `null` is accepted as a type pattern matching the null case. `null x` parses as a declaration pattern so the
///   resolver can report the more useful "cannot be used with the null type" error.
impl<'a> Parser<'a> {
    fn pattern(&mut self, location: &SourceLocation) -> Result<Pattern, Diagnostic> {
        if let TokenKind::Ident(name) = self.peek_kind() {
            if name == "_" && matches!(self.tokens.get(self.pos + 1).map(|t| &t.kind), Some(TokenKind::Eof)) {
                self.advance();
                return Ok(Pattern::Discard {
                    location: location.clone(),
                });
            }
        }

        let malformed = || {
            Diagnostic::syntax(
                "unable to parse pattern. Expected a type name, or a type name and an identifier, or a discard `_`",
                location,
            )
        };

        let ty = self.type_expr().map_err(|_| malformed())?;
        let ty = match ty {
            Type::Simple(simple) if simple.name == "null" && simple.type_arguments.is_empty() => None,
            other => Some(other),
        };

        if self.is_at_end() {
            return Ok(Pattern::Type {
                ty,
                location: location.clone(),
            });
        }

        let (identifier, _) = self.identifier("expected an identifier").map_err(|_| malformed())?;
        if !self.is_at_end() {
            return Err(malformed());
        }
        Ok(Pattern::Declaration {
            ty,
            identifier,
            location: location.clone(),
        })
    }
}
