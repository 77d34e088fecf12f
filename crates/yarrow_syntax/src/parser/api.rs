/// Parse a shorthand type string (e.g. `Ns.Map<string, int*>?`).
///
/// ## Parameters
/// - `text`: the scalar text.
/// - `location`: location of the scalar; token positions are offset from it.
///
/// ## Errors
/// Returns the lexer diagnostics, or the first syntax error.
#[tracing::instrument(skip_all, fields(len = text.len()))]
pub fn parse_type(text: &str, location: &SourceLocation) -> Result<Type, Vec<Diagnostic>> {
    let tokens = lexer::lex(text, location)?;
    let mut parser = Parser::new(&tokens);
    let ty = parser.type_expr().map_err(|e| vec![e])?;
    parser.expect_end("type string").map_err(|e| vec![e])?;
    Ok(ty)
}

/// Parse the head of a type definition (`Name` or `Name<T, U>`).
#[tracing::instrument(skip_all, fields(len = text.len()))]
pub fn parse_definition_name(text: &str, location: &SourceLocation) -> Result<DefinitionName, Vec<Diagnostic>> {
    let tokens = lexer::lex(text, location)?;
    let mut parser = Parser::new(&tokens);
    let name = parser.definition_name().map_err(|e| vec![e])?;
    parser.expect_end("type string").map_err(|e| vec![e])?;
    Ok(name)
}

/// Parse a switch-case pattern (`_`, `Type`, `Type binding`, `null`).
pub fn parse_pattern(text: &str, location: &SourceLocation) -> Result<Pattern, Vec<Diagnostic>> {
    let tokens = lexer::lex(text, location)?;
    Parser::new(&tokens).pattern(location).map_err(|e| vec![e])
}

/// Parse a computed-field expression.
#[tracing::instrument(skip_all, fields(len = text.len()))]
pub fn parse_expression(text: &str, location: &SourceLocation) -> Result<Expression, Vec<Diagnostic>> {
    let tokens = lexer::lex(text, location)?;
    let mut parser = Parser::new(&tokens);
    let expression = parser.expression(0).map_err(|e| vec![e])?;
    parser.expect_end("expression").map_err(|e| vec![e])?;
    Ok(expression)
}
