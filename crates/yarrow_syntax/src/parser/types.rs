/// Type-string parsing methods.
///
/// This chunk parses shorthand type strings into [`Type`] trees:
/// - Names, optionally qualified (`Ns.Name`) and with type arguments (`Name<int, T>`)
/// - Parenthesized groups (`(int*)?`)
/// - Postfix tails, applied left to right: `?`, `*`/`*N`, `[dims]`, `->Value`
///
/// ## Notes
/// - The value side of `->` is a full type string including its own tails, so `string->int*` is a map from
///   `string` to a vector of `int`.
/// - A tail applied to an undimensioned union or optional reuses that type's cases, so `int?*` is a vector whose
///   items are `[null, int]`.
impl<'a> Parser<'a> {
    // ========================================================================
    // Types
    // ========================================================================

    fn type_expr(&mut self) -> Result<Type, Diagnostic> {
        let mut ty = self.type_primary()?;
        loop {
            let location = self.peek().location.clone();
            match self.peek_kind() {
                TokenKind::Question => {
                    self.advance();
                    let inner_location = ty.location().clone();
                    ty = Type::Generalized(GeneralizedType {
                        cases: vec![TypeCase::new(None, location.clone()), TypeCase::new(Some(ty), inner_location)],
                        dimensionality: None,
                        location,
                    });
                }
                TokenKind::Star => {
                    self.advance();
                    let length = match self.peek_kind().clone() {
                        TokenKind::Int(value) => {
                            let token = self.advance();
                            Some(length_from_literal(&value, &token.location, "vector length")?)
                        }
                        _ => None,
                    };
                    ty = with_dimensionality(ty, Dimensionality::Vector {
                        length,
                        location: location.clone(),
                    }, location);
                }
                TokenKind::LBracket => {
                    self.advance();
                    let dimensions = self.array_dimensions()?;
                    ty = with_dimensionality(ty, Dimensionality::Array {
                        dimensions,
                        location: location.clone(),
                    }, location);
                }
                TokenKind::Arrow => {
                    self.advance();
                    let values = self.type_expr()?;
                    ty = with_dimensionality(values, Dimensionality::Map {
                        key_type: Box::new(ty),
                        location: location.clone(),
                    }, location);
                }
                _ => return Ok(ty),
            }
        }
    }

    fn type_primary(&mut self) -> Result<Type, Diagnostic> {
        if self.match_token(&TokenKind::LParen) {
            let inner = self.type_expr()?;
            self.expect(&TokenKind::RParen, "expected ')' to close the type group")?;
            return Ok(inner);
        }

        let (name, location) = self.qualified_name("the type name cannot be empty")?;
        let mut simple = SimpleType::new(name, location);
        if self.match_token(&TokenKind::LAngle) {
            loop {
                if self.check(&TokenKind::RAngle) || self.check(&TokenKind::Comma) {
                    return Err(self.error_here("the type parameter name cannot be empty"));
                }
                simple.type_arguments.push(self.type_expr()?);
                if self.match_token(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RAngle, "missing '>' in type string")?;
                break;
            }
        }
        Ok(Type::Simple(simple))
    }

    fn qualified_name(&mut self, message: &str) -> Result<(String, SourceLocation), Diagnostic> {
        let (mut name, location) = self.identifier(message)?;
        while self.check(&TokenKind::Dot) {
            self.advance();
            let (part, _) = self.identifier("expected a name after '.'")?;
            name.push('.');
            name.push_str(&part);
        }
        Ok((name, location))
    }

    /// Parse the inside of `[...]`, the opening bracket already consumed.
    ///
    /// `[]` leaves the dimensions unspecified; `[,]` declares two anonymous dimensions.
    fn array_dimensions(&mut self) -> Result<Option<Vec<ArrayDimension>>, Diagnostic> {
        if self.match_token(&TokenKind::RBracket) {
            return Ok(None);
        }

        let mut dimensions = Vec::new();
        loop {
            dimensions.push(self.array_dimension()?);
            if self.match_token(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RBracket, "expected ']' to close the array dimensions")?;
            return Ok(Some(dimensions));
        }
    }

    fn array_dimension(&mut self) -> Result<ArrayDimension, Diagnostic> {
        let location = self.peek().location.clone();
        let mut parens = 0;
        while self.match_token(&TokenKind::LParen) {
            parens += 1;
        }

        let mut dimension = ArrayDimension {
            name: None,
            length: None,
            comment: String::new(),
            location,
        };

        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                dimension.name = Some(name);
                if self.match_token(&TokenKind::Colon) {
                    dimension.length = Some(self.dimension_length()?);
                }
            }
            TokenKind::Int(_) => dimension.length = Some(self.dimension_length()?),
            _ => {}
        }

        for _ in 0..parens {
            self.expect(&TokenKind::RParen, "expected ')'")?;
        }
        Ok(dimension)
    }

    fn dimension_length(&mut self) -> Result<u64, Diagnostic> {
        let negative = self.match_token(&TokenKind::Minus);
        match self.peek_kind().clone() {
            TokenKind::Int(value) => {
                let token = self.advance();
                let value = if negative { -value } else { value };
                length_from_literal(&value, &token.location, "array dimension length")
            }
            _ => Err(self.error_here("expected an integer dimension length")),
        }
    }

    /// `Name` or `Name<T, U>` at the head of a type definition.
    fn definition_name(&mut self) -> Result<DefinitionName, Diagnostic> {
        let (name, location) = self.identifier("the type name cannot be empty")?;
        let mut type_parameters = Vec::new();
        if self.match_token(&TokenKind::LAngle) {
            loop {
                let (parameter, parameter_location) =
                    self.identifier("the type parameter name cannot be empty")?;
                if self.check(&TokenKind::LAngle) {
                    return Err(Diagnostic::syntax(
                        "generic type parameters cannot themselves have generic type parameters",
                        &parameter_location,
                    ));
                }
                type_parameters.push((parameter, parameter_location));
                if self.match_token(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RAngle, "missing '>' in type string")?;
                break;
            }
        }
        Ok(DefinitionName {
            name,
            type_parameters,
            location,
        })
    }
}

/// The parsed head of a type definition (`Name<T, U>`).
#[derive(Debug, Clone)]
pub struct DefinitionName {
    pub name: String,
    pub type_parameters: Vec<(String, SourceLocation)>,
    pub location: SourceLocation,
}

/// Wrap `ty` in a container, reusing its cases when it is an undimensioned union or optional.
fn with_dimensionality(ty: Type, dimensionality: Dimensionality, location: SourceLocation) -> Type {
    let cases = match ty {
        Type::Generalized(GeneralizedType {
            cases,
            dimensionality: None,
            ..
        }) => cases,
        other => {
            let case_location = other.location().clone();
            vec![TypeCase::new(Some(other), case_location)]
        }
    };
    Type::Generalized(GeneralizedType {
        cases,
        dimensionality: Some(dimensionality),
        location,
    })
}

fn length_from_literal(value: &BigInt, location: &SourceLocation, what: &str) -> Result<u64, Diagnostic> {
    if value.is_negative() {
        return Err(Diagnostic::syntax(format!("{what} cannot be negative"), location));
    }
    value
        .to_u64()
        .ok_or_else(|| Diagnostic::syntax("integer out of range", location))
}
