/// Expression parsing methods (precedence climbing).
///
/// | Precedence | Operators                        | Associativity |
/// |-----------:|----------------------------------|---------------|
/// | 5          | `.` member, `(...)` call, `[...]` subscript | left |
/// | 4          | `as`                             | left          |
/// | 3          | `**`                             | right         |
/// | 2          | `*` `/`                          | left          |
/// | 1          | `+` `-`                          | left          |
///
/// ## Notes
/// - Unary minus folds directly into integer and float literals.
/// - The right-hand side of `as` is a (possibly qualified) type name.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&mut self, min_prec: u8) -> Result<Expression, Diagnostic> {
        let mut lhs = self.atom()?;

        loop {
            let token = self.peek().clone();
            let (prec, right_assoc) = match binding_power(&token.kind) {
                Some(power) => power,
                None => break,
            };
            if prec < min_prec {
                break;
            }

            match token.kind {
                TokenKind::LParen => {
                    lhs = self.call(lhs)?;
                }
                TokenKind::LBracket => {
                    if min_prec >= 5 {
                        break;
                    }
                    lhs = self.subscript(lhs)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    let rhs = self.expression(prec + 1)?;
                    let Some(member) = rhs.as_identifier() else {
                        return Err(Diagnostic::syntax(
                            "the right-hand side of a '.' operator must be an identifier",
                            &rhs.location,
                        ));
                    };
                    lhs = Expression::new(
                        ExpressionKind::MemberAccess {
                            target: Some(Box::new(lhs)),
                            member: member.to_string(),
                            is_computed_field: false,
                        },
                        rhs.location.clone(),
                    );
                }
                TokenKind::As => {
                    self.advance();
                    let rhs = self.expression(prec + 1)?;
                    let Some(name) = type_reference_name(&rhs) else {
                        return Err(Diagnostic::syntax(
                            "the right-hand side of an 'as' operator must be a type reference",
                            &rhs.location,
                        ));
                    };
                    lhs = Expression::new(
                        ExpressionKind::TypeConversion {
                            expression: Box::new(lhs),
                            ty: Type::named(name, rhs.location.clone()),
                        },
                        token.location,
                    );
                }
                ref kind => {
                    let Some(op) = binary_op(kind) else { break };
                    self.advance();
                    let next_min = if right_assoc { prec } else { prec + 1 };
                    let rhs = self.expression(next_min)?;
                    lhs = Expression::new(
                        ExpressionKind::Binary {
                            op,
                            left: Box::new(lhs),
                            right: Box::new(rhs),
                        },
                        token.location,
                    );
                }
            }
        }

        Ok(lhs)
    }

    fn atom(&mut self) -> Result<Expression, Diagnostic> {
        let token = self.advance();
        match token.kind {
            TokenKind::Plus => self.atom(),
            TokenKind::Minus => {
                let mut operand = self.atom()?;
                match &mut operand.kind {
                    ExpressionKind::IntegerLiteral(value) => {
                        *value = -std::mem::take(value);
                        operand.location = token.location;
                        Ok(operand)
                    }
                    ExpressionKind::FloatLiteral(text) => {
                        text.insert(0, '-');
                        operand.location = token.location;
                        Ok(operand)
                    }
                    _ => Ok(Expression::new(
                        ExpressionKind::Unary {
                            op: UnaryOp::Negate,
                            operand: Box::new(operand),
                        },
                        token.location,
                    )),
                }
            }
            TokenKind::Int(value) => Ok(Expression::integer(value, token.location)),
            TokenKind::Float(text) => Ok(Expression::new(ExpressionKind::FloatLiteral(text), token.location)),
            TokenKind::String(value) => Ok(Expression::new(ExpressionKind::StringLiteral(value), token.location)),
            TokenKind::Ident(name) => Ok(Expression::identifier(name, token.location)),
            TokenKind::LParen => {
                let inner = self.expression(0)?;
                self.expect(&TokenKind::RParen, "expected closing parenthesis")?;
                Ok(inner)
            }
            TokenKind::Eof => Err(Diagnostic::syntax("unexpected end of expression", &token.location)),
            other => Err(Diagnostic::syntax(format!("unexpected token '{other}'"), &token.location)),
        }
    }

    fn call(&mut self, target: Expression) -> Result<Expression, Diagnostic> {
        self.advance();
        let Some(function) = target.as_identifier().map(str::to_string) else {
            return Err(Diagnostic::syntax(
                "the target of a function call must be an identifier, e.g. `size(...)`",
                &target.location,
            ));
        };

        let mut arguments = Vec::new();
        loop {
            if self.match_token(&TokenKind::RParen) {
                break;
            }
            if !arguments.is_empty() {
                self.expect(&TokenKind::Comma, "expected a comma")?;
            }
            if self.check(&TokenKind::RParen) || self.check(&TokenKind::Comma) {
                return Err(self.error_here("expected an expression"));
            }
            arguments.push(self.expression(0)?);
        }

        Ok(Expression::new(
            ExpressionKind::FunctionCall { function, arguments },
            target.location,
        ))
    }

    fn subscript(&mut self, target: Expression) -> Result<Expression, Diagnostic> {
        self.advance();
        let location = target.location.clone();

        let mut arguments = Vec::new();
        loop {
            if self.match_token(&TokenKind::RBracket) {
                break;
            }
            if !arguments.is_empty() {
                self.expect(&TokenKind::Comma, "expected a comma")?;
            }
            if self.check(&TokenKind::RBracket) || self.check(&TokenKind::Comma) {
                return Err(self.error_here("expected a subscript argument"));
            }
            arguments.push(self.subscript_argument()?);
        }

        Ok(Expression::new(
            ExpressionKind::Index {
                target: Box::new(target),
                arguments,
            },
            location,
        ))
    }

    fn subscript_argument(&mut self) -> Result<IndexArgument, Diagnostic> {
        let first = self.expression(0)?;
        if !self.match_token(&TokenKind::Colon) {
            return Ok(IndexArgument {
                label: None,
                location: first.location.clone(),
                value: first,
            });
        }

        let Some(label) = first.as_identifier().map(str::to_string) else {
            return Err(Diagnostic::syntax("expected label to be an identifier", &first.location));
        };
        let value = self.expression(0)?;
        Ok(IndexArgument {
            label: Some(label),
            value,
            location: first.location,
        })
    }
}

/// Precedence and right-associativity of an infix/postfix token.
fn binding_power(kind: &TokenKind) -> Option<(u8, bool)> {
    match kind {
        TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => Some((5, false)),
        TokenKind::As => Some((4, false)),
        TokenKind::StarStar => Some((3, true)),
        TokenKind::Star | TokenKind::Slash => Some((2, false)),
        TokenKind::Plus | TokenKind::Minus => Some((1, false)),
        _ => None,
    }
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::StarStar => Some(BinaryOp::Pow),
        _ => None,
    }
}

/// `int` or `Ns.Name` written as member accesses.
fn type_reference_name(expression: &Expression) -> Option<String> {
    match &expression.kind {
        ExpressionKind::MemberAccess {
            target: None, member, ..
        } => Some(member.clone()),
        ExpressionKind::MemberAccess {
            target: Some(target),
            member,
            ..
        } => Some(format!("{}.{member}", type_reference_name(target)?)),
        _ => None,
    }
}
