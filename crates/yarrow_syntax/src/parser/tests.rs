#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::{expression_tree, pattern_syntax, type_syntax};

    fn loc() -> SourceLocation {
        SourceLocation::new("test.yml", 1, 1)
    }

    fn ty(text: &str) -> String {
        let parsed = parse_type(text, &loc()).unwrap_or_else(|e| panic!("'{text}' should parse: {e:?}"));
        type_syntax(&parsed, true)
    }

    fn expr(text: &str) -> String {
        let parsed = parse_expression(text, &loc()).unwrap_or_else(|e| panic!("'{text}' should parse: {e:?}"));
        expression_tree(&parsed)
    }

    fn expr_err(text: &str) -> String {
        let errors = parse_expression(text, &loc()).expect_err("should fail");
        errors[0].message.clone()
    }

    #[test]
    fn test_type_strings_round_trip() {
        for text in [
            "int",
            "Ns.Point",
            "G<int, G<date, time>>",
            "int?",
            "int->string",
            "(int->string)?",
            "int*",
            "int*2",
            "int[]",
            "int[]?",
            "int[]?*?",
            "int[,]",
            "int[,,]",
            "int[2, 3]",
            "int[x:2, y:3]",
            "int[x, y]",
        ] {
            assert_eq!(ty(text), text);
        }
    }

    #[test]
    fn test_type_string_normalization() {
        assert_eq!(ty("int->(string?)"), "int->string?");
        assert_eq!(ty("(int?)*2?"), "int?*2?");
        assert_eq!(ty("string->int*"), "string->int*");
    }

    #[test]
    fn test_tail_on_optional_reuses_cases() {
        let parsed = parse_type("int?*", &loc()).expect("parses");
        let Type::Generalized(vector) = parsed else {
            panic!("expected a generalized type");
        };
        assert_eq!(vector.cases.len(), 2);
        assert!(vector.cases[0].is_null());
        assert!(matches!(vector.dimensionality, Some(Dimensionality::Vector { length: None, .. })));
    }

    #[test]
    fn test_type_string_errors() {
        let err = parse_type("G<int", &loc()).expect_err("should fail");
        assert!(err[0].message.starts_with("missing '>' in type string"));
        let err = parse_type("int x", &loc()).expect_err("should fail");
        assert_eq!(err[0].message, "unexpected trailing 'x' in type string");
        let err = parse_type("int[x:-1]", &loc()).expect_err("should fail");
        assert_eq!(err[0].message, "array dimension length cannot be negative");
        let err = parse_type("", &loc()).expect_err("should fail");
        assert!(err[0].message.starts_with("the type name cannot be empty"));
    }

    #[test]
    fn test_definition_names() {
        let name = parse_definition_name("Image<T, U>", &loc()).expect("parses");
        assert_eq!(name.name, "Image");
        let params: Vec<_> = name.type_parameters.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(params, vec!["T", "U"]);

        let err = parse_definition_name("Image<T<U>>", &loc()).expect_err("should fail");
        assert_eq!(
            err[0].message,
            "generic type parameters cannot themselves have generic type parameters"
        );
    }

    #[test]
    fn test_patterns() {
        let pattern = |text: &str| pattern_syntax(&parse_pattern(text, &loc()).expect("parses"));
        assert_eq!(pattern("_"), "_");
        assert_eq!(pattern("int"), "int");
        assert_eq!(pattern("int i"), "int i");
        assert_eq!(pattern("null"), "null");
        assert_eq!(pattern("G<int>? g"), "G<int>? g");
        assert!(matches!(
            parse_pattern("null", &loc()).expect("parses"),
            Pattern::Type { ty: None, .. }
        ));

        let err = parse_pattern("int a b", &loc()).expect_err("should fail");
        assert!(err[0].message.starts_with("unable to parse pattern"));
    }

    #[test]
    fn test_expression_precedence() {
        assert_eq!(expr("1 + 2 - 3"), "(- (+ 1 2) 3)");
        assert_eq!(expr("1 * 2 / 3 + 4"), "(+ (/ (* 1 2) 3) 4)");
        assert_eq!(expr("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(expr("2 ** 2 ** 3"), "(** 2 (** 2 3))");
        assert_eq!(expr("1 + 2 as float32"), "(+ 1 (as 2 float32))");
        assert_eq!(expr("(1 + 2) as (float32)"), "(as (+ 1 2) float32)");
        assert_eq!(expr("1 ** x() + 2"), "(+ (** 1 (call x)) 2)");
    }

    #[test]
    fn test_expression_literals() {
        assert_eq!(expr("+1"), "1");
        assert_eq!(expr("-1"), "-1");
        assert_eq!(expr("-(1 + 2)"), "(- (+ 1 2))");
        assert_eq!(expr("-0x10"), "-16");
        assert_eq!(expr("1.2e-3"), "1.2e-3");
        assert_eq!(expr("1."), "1.");
        assert_eq!(expr(r#""s\"s""#), "«s\"s»");
        assert_eq!(expr("'s\\'s'"), "«s's»");
    }

    #[test]
    fn test_expression_postfix() {
        assert_eq!(expr("foo.bar.baz"), "(. (. foo bar) baz)");
        assert_eq!(expr("a.b[]"), "(subscript (. a b))");
        assert_eq!(expr("foo[1].bar[2]"), "(subscript (. (subscript foo 1) bar) 2)");
        assert_eq!(expr("foo[x: 1.1 as int, y:2]"), "(subscript foo x:(as 1.1 int) y:2)");
        assert_eq!(expr(" foo ( 1 , 2 ) "), "(call foo 1 2)");
        assert_eq!(expr("Foo(1 + 2, a[3 * 4])"), "(call Foo (+ 1 2) (subscript a (* 3 4)))");
        assert_eq!(expr("x as Ns.Int"), "(as x Ns.Int)");
    }

    #[test]
    fn test_expression_errors() {
        assert_eq!(expr_err("foo(1,)"), "expected an expression, found ')'");
        assert_eq!(expr_err("foo[,1]"), "expected a subscript argument, found ','");
        assert_eq!(
            expr_err("foo.(1+2)"),
            "the right-hand side of a '.' operator must be an identifier"
        );
        assert_eq!(expr_err("\"a"), "unterminated string");
        assert_eq!(expr_err("99bottles"), "unexpected trailing 'bottles' in expression");
        assert_eq!(expr_err("[1]"), "unexpected token '['");
    }

    #[test]
    fn test_expression_locations_follow_the_scalar() {
        let parsed = parse_expression("a + b", &SourceLocation::new("m.yml", 7, 12)).expect("parses");
        let ExpressionKind::Binary { right, .. } = &parsed.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(right.location, SourceLocation::new("m.yml", 7, 16));
    }
}
