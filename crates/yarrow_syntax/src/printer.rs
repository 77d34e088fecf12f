//! Render types and expressions back to text.
//!
//! [`type_syntax`] produces the shorthand type-string form (`int32?`, `(int32 | string)*`, `G<int32>`). Union case
//! tags are derived from it, and diagnostics and the CLI use it to name types.
//! [`expression_tree`] produces a parenthesized prefix form (`(+ 1 (as 2 float32))`) for debugging output.

use crate::ast::{
    Dimensionality, Expression, ExpressionKind, GeneralizedType, IndexArgument, Pattern, Type, TypeCase,
};

/// Render a type in shorthand syntax.
///
/// ## Parameters
/// - `qualified`: keep namespace prefixes on resolved names (`Ns.Point`); otherwise only the last segment is
///   written (`Point`).
pub fn type_syntax(ty: &Type, qualified: bool) -> String {
    match ty {
        Type::Simple(simple) => {
            let name = if qualified {
                simple.name.as_str()
            } else {
                simple.name.rsplit('.').next().unwrap_or(&simple.name)
            };
            if simple.type_arguments.is_empty() {
                name.to_string()
            } else {
                let args: Vec<_> = simple.type_arguments.iter().map(|a| type_syntax(a, qualified)).collect();
                format!("{name}<{}>", args.join(", "))
            }
        }
        Type::Generalized(generalized) => generalized_syntax(generalized, qualified),
    }
}

fn generalized_syntax(ty: &GeneralizedType, qualified: bool) -> String {
    let Some(dimensionality) = &ty.dimensionality else {
        return cases_syntax(&ty.cases, qualified);
    };

    let element = element_syntax(&ty.cases, qualified);
    match dimensionality {
        Dimensionality::Vector { length, .. } => match length {
            Some(length) => format!("{element}*{length}"),
            None => format!("{element}*"),
        },
        Dimensionality::Array { dimensions, .. } => match dimensions {
            None => format!("{element}[]"),
            Some(dimensions) => {
                let parts: Vec<String> = dimensions
                    .iter()
                    .map(|d| match (&d.name, d.length) {
                        (Some(name), Some(length)) => format!("{name}:{length}"),
                        (Some(name), None) => name.clone(),
                        (None, Some(length)) => length.to_string(),
                        (None, None) => String::new(),
                    })
                    .collect();
                let separator = if parts.iter().all(String::is_empty) { "," } else { ", " };
                format!("{element}[{}]", parts.join(separator))
            }
        },
        Dimensionality::Map { key_type, .. } => {
            format!("{}->{element}", wrap_if_map(key_type, qualified))
        }
        Dimensionality::Stream { .. } => format!("!stream {{items: {element}}}"),
    }
}

/// The item side of a container: unions are parenthesized so the tail binds to the whole union.
fn element_syntax(cases: &[TypeCase], qualified: bool) -> String {
    let is_union = cases.len() > 2 || (cases.len() == 2 && !cases[0].is_null());
    if is_union {
        return format!("({})", cases_syntax(cases, qualified));
    }
    match cases {
        [single] => match &single.ty {
            Some(ty) => wrap_if_map(ty, qualified),
            None => "null".to_string(),
        },
        _ => cases_syntax(cases, qualified),
    }
}

fn cases_syntax(cases: &[TypeCase], qualified: bool) -> String {
    if cases.len() == 2 && cases[0].is_null() {
        if let Some(ty) = &cases[1].ty {
            if !cases[1].explicit_tag {
                return format!("{}?", wrap_if_map(ty, qualified));
            }
        }
    }

    let parts: Vec<String> = cases
        .iter()
        .map(|case| {
            let ty = match &case.ty {
                None => "null".to_string(),
                Some(ty) => type_syntax(ty, qualified),
            };
            if case.explicit_tag {
                format!("{}: {ty}", case.tag)
            } else {
                ty
            }
        })
        .collect();
    parts.join(" | ")
}

/// Maps and unions absorb trailing tails, so they need parentheses when something follows them.
fn wrap_if_map(ty: &Type, qualified: bool) -> String {
    let text = type_syntax(ty, qualified);
    match ty {
        Type::Generalized(g)
            if matches!(g.dimensionality, Some(Dimensionality::Map { .. }))
                || (g.dimensionality.is_none() && g.is_union()) =>
        {
            format!("({text})")
        }
        _ => text,
    }
}

/// Render an expression as a parenthesized prefix tree.
pub fn expression_tree(expression: &Expression) -> String {
    match &expression.kind {
        ExpressionKind::IntegerLiteral(value) => value.to_string(),
        ExpressionKind::FloatLiteral(text) => text.clone(),
        ExpressionKind::StringLiteral(value) => format!("«{value}»"),
        ExpressionKind::MemberAccess { target: None, member, .. } => member.clone(),
        ExpressionKind::MemberAccess {
            target: Some(target),
            member,
            ..
        } => format!("(. {} {member})", expression_tree(target)),
        ExpressionKind::Index { target, arguments } => {
            let target = expression_tree(target);
            if arguments.is_empty() {
                format!("(subscript {target})")
            } else {
                let args: Vec<_> = arguments.iter().map(index_argument_tree).collect();
                format!("(subscript {target} {})", args.join(" "))
            }
        }
        ExpressionKind::FunctionCall { function, arguments } => {
            if arguments.is_empty() {
                format!("(call {function})")
            } else {
                let args: Vec<_> = arguments.iter().map(expression_tree).collect();
                format!("(call {function} {})", args.join(" "))
            }
        }
        ExpressionKind::TypeConversion { expression, ty } => {
            format!("(as {} {})", expression_tree(expression), type_syntax(ty, true))
        }
        ExpressionKind::Switch { target, cases } => {
            let cases: Vec<_> = cases
                .iter()
                .map(|c| format!("({} {})", pattern_syntax(&c.pattern), expression_tree(&c.expression)))
                .collect();
            format!("(switch {} {})", expression_tree(target), cases.join(" "))
        }
        ExpressionKind::Binary { op, left, right } => {
            format!("({op} {} {})", expression_tree(left), expression_tree(right))
        }
        ExpressionKind::Unary { op, operand } => format!("({op} {})", expression_tree(operand)),
    }
}

fn index_argument_tree(argument: &IndexArgument) -> String {
    match &argument.label {
        Some(label) => format!("{label}:{}", expression_tree(&argument.value)),
        None => expression_tree(&argument.value),
    }
}

pub fn pattern_syntax(pattern: &Pattern) -> String {
    let ty = |ty: Option<&Type>| ty.map_or_else(|| "null".to_string(), |t| type_syntax(t, true));
    match pattern {
        Pattern::Discard { .. } => "_".to_string(),
        Pattern::Type { ty: t, .. } => ty(t.as_ref()),
        Pattern::Declaration { ty: t, identifier, .. } => format!("{} {identifier}", ty(t.as_ref())),
    }
}
