//! Naming conventions for model identifiers.
//!
//! Member names (fields, computed fields, protocol steps, enum symbols, union tags, array dimensions) are
//! camelCased; type names are PascalCased. Both are limited to 64 ASCII alphanumeric characters.
//!
//! The `*_FORMAT` constants are the spellings shown in diagnostics.

/// Format shown in diagnostics for member names.
pub const MEMBER_NAME_FORMAT: &str = "^[a-z][a-zA-Z0-9]{0,63}$";

/// Format shown in diagnostics for type names.
pub const TYPE_NAME_FORMAT: &str = "^[A-Z][a-zA-Z0-9]{0,63}$";

/// Format shown in diagnostics for package namespace names.
pub const NAMESPACE_NAME_FORMAT: &str = "^[A-Z][a-zA-Z0-9]*$";

const MAX_NAME_LEN: usize = 64;

/// Check whether `name` is a valid camelCased member name.
pub fn is_member_name(name: &str) -> bool {
    matches_convention(name, |c| c.is_ascii_lowercase())
}

/// Check whether `name` is a valid PascalCased type name.
pub fn is_type_name(name: &str) -> bool {
    matches_convention(name, |c| c.is_ascii_uppercase())
}

/// Check whether `name` can name a package namespace. Unlike type names, there is no length limit.
pub fn is_namespace_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

fn matches_convention(name: &str, first: impl Fn(char) -> bool) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if first(c) => {}
        _ => return false,
    }
    name.len() <= MAX_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_names() {
        assert!(is_member_name("a"));
        assert!(is_member_name("fieldName2"));
        assert!(!is_member_name("FieldName"));
        assert!(!is_member_name("field_name"));
        assert!(!is_member_name(""));
        assert!(is_member_name(&"a".repeat(64)));
        assert!(!is_member_name(&"a".repeat(65)));
    }

    #[test]
    fn test_type_names() {
        assert!(is_type_name("Point"));
        assert!(is_type_name("Image2D"));
        assert!(!is_type_name("point"));
        assert!(!is_type_name("My-Type"));
    }

    #[test]
    fn test_namespace_names() {
        assert!(is_namespace_name("Geometry"));
        assert!(is_namespace_name(&format!("N{}", "a".repeat(80))));
        assert!(!is_namespace_name("geometry"));
        assert!(!is_namespace_name("Geo.Metry"));
        assert!(!is_namespace_name(""));
    }
}
