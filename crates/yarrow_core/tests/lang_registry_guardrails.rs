use std::collections::HashMap;

use yarrow_core::lang::builtins;
use yarrow_core::lang::primitives::{self, PrimitiveKind};
use yarrow_core::lang::tags;

#[test]
fn primitive_spellings_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, primitives::PrimitiveId> = HashMap::new();

    for info in primitives::PRIMITIVES {
        let id = info.item.id;
        assert_eq!(
            primitives::from_str(info.item.canonical),
            Some(id),
            "primitive canonical spelling not resolvable: {}",
            info.item.canonical
        );
        assert_eq!(primitives::as_str(id), info.item.canonical, "primitive as_str mismatch for {id:?}");

        for &spelling in std::iter::once(&info.item.canonical).chain(info.item.aliases) {
            assert_eq!(primitives::from_str(spelling), Some(id), "primitive alias not resolvable: {spelling}");
            if let Some(prev) = seen.insert(spelling, id) {
                panic!("duplicate primitive spelling {spelling:?}: {prev:?} and {id:?}");
            }
        }
    }
}

#[test]
fn primitive_registry_is_in_id_order() {
    for (index, id) in primitives::ALL.iter().enumerate() {
        assert_eq!(primitives::PRIMITIVES[index].item.id, *id);
    }
    assert_eq!(primitives::ALL.len(), primitives::PRIMITIVES.len());
}

#[test]
fn only_integers_have_ranges() {
    for info in primitives::PRIMITIVES {
        let is_integer = info.kind == PrimitiveKind::Integer;
        assert_eq!(
            info.range.is_some(),
            is_integer,
            "range presence does not match kind for {}",
            info.item.canonical
        );
        if let Some((min, max)) = info.range {
            assert!(min < max);
        }
    }
}

#[test]
fn builtin_function_spellings_round_trip() {
    for info in builtins::BUILTIN_FUNCTIONS {
        assert_eq!(builtins::from_str(info.canonical), Some(info.id));
        assert_eq!(builtins::as_str(info.id), info.canonical);
        assert!(
            primitives::from_str(info.canonical).is_none(),
            "builtin function {} shadows a primitive",
            info.canonical
        );
    }
}

#[test]
fn tag_spellings_round_trip() {
    for name in [
        "record", "enum", "flags", "protocol", "vector", "array", "map", "stream", "union", "generic", "recursive",
        "switch",
    ] {
        let id = tags::from_str(name).unwrap_or_else(|| panic!("tag {name} not resolvable"));
        assert_eq!(tags::as_str(id), format!("!{name}"));
        assert_eq!(tags::from_str(tags::as_str(id)), Some(id));
    }
}
