//! Shareable metadata for `yarrow_core::lang` registries.
//!
//! ## Notes
//! - These types are `Copy` so registries can live in `const` tables.

/// Shared metadata shape for "registry-first" vocabulary items.
///
/// - stable identity (`id`)
/// - accepted spellings (`canonical` + `aliases`)
/// - documentation (`description`)
///
/// Registries that need extra per-item data wrap this struct in their own info type.
#[derive(Debug, Clone, Copy)]
pub struct LangItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

/// Find the id whose canonical spelling or alias equals `name`.
///
/// Canonical spellings win over aliases. Matching is case-sensitive.
pub fn lookup<Id: Copy>(table: &[LangItemInfo<Id>], name: &str) -> Option<Id> {
    if let Some(item) = table.iter().find(|item| item.canonical == name) {
        return Some(item.id);
    }
    table.iter().find(|item| item.aliases.contains(&name)).map(|item| item.id)
}
