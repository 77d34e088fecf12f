//! YAML tags recognized by the model loader.
//!
//! Tags are compared without their leading `!`.

/// Stable identifier for a YAML kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagId {
    Record,
    Enum,
    Flags,
    Protocol,
    Vector,
    Array,
    Map,
    Stream,
    Union,
    Generic,
    Recursive,
    Switch,
}

const TAGS: &[(TagId, &str)] = &[
    (TagId::Record, "record"),
    (TagId::Enum, "enum"),
    (TagId::Flags, "flags"),
    (TagId::Protocol, "protocol"),
    (TagId::Vector, "vector"),
    (TagId::Array, "array"),
    (TagId::Map, "map"),
    (TagId::Stream, "stream"),
    (TagId::Union, "union"),
    (TagId::Generic, "generic"),
    (TagId::Recursive, "recursive"),
    (TagId::Switch, "switch"),
];

/// Resolve a tag spelling (with or without the leading `!`).
pub fn from_str(tag: &str) -> Option<TagId> {
    let tag = tag.trim_start_matches('!');
    TAGS.iter().find(|(_, name)| *name == tag).map(|(id, _)| *id)
}

/// Return the tag spelling including the leading `!`.
pub fn as_str(id: TagId) -> &'static str {
    match id {
        TagId::Record => "!record",
        TagId::Enum => "!enum",
        TagId::Flags => "!flags",
        TagId::Protocol => "!protocol",
        TagId::Vector => "!vector",
        TagId::Array => "!array",
        TagId::Map => "!map",
        TagId::Stream => "!stream",
        TagId::Union => "!union",
        TagId::Generic => "!generic",
        TagId::Recursive => "!recursive",
        TagId::Switch => "!switch",
    }
}
