//! Reading YAML documents into `serde_yaml` values.
//!
//! The stock `serde_yaml::Value` rejects integer scalars that only fit in 128 bits and reports a repeated mapping key
//! without saying where the first entry was. [`read_document`] builds the same values with two differences:
//! - integers beyond the 64-bit range are kept as their decimal text, tagged [`WIDE_INTEGER_TAG`];
//! - a repeated key fails the document and is recorded as a [`RepeatedKey`], so the loader can name both entries.
//!
//! ## Notes
//! - Integer scalars beyond 128 bits are parsed by `serde_yaml` as floats and arrive as `Value::Number`.

use std::cell::RefCell;
use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

use super::locator::Segment;

/// Tag carried by integer scalars outside the 64-bit range.
pub(crate) const WIDE_INTEGER_TAG: &str = "!!int";

/// A mapping key that appears twice under the same parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepeatedKey {
    /// Path of the mapping holding the key.
    pub path: Vec<Segment>,
    pub key: String,
}

/// Deserialize one document, recording a repeated key in `repeated` when that is why it failed.
pub(crate) fn read_document<'de, D>(deserializer: D, repeated: &RefCell<Option<RepeatedKey>>) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    NodeSeed {
        path: Vec::new(),
        repeated,
    }
    .deserialize(deserializer)
}

/// Decimal text of an integer scalar outside the 64-bit range.
pub(crate) fn wide_integer_text(value: &Value) -> Option<&str> {
    match value {
        Value::Tagged(tagged) if tagged.tag == WIDE_INTEGER_TAG => match &tagged.value {
            Value::String(text) => Some(text),
            _ => None,
        },
        _ => None,
    }
}

/// Text used to address a mapping key in the locator.
pub(crate) fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => key_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn wide_integer(text: String) -> Value {
    Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(WIDE_INTEGER_TAG),
        value: Value::String(text),
    }))
}

struct NodeSeed<'r> {
    path: Vec<Segment>,
    repeated: &'r RefCell<Option<RepeatedKey>>,
}

impl<'r> NodeSeed<'r> {
    fn child(&self, segment: Segment) -> NodeSeed<'r> {
        let mut path = self.path.clone();
        path.push(segment);
        NodeSeed {
            path,
            repeated: self.repeated,
        }
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for NodeSeed<'_> {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Number(i.into()))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(Value::Number(u.into()))
    }

    fn visit_i128<E: de::Error>(self, i: i128) -> Result<Value, E> {
        Ok(wide_integer(i.to_string()))
    }

    fn visit_u128<E: de::Error>(self, u: u128) -> Result<Value, E> {
        Ok(wide_integer(u.to_string()))
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Number(f.into()))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(self.child(Segment::Index(items.len())))? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = Mapping::new();
        while let Some(key) = map.next_key_seed(self.child(Segment::Index(0)))? {
            let text = key_text(&key).unwrap_or_default();
            let value = map.next_value_seed(self.child(Segment::Key(text.clone())))?;
            if mapping.insert(key, value).is_some() {
                let message = format!("duplicate mapping key '{text}'");
                *self.repeated.borrow_mut() = Some(RepeatedKey { path: self.path, key: text });
                return Err(de::Error::custom(message));
            }
        }
        Ok(Value::Mapping(mapping))
    }

    fn visit_enum<A>(self, data: A) -> Result<Value, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (tag, contents) = data.variant::<String>()?;
        if tag.is_empty() {
            return Err(de::Error::custom("empty YAML tag is not allowed"));
        }
        let value = contents.newtype_variant_seed(self)?;
        Ok(Value::Tagged(Box::new(TaggedValue { tag: Tag::new(tag), value })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(source: &str) -> (Result<Value, serde_yaml::Error>, Option<RepeatedKey>) {
        let repeated = RefCell::new(None);
        let value = read_document(serde_yaml::Deserializer::from_str(source), &repeated);
        (value, repeated.into_inner())
    }

    #[test]
    fn test_plain_values_match_serde_yaml() {
        let source = "a: !record\n  fields:\n    x: [int, null]\nb: 3\nc: -4\nd: 1.5\ne: true\n";
        let (value, repeated) = read(source);
        let expected: Value = serde_yaml::from_str(source).unwrap();
        assert_eq!(value.unwrap(), expected);
        assert_eq!(repeated, None);
    }

    #[test]
    fn test_wide_integers_keep_their_text() {
        let (value, _) = read("a: 18446744073709551616\nb: -9223372036854775809\nc: 18446744073709551615\n");
        let value = value.unwrap();
        assert_eq!(wide_integer_text(&value["a"]), Some("18446744073709551616"));
        assert_eq!(wide_integer_text(&value["b"]), Some("-9223372036854775809"));
        assert_eq!(value["c"].as_u64(), Some(u64::MAX));
        assert_eq!(wide_integer_text(&value["c"]), None);
    }

    #[test]
    fn test_repeated_keys_are_recorded_with_their_parent() {
        let (value, repeated) = read("A: int\nA: string\n");
        assert!(value.is_err());
        assert_eq!(
            repeated,
            Some(RepeatedKey {
                path: Vec::new(),
                key: "A".to_string()
            })
        );

        let (value, repeated) = read("R: !record\n  fields:\n    x: int\n    x: float\n");
        assert!(value.is_err());
        assert_eq!(
            repeated,
            Some(RepeatedKey {
                path: vec![Segment::Key("R".to_string()), Segment::Key("fields".to_string())],
                key: "x".to_string()
            })
        );
    }
}
