//! YAML syntax -> generic `serde_yaml::Value` tree.
//!
//! Equivalent to deserializing a `Value` directly, except that a mapping
//! repeating a key is reported at the location of that mapping.

use super::DocPath;
use crate::error::{Error, Result};

use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde_yaml::value::{Mapping, Tag, TaggedValue, Value};
use std::cell::RefCell;
use std::fmt;

type Repeated = RefCell<Option<(DocPath, String)>>;

/// Build the tree for one YAML document.
pub(crate) fn parse<'de, D>(de: D) -> Result<Value>
where
    D: Deserializer<'de, Error = serde_yaml::Error>,
{
    let repeated = Repeated::default();
    let node = Node {
        path: DocPath::root(),
        repeated: &repeated,
    };
    match node.deserialize(de) {
        Ok(tree) => Ok(tree),
        Err(err) => Err(match repeated.take() {
            Some((path, key)) => repeated_key(key, &path),
            None => Error::Yaml(err.to_string()),
        }),
    }
}

fn repeated_key(key: String, path: &DocPath) -> Error {
    let err = if path.segments() == ["model", "components"] {
        Error::DuplicateComponent(key)
    } else {
        Error::DuplicateKey(key)
    };
    err.at(path)
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => "(complex key)".to_string(),
    }
}

/// Seed for the node at `path`.
struct Node<'a> {
    path: DocPath,
    repeated: &'a Repeated,
}

impl<'a> Node<'a> {
    fn child(&self, segment: impl fmt::Display) -> Node<'a> {
        Node {
            path: self.path.join(segment),
            repeated: self.repeated,
        }
    }
}

impl<'de> DeserializeSeed<'de> for Node<'_> {
    type Value = Value;

    fn deserialize<D>(self, de: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        de.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Node<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, n: i64) -> std::result::Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_u64<E: de::Error>(self, n: u64) -> std::result::Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> std::result::Result<Value, E> {
        Ok(Value::Number(n.into()))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(s.to_owned()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> std::result::Result<Value, E> {
        Ok(Value::String(s))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D>(self, de: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        self.deserialize(de)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(self.child(items.len()))? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut out = Mapping::new();
        while let Some(key) = map.next_key::<Value>()? {
            let segment = key_text(&key);
            if out.contains_key(&key) {
                let msg = format!("key {segment:?} appears more than once");
                self.repeated.replace(Some((self.path.clone(), segment)));
                return Err(de::Error::custom(msg));
            }
            let value = map.next_value_seed(self.child(&segment))?;
            out.insert(key, value);
        }
        Ok(Value::Mapping(out))
    }

    fn visit_enum<A>(self, data: A) -> std::result::Result<Value, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (tag, variant) = data.variant::<String>()?;
        let value = variant.newtype_variant_seed(self)?;
        Ok(Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value,
        })))
    }
}
