//! Discriminator dispatch shared by every polymorphic wire family.
//!
//! Every family in this crate is encoded as `{"type": "<discriminator>", ...fields}`.
//! A [`VariantRegistry`] maps each legal discriminator of one family to the function
//! that decodes the remaining fields; encoding goes the other way through
//! [`encode_tagged`], using the discriminator reported by [`Variant::variant_type`].
//!
//! Families are either *strict* (unknown discriminators are rejected with
//! [`Error::UnknownVariant`]) or *open* (unknown discriminators are handed, together
//! with the whole original object, to a fallback constructor). Only content blocks
//! are open.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Name of the discriminator field on the wire.
pub const DISCRIMINATOR: &str = "type";

/// Decodes the fields of one variant. The discriminator has already been removed.
pub type DecodeFn<T> = fn(Map<String, Value>) -> Result<T>;

/// Builds the catch-all variant of an open family from the untouched input object.
pub type FallbackFn<T> = fn(Map<String, Value>) -> T;

/// Capability shared by every variant of every family: report its own discriminator.
pub trait Variant {
    fn variant_type(&self) -> &'static str;
}

/// A closed (or, for content blocks, semi-open) family of wire variants.
///
/// `decode` always goes through the family's registry so that unknown discriminators
/// surface as [`Error::UnknownVariant`] instead of a generic serde message.
pub trait Family: Variant + Serialize + Sized + 'static {
    fn registry() -> &'static VariantRegistry<Self>;

    fn decode(value: Value) -> Result<Self> {
        Self::registry().decode(value)
    }

    fn encode(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Discriminator -> decoder table for one family.
pub struct VariantRegistry<T: 'static> {
    family: &'static str,
    entries: &'static [(&'static str, DecodeFn<T>)],
    fallback: Option<FallbackFn<T>>,
}

impl<T: 'static> VariantRegistry<T> {
    /// A family that rejects anything it does not know.
    pub const fn strict(
        family: &'static str,
        entries: &'static [(&'static str, DecodeFn<T>)],
    ) -> Self {
        Self {
            family,
            entries,
            fallback: None,
        }
    }

    /// A family that captures unknown discriminators through `fallback`.
    pub const fn open(
        family: &'static str,
        entries: &'static [(&'static str, DecodeFn<T>)],
        fallback: FallbackFn<T>,
    ) -> Self {
        Self {
            family,
            entries,
            fallback: Some(fallback),
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn is_open(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn lookup(&self, discriminator: &str) -> Option<DecodeFn<T>> {
        self.entries
            .iter()
            .find(|(tag, _)| *tag == discriminator)
            .map(|(_, decode)| *decode)
    }

    pub fn is_registered(&self, discriminator: &str) -> bool {
        self.lookup(discriminator).is_some()
    }

    /// Registered discriminators, in registration order (aliases included).
    pub fn discriminators(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(tag, _)| *tag)
    }

    /// Decode one wire object.
    pub fn decode(&self, value: Value) -> Result<T> {
        match value {
            Value::Object(map) => self.decode_map(map),
            other => Err(Error::malformed(
                self.family,
                "<none>",
                format!("expected a JSON object, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn decode_map(&self, mut map: Map<String, Value>) -> Result<T> {
        let decoder = match map.get(DISCRIMINATOR) {
            Some(Value::String(tag)) => self.lookup(tag),
            _ => None,
        };

        if let Some(decode) = decoder {
            map.remove(DISCRIMINATOR);
            return decode(map);
        }

        if let Some(fallback) = self.fallback {
            return Ok(fallback(map));
        }

        let found = match map.get(DISCRIMINATOR) {
            Some(Value::String(tag)) => Some(tag.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        };
        Err(Error::UnknownVariant {
            family: self.family,
            found,
        })
    }

    /// Decode a JSON array of wire objects, failing on the first bad element.
    pub fn decode_all(&self, values: Vec<Value>) -> Result<Vec<T>> {
        values.into_iter().map(|v| self.decode(v)).collect()
    }
}

/// Decode the fields of `variant` into its payload struct.
///
/// A missing mandatory field or a field of the wrong type is reported as
/// [`Error::MalformedContent`].
pub fn decode_payload<P: DeserializeOwned>(
    family: &'static str,
    variant: &str,
    map: Map<String, Value>,
) -> Result<P> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| Error::malformed(family, variant, e.to_string()))
}

/// Take an array field out of a payload map; absent means empty.
pub(crate) fn take_array(
    family: &'static str,
    variant: &str,
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Vec<Value>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::malformed(
            family,
            variant,
            format!("`{}` must be an array, found {}", key, json_kind(&other)),
        )),
    }
}

/// Take a mandatory field out of a payload map.
pub(crate) fn take_required(
    family: &'static str,
    variant: &str,
    map: &mut Map<String, Value>,
    key: &str,
) -> Result<Value> {
    match map.remove(key) {
        None | Some(Value::Null) => Err(Error::malformed(
            family,
            variant,
            format!("missing field `{}`", key),
        )),
        Some(v) => Ok(v),
    }
}

/// Serialize `payload` (which must serialize as an object) with `type` set to `tag`.
pub fn encode_tagged<P: Serialize + ?Sized>(tag: &str, payload: &P) -> Result<Value> {
    let value = serde_json::to_value(payload)?;
    match value {
        Value::Object(mut fields) => {
            fields.insert(DISCRIMINATOR.to_string(), Value::String(tag.to_string()));
            Ok(Value::Object(fields))
        }
        other => Err(Error::internal(format!(
            "variant `{}` payload serialized as {}, expected an object",
            tag,
            json_kind(&other)
        ))),
    }
}

/// `serde` glue for family enums: serialize through [`encode_tagged`].
pub(crate) fn serialize_tagged<S, P>(
    tag: &str,
    payload: &P,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    P: Serialize + ?Sized,
{
    encode_tagged(tag, payload)
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}

/// Implement `Deserialize` for a [`Family`] by routing through its registry.
macro_rules! deserialize_via_registry {
    ($ty:ty) => {
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                <$ty as $crate::variant::Family>::decode(value).map_err(serde::de::Error::custom)
            }
        }
    };
}
pub(crate) use deserialize_via_registry;

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
