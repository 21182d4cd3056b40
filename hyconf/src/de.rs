//! Decoding tree values into Rust types through serde.
//!
//! Decoding is lenient. Scalars are coerced to whatever the target asks for,
//! and text that does not parse becomes the zero value (`0`, `false`, `""`)
//! instead of an error. Only a top-level shape mismatch, such as decoding a
//! list into a struct, is reported.

use crate::error::{Error, ErrorKind, Result};
use crate::options::DecodeOptions;
use crate::value::{Table, Value};
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;
use tracing::debug;

/// Decodes a value with default options.
///
/// # Examples
///
/// ```
/// use serde::Deserialize;
/// use hyconf::{from_value, Value};
///
/// #[derive(Deserialize, Debug, PartialEq)]
/// struct Server {
///     host: String,
///     port: u16,
///     tls: bool,
/// }
///
/// let doc = hyconf::from_str("[server]\nhost = web\nport = 8080\ntls = on").unwrap();
/// let value = doc.get("server", None).unwrap();
/// let server: Server = from_value(value).unwrap();
/// assert_eq!(server, Server { host: "web".into(), port: 8080, tls: true });
/// ```
pub fn from_value<T: de::DeserializeOwned>(value: Value) -> Result<T> {
    from_value_with_options(value, &DecodeOptions::default())
}

/// Decodes a value with custom options.
pub fn from_value_with_options<T: de::DeserializeOwned>(value: Value, options: &DecodeOptions) -> Result<T> {
    decode_value(Some(value), options)
}

/// Decodes `value`, or the zero value of `T` when there is no value.
pub(crate) fn decode_value<T: de::DeserializeOwned>(value: Option<Value>, options: &DecodeOptions) -> Result<T> {
    T::deserialize(Deserializer::root(value, options))
}

/// Decodes `value` on top of `base`. Struct fields missing from `value` are
/// taken from `base` before they are zero-filled.
pub(crate) fn decode_onto<T: de::DeserializeOwned>(value: Value, base: Value, options: &DecodeOptions) -> Result<T> {
    T::deserialize(Deserializer::root(Some(value), options).with_base(base))
}

/// Reads a boolean, accepting `y/n`, `on/off`, `yes/no`,
/// `enabled/disabled`, `t/f`, `1/0` and `true/false` in any case.
///
/// ```
/// use hyconf::de::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" | "enabled" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

/// Reads a floating-point number. Underscores between digits are ignored.
pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace('_', "");
    if let Some(n) = parse_radix(&cleaned) {
        return Some(n as f64);
    }
    cleaned.parse::<f64>().ok()
}

/// Reads an integer. `0x`/`0o`/`0b` prefixes are understood; anything else
/// is read as an `f64` and truncated toward zero, so integers beyond 2^53
/// lose precision.
pub fn parse_integer(text: &str) -> Option<i128> {
    let cleaned = text.trim().replace('_', "");
    if let Some(n) = parse_radix(&cleaned) {
        return Some(n);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f as i128)
}

fn parse_radix(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(d) = digits.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = digits.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = digits.strip_prefix("0b") {
        (2, d)
    } else {
        return None;
    };
    let n = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -n } else { n })
}

fn shape_mismatch(root: bool, expected: &str, found: &Value) -> Result<()> {
    if root {
        return Err(Error::invalid_target(expected, found.kind_name()));
    }
    debug!(expected, found = found.kind_name(), "shape mismatch, using zero value");
    Ok(())
}

/// A serde deserializer over an owned tree value.
///
/// A missing value (`None`) decodes as the zero value of the target. An
/// optional `base` supplies struct fields the value does not have.
pub struct Deserializer<'o> {
    value: Option<Value>,
    base: Option<Value>,
    options: &'o DecodeOptions,
    field: Option<String>,
    root: bool,
    allocated: bool,
}

impl<'o> Deserializer<'o> {
    /// Creates a top-level deserializer. Shape mismatches at this level are
    /// errors.
    pub fn root(value: Option<Value>, options: &'o DecodeOptions) -> Self {
        Deserializer {
            value,
            base: None,
            options,
            field: None,
            root: true,
            allocated: false,
        }
    }

    /// Sets the value that struct fields fall back to.
    pub fn with_base(mut self, base: Value) -> Self {
        self.base = Some(base);
        self
    }

    fn nested(value: Option<Value>, options: &'o DecodeOptions, field: Option<String>) -> Self {
        Deserializer {
            value,
            base: None,
            options,
            field,
            root: false,
            allocated: false,
        }
    }

    /// Returns the scalar text, or `None` when the value is absent or not a
    /// scalar.
    fn into_scalar(self, expected: &str) -> Result<Option<String>> {
        match self.value {
            Some(Value::Scalar(text)) => Ok(Some(text)),
            None => Ok(None),
            Some(other) => {
                shape_mismatch(self.root, expected, &other)?;
                Ok(None)
            }
        }
    }

    fn integer(self, expected: &str) -> Result<i128> {
        Ok(match self.into_scalar(expected)? {
            Some(text) if !text.trim().is_empty() => parse_integer(&text).unwrap_or_else(|| {
                debug!(value = %text, expected, "not a number, using 0");
                0
            }),
            _ => 0,
        })
    }

    fn float(self, expected: &str) -> Result<f64> {
        Ok(match self.into_scalar(expected)? {
            Some(text) if !text.trim().is_empty() => parse_float(&text).unwrap_or_else(|| {
                debug!(value = %text, expected, "not a number, using 0");
                0.0
            }),
            _ => 0.0,
        })
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                let n = self.integer(stringify!($ty))?;
                let n = <$ty>::try_from(n).unwrap_or(if n < 0 { <$ty>::MIN } else { <$ty>::MAX });
                visitor.$visit(n)
            }
        )*
    };
}

impl<'de, 'o> de::Deserializer<'de> for Deserializer<'o> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let options = self.options;
        match self.value {
            None => visitor.visit_unit(),
            Some(Value::Scalar(text)) => visitor.visit_string(text),
            Some(Value::List(items)) => visitor.visit_seq(SeqDeserializer::new(items, options)),
            Some(Value::Table(table)) => visitor.visit_map(MapDeserializer::new(table, options)),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let b = match self.into_scalar("bool")? {
            Some(text) => parse_bool(&text).unwrap_or_else(|| {
                if !text.trim().is_empty() {
                    debug!(value = %text, "not a boolean, using false");
                }
                false
            }),
            None => false,
        };
        visitor.visit_bool(b)
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8: i8,
        deserialize_i16 => visit_i16: i16,
        deserialize_i32 => visit_i32: i32,
        deserialize_i64 => visit_i64: i64,
        deserialize_i128 => visit_i128: i128,
        deserialize_u8 => visit_u8: u8,
        deserialize_u16 => visit_u16: u16,
        deserialize_u32 => visit_u32: u32,
        deserialize_u64 => visit_u64: u64,
        deserialize_u128 => visit_u128: u128,
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let n = self.float("f32")?;
        visitor.visit_f32(n as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let n = self.float("f64")?;
        visitor.visit_f64(n)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let ch = self
            .into_scalar("char")?
            .and_then(|text| text.chars().next())
            .unwrap_or('\0');
        visitor.visit_char(ch)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.into_scalar("string")?.unwrap_or_default())
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let text = self.into_scalar("bytes")?.unwrap_or_default();
        visitor.visit_byte_buf(text.into_bytes())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.value.is_some() {
            return visitor.visit_some(self);
        }
        if !self.options.allocate_nested {
            return visitor.visit_none();
        }

        let options = DecodeOptions {
            allocate_nested: false,
            ..self.options.clone()
        };
        visitor.visit_some(Deserializer {
            value: None,
            base: self.base,
            options: &options,
            field: self.field,
            root: self.root,
            allocated: true,
        })
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let options = self.options;
        let items = match self.value {
            Some(Value::List(items)) => items,
            Some(Value::Scalar(text)) => {
                let delimiter = options.delimiter_for(self.field.as_deref()).as_char();
                split_scalar(&text, delimiter)
            }
            None => Vec::new(),
            Some(other) => {
                shape_mismatch(self.root, "sequence", &other)?;
                Vec::new()
            }
        };
        visitor.visit_seq(SeqDeserializer::new(items, options))
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V>(self, _name: &'static str, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let options = self.options;
        let table = match self.value {
            Some(Value::Table(table)) => table,
            None => Table::new(),
            Some(other) => {
                shape_mismatch(self.root, "map", &other)?;
                Table::new()
            }
        };
        visitor.visit_map(MapDeserializer::new(table, options))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let options = self.options;
        let root = self.root;
        let table = match self.value {
            Some(Value::Table(table)) => table,
            None => Table::new(),
            Some(other) => {
                shape_mismatch(root, name, &other)?;
                Table::new()
            }
        };
        let base = match self.base {
            Some(Value::Table(base)) => base,
            _ => Table::new(),
        };
        visitor.visit_map(StructDeserializer::new(table, base, name, fields, root, options))
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let options = self.options;
        let allocated = self.allocated;
        match self.value {
            Some(Value::Scalar(text)) => {
                let variant: de::value::StringDeserializer<Error> = text.trim().to_string().into_deserializer();
                visitor.visit_enum(variant)
            }
            Some(Value::Table(table)) if table.len() == 1 => match table.into_iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                    variant,
                    value,
                    options,
                }),
                None => Err(Error::invalid_target(name, "empty table")),
            },
            Some(other) => Err(Error::invalid_target(name, other.kind_name())),
            None if allocated && !variants.is_empty() => {
                let variant: de::value::StrDeserializer<Error> = variants[0].into_deserializer();
                visitor.visit_enum(variant)
            }
            None => Err(Error::new(
                ErrorKind::MissingKey,
                format!("no value for enum {}; use Option to allow it to be absent", name),
            )),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

/// Splits scalar text into trimmed sequence elements. Empty text is an empty
/// sequence.
fn split_scalar(text: &str, delimiter: char) -> Vec<Value> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(delimiter)
        .map(str::trim)
        .filter(|token| !(delimiter.is_whitespace() && token.is_empty()))
        .map(|token| Value::Scalar(token.to_string()))
        .collect()
}

struct SeqDeserializer<'o> {
    iter: std::vec::IntoIter<Value>,
    options: &'o DecodeOptions,
}

impl<'o> SeqDeserializer<'o> {
    fn new(values: Vec<Value>, options: &'o DecodeOptions) -> Self {
        SeqDeserializer {
            iter: values.into_iter(),
            options,
        }
    }
}

impl<'de, 'o> de::SeqAccess<'de> for SeqDeserializer<'o> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed
                .deserialize(Deserializer::nested(Some(value), self.options, None))
                .map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer<'o> {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<(String, Value)>,
    options: &'o DecodeOptions,
}

impl<'o> MapDeserializer<'o> {
    fn new(table: Table, options: &'o DecodeOptions) -> Self {
        MapDeserializer {
            iter: table.into_iter(),
            value: None,
            options,
        }
    }
}

impl<'de, 'o> de::MapAccess<'de> for MapDeserializer<'o> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                let key_value = Value::Scalar(key.clone());
                self.value = Some((key, value));
                seed.deserialize(Deserializer::nested(Some(key_value), self.options, None))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some((key, value)) => seed.deserialize(Deserializer::nested(Some(value), self.options, Some(key))),
            None => Err(Error::custom("Value is missing")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Walks the declared fields of a struct, looking each one up in the table.
///
/// At the root, a field missing from the table is also looked up in the
/// nested table named after the struct (`server.port` for `Server::port`).
/// A field found nowhere in the tree keeps its value from `base`.
struct StructDeserializer<'o> {
    table: Table,
    fallback: Option<Table>,
    base: Table,
    fields: std::slice::Iter<'static, &'static str>,
    value: Option<(String, Option<Value>, Option<Value>)>,
    options: &'o DecodeOptions,
}

impl<'o> StructDeserializer<'o> {
    fn new(
        table: Table,
        base: Table,
        name: &'static str,
        fields: &'static [&'static str],
        root: bool,
        options: &'o DecodeOptions,
    ) -> Self {
        let fallback = if root {
            table
                .get(&name.to_lowercase())
                .and_then(Value::as_table)
                .cloned()
        } else {
            None
        };

        StructDeserializer {
            table,
            fallback,
            base,
            fields: fields.iter(),
            value: None,
            options,
        }
    }
}

impl<'de, 'o> de::MapAccess<'de> for StructDeserializer<'o> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        for field in self.fields.by_ref() {
            let value = self
                .table
                .swap_remove(*field)
                .or_else(|| self.fallback.as_mut().and_then(|t| t.swap_remove(*field)));
            let (value, base) = match (value, self.base.swap_remove(*field)) {
                (None, base) => (base, None),
                (value, base) => (value, base),
            };

            if value.is_none() && !self.options.zero_missing {
                continue;
            }

            self.value = Some((field.to_string(), value, base));
            return seed.deserialize(StringDeserializer(field.to_string())).map(Some);
        }

        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some((field, value, base)) => {
                let mut inner = Deserializer::nested(value, self.options, Some(field));
                inner.base = base;
                seed.deserialize(inner)
            }
            None => Err(Error::custom("Value is missing")),
        }
    }
}

struct EnumDeserializer<'o> {
    variant: String,
    value: Value,
    options: &'o DecodeOptions,
}

impl<'de, 'o> de::EnumAccess<'de> for EnumDeserializer<'o> {
    type Error = Error;
    type Variant = VariantDeserializer<'o>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(StringDeserializer(self.variant))?;
        Ok((
            variant,
            VariantDeserializer {
                value: self.value,
                options: self.options,
            },
        ))
    }
}

struct VariantDeserializer<'o> {
    value: Value,
    options: &'o DecodeOptions,
}

impl<'o> VariantDeserializer<'o> {
    fn inner(self) -> Deserializer<'o> {
        Deserializer::nested(Some(self.value), self.options, None)
    }
}

impl<'de, 'o> de::VariantAccess<'de> for VariantDeserializer<'o> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.inner())
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self.inner(), visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_struct(self.inner(), "", fields, visitor)
    }
}

struct StringDeserializer(String);

impl<'de> de::Deserializer<'de> for StringDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.0)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_truncate_and_saturate() {
        assert_eq!(parse_integer("3.9"), Some(3));
        assert_eq!(parse_integer("1_000"), Some(1000));
        assert_eq!(parse_integer("0x1F"), Some(31));
        assert_eq!(parse_integer("-0b101"), Some(-5));
        assert_eq!(parse_integer("abc"), None);
        assert_eq!(parse_integer("inf"), None);
        assert_eq!(parse_integer("9007199254740993"), Some(9007199254740992));

        let n: u8 = from_value(Value::from("300")).unwrap();
        assert_eq!(n, 255);
        let n: i8 = from_value(Value::from("-300")).unwrap();
        assert_eq!(n, -128);
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("2.5"), Some(2.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("x"), None);
    }

    #[test]
    fn uncoercible_scalars_become_zero() {
        let n: i64 = from_value(Value::from("not a number")).unwrap();
        assert_eq!(n, 0);
        let b: bool = from_value(Value::from("maybe")).unwrap();
        assert!(!b);
    }

    #[test]
    fn split_scalar_trims_tokens() {
        assert_eq!(
            split_scalar(" a , b ,c ", ','),
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
        assert!(split_scalar("  ", ',').is_empty());
        assert_eq!(split_scalar("a  b", ' ').len(), 2);
    }

    #[test]
    fn root_shape_mismatch_is_an_error() {
        let err = from_value::<Vec<String>>(Value::table()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidTargetShape);
    }
}
