//! Converting Rust values into tree values.
//!
//! Every leaf becomes text. `None` and unit values have no text form, so
//! struct fields and map entries holding them are left out.

use crate::error::{Error, Result};
use crate::value::{Table, Value};
use serde::ser;

/// Serializes `value` into a [`Value`].
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use hyconf::{to_value, Value};
///
/// #[derive(Serialize)]
/// struct Server {
///     host: String,
///     port: u16,
///     proxy: Option<String>,
/// }
///
/// let value = to_value(&Server { host: "web".into(), port: 8080, proxy: None }).unwrap();
/// assert_eq!(value.pointer("port"), Some(&Value::from("8080")));
/// assert_eq!(value.pointer("proxy"), None);
/// ```
pub fn to_value<T: ser::Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(value.serialize(ValueSerializer)?.unwrap_or_default())
}

fn to_entry<T: ser::Serialize + ?Sized>(value: &T) -> Result<Option<Value>> {
    value.serialize(ValueSerializer)
}

fn scalar(text: impl ToString) -> Result<Option<Value>> {
    Ok(Some(Value::Scalar(text.to_string())))
}

fn variant_table(variant: &str, value: Value) -> Value {
    let mut table = Table::new();
    table.insert(variant.to_string(), value);
    Value::Table(table)
}

struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = MapSerializer;
    type SerializeStructVariant = MapSerializer;

    fn serialize_bool(self, v: bool) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_f64(self, v: f64) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_char(self, v: char) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<Option<Value>> {
        scalar(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<Value>> {
        scalar(String::from_utf8_lossy(v))
    }

    fn serialize_none(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_some<T: ?Sized + ser::Serialize>(self, value: &T) -> Result<Option<Value>> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<Value>> {
        scalar(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + ser::Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<Value>> {
        Ok(Some(variant_table(variant, to_value(value)?)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            elements: Vec::with_capacity(len.unwrap_or(0)),
            variant: None,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            elements: Vec::with_capacity(len),
            variant: Some(variant),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer {
            entries: Table::new(),
            current_key: None,
            variant: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapSerializer> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<MapSerializer> {
        Ok(MapSerializer {
            entries: Table::new(),
            current_key: None,
            variant: Some(variant),
        })
    }
}

struct SeqSerializer {
    elements: Vec<Value>,
    variant: Option<&'static str>,
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T: ?Sized + ser::Serialize>(&mut self, value: &T) -> Result<()> {
        self.elements.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Option<Value>> {
        let list = Value::List(self.elements);
        Ok(Some(match self.variant {
            Some(variant) => variant_table(variant, list),
            None => list,
        }))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T: ?Sized + ser::Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: ?Sized + ser::Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: ?Sized + ser::Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeSeq::end(self)
    }
}

struct MapSerializer {
    entries: Table,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_key<T: ?Sized + ser::Serialize>(&mut self, key: &T) -> Result<()> {
        match to_entry(key)? {
            Some(Value::Scalar(key)) => {
                self.current_key = Some(key);
                Ok(())
            }
            _ => Err(Error::custom("map keys must be strings or primitives")),
        }
    }

    fn serialize_value<T: ?Sized + ser::Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without key"))?;
        if let Some(value) = to_entry(value)? {
            self.entries.insert(key, value);
        }
        Ok(())
    }

    fn end(self) -> Result<Option<Value>> {
        let table = Value::Table(self.entries);
        Ok(Some(match self.variant {
            Some(variant) => variant_table(variant, table),
            None => table,
        }))
    }
}

impl ser::SerializeStruct for MapSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: ?Sized + ser::Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        if let Some(value) = to_entry(value)? {
            self.entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeMap::end(self)
    }
}

impl ser::SerializeStructVariant for MapSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T: ?Sized + ser::Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Option<Value>> {
        ser::SerializeMap::end(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(u32),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn leaves_become_text() {
        assert_eq!(to_value(&true).unwrap(), Value::from("true"));
        assert_eq!(to_value(&-7i32).unwrap(), Value::from("-7"));
        assert_eq!(to_value(&2.5f64).unwrap(), Value::from("2.5"));
        assert_eq!(to_value(&vec![1u8, 2]).unwrap(), Value::from(vec!["1", "2"]));
    }

    #[test]
    fn absent_entries_are_skipped() {
        let mut map = BTreeMap::new();
        map.insert("a", Some(1));
        map.insert("b", None);
        let value = to_value(&map).unwrap();
        assert_eq!(value.as_table().map(|t| t.len()), Some(1));
    }

    #[test]
    fn enum_variants() {
        assert_eq!(to_value(&Shape::Dot).unwrap(), Value::from("Dot"));
        assert_eq!(
            to_value(&Shape::Circle(3)).unwrap().pointer("Circle"),
            Some(&Value::from("3"))
        );
        assert_eq!(
            to_value(&Shape::Rect { w: 1, h: 2 }).unwrap().pointer("Rect.h"),
            Some(&Value::from("2"))
        );
    }

    #[test]
    fn map_keys_must_be_scalars() {
        let mut map = BTreeMap::new();
        map.insert(vec![1], 1);
        assert!(to_value(&map).is_err());
    }
}
