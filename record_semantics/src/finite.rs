//! Record Semantics: Non-finite Number Scan
//!
//! JSON has no spelling for NaN or ±Infinity; `serde_json` writes them as
//! `null`, and a field that accepts `null` then decodes them as something
//! else. `check_finite` walks any serializable record before it is encoded
//! and reports the first such float with its location.
//!
//! Paths follow the dynamic model: `$`, `$.occupation.title`, `$.scores[1]`.

use std::fmt::Display;

use serde::ser::{self, Serialize};
use thiserror::Error;

use crate::error::{CopyError, UnsupportedKind};

/// Fail with `UnsupportedValue` at the first non-finite float in `record`.
pub fn check_finite<T: Serialize + ?Sized>(record: &T) -> Result<(), CopyError> {
    match record.serialize(Scanner::at("$".to_string())) {
        Ok(()) => Ok(()),
        Err(ScanError::NonFinite(path)) => Err(CopyError::unsupported(
            path,
            UnsupportedKind::NonFiniteNumber,
        )),
        Err(ScanError::Custom(msg)) => Err(CopyError::Encode(
            <serde_json::Error as ser::Error>::custom(msg),
        )),
    }
}

/// `$.name` for identifier keys, `$["first name"]` otherwise.
pub(crate) fn child_path(path: &str, key: &str) -> String {
    let identifier = key
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        format!("{}.{}", path, key)
    } else {
        format!("{}[{}]", path, serde_json::Value::String(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum ScanError {
    #[error("non-finite number at {0}")]
    NonFinite(String),
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for ScanError {
    fn custom<M: Display>(msg: M) -> Self {
        ScanError::Custom(msg.to_string())
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Serializer that produces nothing and only inspects floats.
struct Scanner {
    path: String,
}

impl Scanner {
    fn at(path: String) -> Self {
        Self { path }
    }

    fn float(self, n: f64) -> Result<(), ScanError> {
        if n.is_finite() {
            Ok(())
        } else {
            Err(ScanError::NonFinite(self.path))
        }
    }

    fn compound(self) -> Compound {
        Compound {
            path: self.path,
            index: 0,
            key: None,
        }
    }

    fn compound_under(self, variant: &str) -> Compound {
        Compound {
            path: child_path(&self.path, variant),
            index: 0,
            key: None,
        }
    }
}

impl ser::Serializer for Scanner {
    type Ok = ();
    type Error = ScanError;
    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Compound;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, _v: bool) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_i8(self, _v: i8) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_i16(self, _v: i16) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_i32(self, _v: i32) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_i64(self, _v: i64) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_u8(self, _v: u8) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_u16(self, _v: u16) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_u32(self, _v: u32) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_u64(self, _v: u64) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<(), ScanError> {
        self.float(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), ScanError> {
        self.float(v)
    }

    fn serialize_char(self, _v: char) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_str(self, _v: &str) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), ScanError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), ScanError> {
        Ok(())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), ScanError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), ScanError> {
        value.serialize(Scanner::at(child_path(&self.path, variant)))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound, ScanError> {
        Ok(self.compound())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound, ScanError> {
        Ok(self.compound())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound, ScanError> {
        Ok(self.compound())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound, ScanError> {
        Ok(self.compound_under(variant))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound, ScanError> {
        Ok(self.compound())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound, ScanError> {
        Ok(self.compound())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Compound, ScanError> {
        Ok(self.compound_under(variant))
    }
}

// ---------------------------------------------------------------------------
// Compound values
// ---------------------------------------------------------------------------

struct Compound {
    path: String,
    index: usize,
    /// Map key waiting for its value.
    key: Option<String>,
}

impl Compound {
    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        let path = format!("{}[{}]", self.path, self.index);
        self.index += 1;
        value.serialize(Scanner::at(path))
    }

    fn field<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), ScanError> {
        value.serialize(Scanner::at(child_path(&self.path, key)))
    }
}

/// Map keys as JSON would spell them.
fn key_label<T: Serialize + ?Sized>(key: &T) -> Result<String, ScanError> {
    match serde_json::to_value(key) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Ok(other.to_string()),
        Err(e) => Err(ScanError::Custom(e.to_string())),
    }
}

impl ser::SerializeSeq for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        self.element(value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        self.element(value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        self.element(value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        self.element(value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ScanError> {
        self.key = Some(key_label(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ScanError> {
        let key = self.key.take().unwrap_or_default();
        self.field(&key, value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ScanError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound {
    type Ok = ();
    type Error = ScanError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ScanError> {
        self.field(key, value)
    }

    fn end(self) -> Result<(), ScanError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use serde::Serialize;

    #[derive(Serialize)]
    struct Sensor {
        id: String,
        readings: Vec<f64>,
        calibration: Option<f32>,
    }

    #[derive(Serialize)]
    enum Signal {
        Level(f64),
        Pair(f64, f64),
        Window { low: f64, high: f64 },
    }

    fn unsupported_path(result: Result<(), CopyError>) -> String {
        match result {
            Err(CopyError::UnsupportedValue { path, kind }) => {
                assert_eq!(kind, UnsupportedKind::NonFiniteNumber);
                path
            }
            other => panic!("Expected UnsupportedValue, got: {:?}", other),
        }
    }

    #[test]
    fn finite_record_passes() {
        let sensor = Sensor {
            id: "s1".to_string(),
            readings: vec![0.5, -2.0],
            calibration: Some(1.0),
        };
        assert!(check_finite(&sensor).is_ok());
    }

    #[test]
    fn reports_list_entry_path() {
        let sensor = Sensor {
            id: "s1".to_string(),
            readings: vec![0.5, f64::INFINITY],
            calibration: None,
        };
        assert_eq!(unsupported_path(check_finite(&sensor)), "$.readings[1]");
    }

    #[test]
    fn reports_optional_f32() {
        let sensor = Sensor {
            id: "s1".to_string(),
            readings: Vec::new(),
            calibration: Some(f32::NAN),
        };
        assert_eq!(unsupported_path(check_finite(&sensor)), "$.calibration");
    }

    #[test]
    fn reports_map_value_by_key() {
        let mut scores = BTreeMap::new();
        scores.insert("first name".to_string(), f64::NEG_INFINITY);
        assert_eq!(
            unsupported_path(check_finite(&scores)),
            "$[\"first name\"]"
        );
    }

    #[test]
    fn reports_enum_variant_paths() {
        assert_eq!(unsupported_path(check_finite(&Signal::Level(f64::NAN))), "$.Level");
        assert_eq!(
            unsupported_path(check_finite(&Signal::Pair(1.0, f64::NAN))),
            "$.Pair[1]"
        );
        assert_eq!(
            unsupported_path(check_finite(&Signal::Window {
                low: 0.0,
                high: f64::INFINITY
            })),
            "$.Window.high"
        );
    }

    #[test]
    fn reports_bare_float_at_root() {
        assert_eq!(unsupported_path(check_finite(&f64::NAN)), "$");
    }
}
