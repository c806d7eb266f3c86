//! Field-presence type for partial updates.
//!
//! Update requests must distinguish "field omitted" from "field explicitly
//! set to empty/null": presence cannot be inferred from the value, because
//! the empty string is a legitimate new value. `Patch` models the three
//! states and drives the `CASE WHEN present THEN new ELSE old END` update
//! semantics in the store layer.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};

/// A partially-updatable field.
///
/// Annotate struct fields with `#[serde(default)]` so a field absent from
/// the request body deserializes to [`Patch::Missing`]; an explicit JSON
/// `null` becomes [`Patch::Null`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field was not sent; the stored value must be left untouched.
    #[default]
    Missing,
    /// Field was sent as an explicit null.
    Null,
    /// Field was sent with a value (possibly empty).
    Value(T),
}

impl<T> Patch<T> {
    /// Whether the field was sent at all (value or explicit null).
    pub fn is_present(&self) -> bool {
        !matches!(self, Patch::Missing)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Patch::Missing)
    }

    /// The sent value, flattening both `Missing` and `Null` to `None`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }

    /// The pair the store binds for `CASE WHEN $present THEN $value ... `.
    pub fn as_bind(&self) -> (bool, Option<&T>) {
        (self.is_present(), self.value())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Value(value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the field is present in the input; absence is
        // handled by `#[serde(default)]` producing `Missing`.
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Req {
        #[serde(default)]
        name: Patch<String>,
        #[serde(default)]
        address: Patch<String>,
    }

    #[test]
    fn omitted_field_is_missing() {
        let req: Req = serde_json::from_str(r#"{"name": "hq"}"#).unwrap();
        assert_eq!(req.name, Patch::Value("hq".to_string()));
        assert!(req.address.is_missing());
    }

    #[test]
    fn explicit_null_is_present() {
        let req: Req = serde_json::from_str(r#"{"address": null}"#).unwrap();
        assert_eq!(req.address, Patch::Null);
        assert!(req.address.is_present());
    }

    #[test]
    fn empty_string_is_a_value_not_missing() {
        let req: Req = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert_eq!(req.name, Patch::Value(String::new()));
        let (present, value) = req.name.as_bind();
        assert!(present);
        assert_eq!(value.map(String::as_str), Some(""));
    }

    #[test]
    fn bind_pair_for_missing_field() {
        let patch: Patch<String> = Patch::Missing;
        assert_eq!(patch.as_bind(), (false, None));
    }
}
