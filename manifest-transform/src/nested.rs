//! Path based access into untyped documents.
//!
//! Lookups distinguish three outcomes: the field is absent (`Ok(None)`), the field is present
//! with the requested shape (`Ok(Some(..))`), or something along the way has the wrong shape
//! (`Err(FieldError)`). An explicit `null` is treated the same as an absent field.

use core::fmt;

use serde_json::Value;

use crate::resource::Object;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl FieldError {
    pub fn wrong_type(path: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        FieldError::WrongType {
            path: path.into(),
            expected,
            found: type_name(found),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::WrongType {
                path,
                expected,
                found,
            } => write!(f, "`{path}` is of type {found}, expected {expected}"),
        }
    }
}

impl std::error::Error for FieldError {}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

pub trait JsonValue {
    const NAME: &'static str;

    fn try_as_ref(value: &Value) -> Option<&Self>;

    fn try_as_mut(value: &mut Value) -> Option<&mut Self>;
}

impl JsonValue for Value {
    const NAME: &'static str = "any";

    fn try_as_ref(value: &Value) -> Option<&Self> {
        Some(value)
    }

    fn try_as_mut(value: &mut Value) -> Option<&mut Self> {
        Some(value)
    }
}

impl JsonValue for Object {
    const NAME: &'static str = "mapping";

    fn try_as_ref(value: &Value) -> Option<&Self> {
        value.as_object()
    }

    fn try_as_mut(value: &mut Value) -> Option<&mut Self> {
        value.as_object_mut()
    }
}

impl JsonValue for Vec<Value> {
    const NAME: &'static str = "sequence";

    fn try_as_ref(value: &Value) -> Option<&Self> {
        value.as_array()
    }

    fn try_as_mut(value: &mut Value) -> Option<&mut Self> {
        value.as_array_mut()
    }
}

impl JsonValue for String {
    const NAME: &'static str = "string";

    fn try_as_ref(value: &Value) -> Option<&Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn try_as_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// View `value` as a `T`, `path` is only evaluated to describe the value on failure.
pub fn cast<T: JsonValue>(value: &Value, path: impl FnOnce() -> String) -> Result<&T, FieldError> {
    T::try_as_ref(value).ok_or_else(|| FieldError::wrong_type(path(), T::NAME, value))
}

pub fn cast_mut<T: JsonValue>(
    value: &mut Value,
    path: impl FnOnce() -> String,
) -> Result<&mut T, FieldError> {
    let found = type_name(value);
    T::try_as_mut(value).ok_or_else(|| FieldError::WrongType {
        path: path(),
        expected: T::NAME,
        found,
    })
}

pub fn get<'a, T: JsonValue>(obj: &'a Object, path: &[&str]) -> Result<Option<&'a T>, FieldError> {
    let Some((field, parents)) = path.split_last() else {
        return Ok(None);
    };

    let mut curr = obj;
    for (i, parent) in parents.iter().enumerate() {
        curr = match curr.get(*parent) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(next)) => next,
            Some(other) => {
                return Err(FieldError::wrong_type(
                    path[..=i].join("."),
                    "mapping",
                    other,
                ));
            }
        };
    }

    match curr.get(*field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => cast(value, || path.join(".")).map(Some),
    }
}

pub fn get_mut<'a, T: JsonValue>(
    obj: &'a mut Object,
    path: &[&str],
) -> Result<Option<&'a mut T>, FieldError> {
    let Some((field, parents)) = path.split_last() else {
        return Ok(None);
    };

    let mut curr = obj;
    for (i, parent) in parents.iter().enumerate() {
        curr = match curr.get_mut(*parent) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(next)) => next,
            Some(other) => {
                return Err(FieldError::wrong_type(
                    path[..=i].join("."),
                    "mapping",
                    other,
                ));
            }
        };
    }

    match curr.get_mut(*field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => cast_mut(value, || path.join(".")).map(Some),
    }
}

/// Set the field at `path` to `value`, creating intermediate mappings where they are missing.
pub fn set(obj: &mut Object, path: &[&str], value: Value) -> Result<(), FieldError> {
    let Some((field, parents)) = path.split_last() else {
        return Ok(());
    };

    let mut curr = obj;
    for (i, parent) in parents.iter().enumerate() {
        let next = curr
            .entry(*parent)
            .or_insert_with(|| Value::Object(Object::new()));
        if next.is_null() {
            *next = Value::Object(Object::new());
        }

        curr = match next {
            Value::Object(next) => next,
            other => {
                return Err(FieldError::wrong_type(
                    path[..=i].join("."),
                    "mapping",
                    other,
                ));
            }
        };
    }

    curr.insert(field.to_string(), value);
    Ok(())
}
