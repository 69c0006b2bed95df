use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::Value;

use crate::element::{FileHandle, InputElement, InputKind};
use crate::field::{FieldName, RegisterOptions};

/// A raw captured input value. Absence of a field from [`FieldValues`]
/// models "no value captured yet".
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Files(Vec<FileHandle>),
}

pub type FieldValues = IndexMap<FieldName, FieldValue>;

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileHandle]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(value) => Value::String(value.clone()),
            // Non-finite numbers have no JSON representation.
            Self::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Bool(value) => Value::Bool(*value),
            Self::Date(value) => Value::String(value.format("%Y-%m-%d").to_string()),
            Self::Files(files) => Value::Array(
                files
                    .iter()
                    .map(|file| Value::String(file.name().to_string()))
                    .collect(),
            ),
        }
    }
}

/// Bridge for resolvers that validate JSON documents.
pub fn values_to_json(values: &FieldValues) -> Value {
    let mut object = serde_json::Map::new();
    for (name, value) in values {
        object.insert(name.to_string(), value.to_json());
    }
    Value::Object(object)
}

/// Reads the current value off a bound element, applying the field's
/// registered coercions. `None` means nothing should be stored (an
/// unparseable date, mirroring a null `valueAsDate`).
pub(crate) fn extract_value(
    element: &dyn InputElement,
    options: RegisterOptions,
) -> Option<FieldValue> {
    match element.kind() {
        InputKind::File => Some(FieldValue::Files(element.files())),
        InputKind::Checkbox => Some(FieldValue::Bool(element.checked())),
        InputKind::Text => {
            let raw = element.value();
            if options.value_as_number {
                // An unparseable or empty value reads as NaN, like the
                // DOM's valueAsNumber.
                Some(FieldValue::Number(raw.trim().parse().unwrap_or(f64::NAN)))
            } else if options.value_as_date {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .ok()
                    .map(FieldValue::Date)
            } else {
                Some(FieldValue::Text(raw))
            }
        }
    }
}
