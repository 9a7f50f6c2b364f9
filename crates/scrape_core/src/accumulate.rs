use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MergeError, ProceedPaths};

/// The decoded `data` object of one executor call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageResponse {
    pub data: Map<String, Value>,
}

impl PageResponse {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    /// Number of list items at `field`; a `null` list counts as empty.
    pub fn item_count(&self, field: &str) -> Result<usize, MergeError> {
        match self.data.get(field) {
            Some(Value::Array(items)) => Ok(items.len()),
            Some(Value::Null) => Ok(0),
            Some(other) => Err(MergeError::NotAList {
                field: field.to_string(),
                found: kind_of(other),
            }),
            None => Err(MergeError::MissingField {
                field: field.to_string(),
            }),
        }
    }

    pub fn last_item(&self, field: &str) -> Option<&Value> {
        self.data
            .get(field)
            .and_then(Value::as_array)
            .and_then(|items| items.last())
    }
}

/// Caller-visible merge of every page fetched so far in one generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccumulatedResult {
    fields: Map<String, Value>,
}

impl AccumulatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Items accumulated at `field`, empty when the field is absent or not a list.
    pub fn items(&self, field: &str) -> &[Value] {
        self.fields
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Folds one page into the accumulated result.
///
/// Proceed-path lists are appended after what is already there; every other
/// field is replaced by the page's value. Fields the page does not carry are
/// left alone. No deduplication happens here: the caller decides which pages
/// get merged and in what order.
pub fn merge(
    mut current: AccumulatedResult,
    page: &PageResponse,
    paths: &ProceedPaths,
) -> Result<AccumulatedResult, MergeError> {
    for (field, value) in &page.data {
        if !paths.contains(field) {
            current.fields.insert(field.clone(), value.clone());
            continue;
        }

        let incoming = match value {
            Value::Array(items) => items.as_slice(),
            Value::Null => &[],
            other => {
                return Err(MergeError::NotAList {
                    field: field.clone(),
                    found: kind_of(other),
                })
            }
        };

        match current.fields.get_mut(field) {
            Some(Value::Array(existing)) => existing.extend(incoming.iter().cloned()),
            _ => {
                current
                    .fields
                    .insert(field.clone(), Value::Array(incoming.to_vec()));
            }
        }
    }
    Ok(current)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
