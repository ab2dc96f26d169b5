use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::DealerApiError;

const COLLECTION_KEYS: [&str; 3] = ["rows", "docs", "entries"];

/// Flattens any of the envelopes produced by the cloud functions into bare documents.
///
/// Accepted shapes: `{"rows":[{"doc":{..}}]}`, `{"docs":[..]}`, `{"entries":[..]}`,
/// each optionally nested under `"body"`, or a bare array.
pub(crate) fn documents(payload: Value) -> Result<Vec<Value>, DealerApiError> {
    let items = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(mut map) => {
            if let Some(body) = map.remove("body") {
                return documents(body);
            }
            if let Some(Value::String(message)) = map.get("error") {
                return Err(DealerApiError::Envelope(format!(
                    "upstream reported error: {message}"
                )));
            }

            match COLLECTION_KEYS.iter().find_map(|key| map.remove(*key)) {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => return Ok(Vec::new()),
                Some(other) => {
                    return Err(DealerApiError::Envelope(format!(
                        "expected an array of documents, got {}",
                        kind(&other)
                    )))
                }
                None => {
                    return Err(DealerApiError::Envelope(
                        "response carries no rows, docs or entries".to_string(),
                    ))
                }
            }
        }
        other => {
            return Err(DealerApiError::Envelope(format!(
                "unexpected {} payload",
                kind(&other)
            )))
        }
    };

    Ok(items
        .into_iter()
        .map(unwrap_row)
        .filter(|doc| !is_design_document(doc))
        .collect())
}

/// Decodes each document, reporting the position of the first one that fails.
pub(crate) fn decode<T: DeserializeOwned>(documents: Vec<Value>) -> Result<Vec<T>, DealerApiError> {
    documents
        .into_iter()
        .enumerate()
        .map(|(index, doc)| {
            serde_json::from_value(doc).map_err(|source| DealerApiError::Record { index, source })
        })
        .collect()
}

fn unwrap_row(row: Value) -> Value {
    match row {
        Value::Object(mut map) if map.contains_key("doc") => {
            map.remove("doc").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_design_document(doc: &Value) -> bool {
    doc.get("_id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with("_design/"))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
