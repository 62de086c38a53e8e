//! Record services: the gateway implementations over the document store.

mod departments;
mod employees;

pub use departments::DepartmentService;
pub use employees::EmployeeService;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::form::SectionedRecord;
use crate::gateway::{GatewayError, Operation};
use crate::store::{Document, StoreError};

/// Translate a store failure into the gateway's error vocabulary
pub(crate) fn gateway_error(kind: &'static str, operation: Operation, err: StoreError) -> GatewayError {
    match err {
        StoreError::NotFound { id, .. } => GatewayError::not_found(kind, id),
        other => {
            tracing::error!(kind, %operation, error = %other, "document store call failed");
            GatewayError::backend(operation, kind, other.to_string())
        }
    }
}

/// Serialise a record into a document body
pub(crate) fn encode<R: Serialize>(kind: &'static str, operation: Operation, record: &R) -> Result<Value, GatewayError> {
    serde_json::to_value(record)
        .map_err(|e| GatewayError::backend(operation, kind, format!("cannot encode record: {e}")))
}

/// Document body for an update: creation time is immutable, modification
/// time is stamped now
pub(crate) fn update_patch<R: Serialize>(
    kind: &'static str,
    record: &R,
    now: DateTime<Utc>,
) -> Result<Value, GatewayError> {
    let mut patch = encode(kind, Operation::Update, record)?;
    if let Some(fields) = patch.as_object_mut() {
        fields.remove("createdAt");
        fields.insert("updatedAt".to_string(), timestamp(now));
    }
    Ok(patch)
}

pub(crate) fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

/// Decode one document, attaching its id as the record identity
pub(crate) fn decode<R: SectionedRecord + DeserializeOwned>(doc: Document) -> Result<R, serde_json::Error> {
    let mut record: R = serde_json::from_value(doc.data)?;
    record.set_identity(doc.id);
    Ok(record)
}

/// Decode a query result. Malformed documents are logged and skipped so one
/// bad entry does not hide the rest of the list.
pub(crate) fn decode_all<R: SectionedRecord + DeserializeOwned>(docs: Vec<Document>) -> Vec<R> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match decode(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(kind = R::KIND, id = %id, error = %e, "skipping malformed document");
                    None
                }
            }
        })
        .collect()
}
