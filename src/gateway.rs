//! Persistence gateway: the only contract the forms depend on.
//!
//! Each record kind gets one implementation per backend (see
//! [`crate::services`]); tests substitute their own.

use std::fmt;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use thiserror::Error;

use crate::form::SectionedRecord;

/// Operation categories, used to pick the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Load,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Load => "load",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("failed to {operation} {kind}: {message}")]
    Backend {
        operation: Operation,
        kind: &'static str,
        message: String,
    },
}

impl GatewayError {
    pub fn backend(operation: Operation, kind: &'static str, message: impl Into<String>) -> Self {
        GatewayError::Backend {
            operation,
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GatewayError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// One generic message per operation category; details stay in the logs
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::NotFound { kind, .. } => format!("The {kind} no longer exists."),
            GatewayError::Backend {
                operation, kind, ..
            } => match operation {
                Operation::Create | Operation::Update => {
                    format!("Could not save the {kind}. Please try again.")
                }
                Operation::Delete => format!("Could not delete the {kind}. Please try again."),
                Operation::Load => format!("Could not load {kind} records."),
            },
        }
    }
}

/// Outcome of a fan-out delete. Every id is attempted.
#[derive(Debug, Default)]
pub struct BulkDeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, GatewayError)>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.failed.is_empty() {
            format!("{} deleted", self.deleted.len())
        } else {
            format!(
                "{} deleted, {} failed",
                self.deleted.len(),
                self.failed.len()
            )
        }
    }
}

/// Create/update/delete/list over one record kind
#[async_trait]
pub trait Gateway<R: SectionedRecord>: Send + Sync {
    /// Persist a new record and return the backend-assigned identity
    async fn create(&self, record: &R) -> Result<String, GatewayError>;

    async fn update(&self, id: &str, record: &R) -> Result<(), GatewayError>;

    async fn delete(&self, id: &str) -> Result<(), GatewayError>;

    /// Delete every id concurrently. A failure does not stop the others and
    /// nothing is rolled back.
    async fn delete_many(&self, ids: &[String]) -> BulkDeleteReport {
        let results = join_all(ids.iter().map(|id| async move {
            let result = self.delete(id).await;
            (id.clone(), result)
        }))
        .await;

        let mut report = BulkDeleteReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    tracing::warn!(kind = R::KIND, id = %id, error = %e, "bulk delete item failed");
                    report.failed.push((id, e));
                }
            }
        }
        report
    }

    async fn list(&self) -> Result<Vec<R>, GatewayError>;

    /// Records whose `field` (dotted path) equals `value`
    async fn list_by(&self, field: &str, value: Value) -> Result<Vec<R>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Department;
    use std::sync::Mutex;

    /// Records every delete attempt and fails on one id
    struct FlakyGateway {
        fail_on: String,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Gateway<Department> for FlakyGateway {
        async fn create(&self, _record: &Department) -> Result<String, GatewayError> {
            unreachable!()
        }

        async fn update(&self, _id: &str, _record: &Department) -> Result<(), GatewayError> {
            unreachable!()
        }

        async fn delete(&self, id: &str) -> Result<(), GatewayError> {
            self.attempts.lock().unwrap().push(id.to_string());
            if id == self.fail_on {
                Err(GatewayError::backend(Operation::Delete, "department", "boom"))
            } else {
                Ok(())
            }
        }

        async fn list(&self) -> Result<Vec<Department>, GatewayError> {
            Ok(Vec::new())
        }

        async fn list_by(&self, _field: &str, _value: Value) -> Result<Vec<Department>, GatewayError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_delete_many_does_not_short_circuit() {
        let gateway = FlakyGateway {
            fail_on: "b".to_string(),
            attempts: Mutex::new(Vec::new()),
        };
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        let report = gateway.delete_many(&ids).await;

        let mut attempts = gateway.attempts.lock().unwrap().clone();
        attempts.sort();
        assert_eq!(attempts, ids);
        assert_eq!(report.deleted, vec!["a", "c", "d"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b");
        assert!(!report.is_complete());
        assert_eq!(report.summary(), "3 deleted, 1 failed");
    }

    #[test]
    fn test_user_messages_are_generic_per_operation() {
        let save = GatewayError::backend(Operation::Create, "employee", "disk full");
        assert_eq!(save.user_message(), "Could not save the employee. Please try again.");
        assert!(!save.user_message().contains("disk"));

        let update = GatewayError::backend(Operation::Update, "employee", "x");
        assert_eq!(update.user_message(), save.user_message());

        let delete = GatewayError::backend(Operation::Delete, "department", "x");
        assert_eq!(
            delete.user_message(),
            "Could not delete the department. Please try again."
        );
    }
}
