//! Employee persistence over the `employees` collection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::{decode, decode_all, encode, gateway_error, timestamp, update_patch};
use crate::gateway::{Gateway, GatewayError, Operation};
use crate::store::{Direction, DocumentStore, Query};
use crate::types::{Employee, EmployeeStatus};

pub const EMPLOYEES_COLLECTION: &str = "employees";
const KIND: &str = "employee";

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn DocumentStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Employee>, GatewayError> {
        let doc = self
            .store
            .get(EMPLOYEES_COLLECTION, id)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        doc.map(decode)
            .transpose()
            .map_err(|e| GatewayError::backend(Operation::Load, KIND, e.to_string()))
    }

    /// Flip an employee between active and inactive
    pub async fn set_status(&self, id: &str, status: EmployeeStatus) -> Result<(), GatewayError> {
        let patch = json!({
            "status": status.as_str(),
            "updatedAt": timestamp(Utc::now()),
        });
        self.store
            .update(EMPLOYEES_COLLECTION, id, patch)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Update, e))?;
        tracing::info!(id, status = status.as_str(), "employee status updated");
        Ok(())
    }

    /// Employees eligible to manage a department, newest first
    pub async fn managers(&self) -> Result<Vec<Employee>, GatewayError> {
        let employees = self.list().await?;
        Ok(employees.into_iter().filter(Employee::is_manager).collect())
    }
}

#[async_trait]
impl Gateway<Employee> for EmployeeService {
    async fn create(&self, record: &Employee) -> Result<String, GatewayError> {
        let now = Utc::now();
        let mut employee = record.clone();
        employee.status = EmployeeStatus::Active;
        employee.created_at = Some(now);
        employee.updated_at = Some(now);

        let data = encode(KIND, Operation::Create, &employee)?;
        let id = self
            .store
            .add(EMPLOYEES_COLLECTION, data)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Create, e))?;
        tracing::info!(id = %id, "employee created");
        Ok(id)
    }

    async fn update(&self, id: &str, record: &Employee) -> Result<(), GatewayError> {
        let patch = update_patch(KIND, record, Utc::now())?;
        self.store
            .update(EMPLOYEES_COLLECTION, id, patch)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Update, e))?;
        tracing::info!(id, "employee updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.store
            .delete(EMPLOYEES_COLLECTION, id)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Delete, e))?;
        tracing::info!(id, "employee deleted");
        Ok(())
    }

    /// Newest first
    async fn list(&self) -> Result<Vec<Employee>, GatewayError> {
        let query = Query::all().order_by("createdAt", Direction::Descending);
        let docs = self
            .store
            .query(EMPLOYEES_COLLECTION, &query)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        Ok(decode_all(docs))
    }

    async fn list_by(&self, field: &str, value: Value) -> Result<Vec<Employee>, GatewayError> {
        let query = Query::all().where_eq(field, value);
        let docs = self
            .store
            .query(EMPLOYEES_COLLECTION, &query)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        Ok(decode_all(docs))
    }
}
