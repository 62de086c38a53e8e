//! Department persistence over the `departments` collection, plus the joined
//! views the department screens need.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::employees::EmployeeService;
use super::{decode, decode_all, encode, gateway_error, timestamp, update_patch};
use crate::gateway::{Gateway, GatewayError, Operation};
use crate::store::{Direction, DocumentStore, Query};
use crate::types::{Department, DepartmentWithDetails, Employee, ManagerSummary, MemberSummary};

pub const DEPARTMENTS_COLLECTION: &str = "departments";
const KIND: &str = "department";

#[derive(Clone)]
pub struct DepartmentService {
    store: Arc<dyn DocumentStore>,
    employees: EmployeeService,
}

impl DepartmentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let employees = EmployeeService::new(Arc::clone(&store));
        Self { store, employees }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Department>, GatewayError> {
        let doc = self
            .store
            .get(DEPARTMENTS_COLLECTION, id)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        doc.map(decode)
            .transpose()
            .map_err(|e| GatewayError::backend(Operation::Load, KIND, e.to_string()))
    }

    /// Every department joined with its manager and member summaries.
    /// Ids that no longer resolve to an employee are left out of the view.
    pub async fn list_with_details(&self) -> Result<Vec<DepartmentWithDetails>, GatewayError> {
        let departments = self.list().await?;
        let employees: HashMap<String, Employee> = self
            .employees
            .list()
            .await?
            .into_iter()
            .filter_map(|e| e.id.clone().map(|id| (id, e)))
            .collect();

        Ok(departments
            .into_iter()
            .map(|department| join_details(department, &employees))
            .collect())
    }

    /// Departments whose name or manager matches `term`
    pub async fn search(&self, term: &str) -> Result<Vec<DepartmentWithDetails>, GatewayError> {
        Ok(self
            .list_with_details()
            .await?
            .into_iter()
            .filter(|d| d.matches(term))
            .collect())
    }

    /// Employees at manager level, the only valid department managers
    pub async fn available_managers(&self) -> Result<Vec<Employee>, GatewayError> {
        self.employees.managers().await
    }

    /// Add a member. Adding an existing member changes nothing.
    pub async fn add_employee(&self, department_id: &str, employee_id: &str) -> Result<(), GatewayError> {
        let mut department = self.require(department_id).await?;
        if department.employee_ids.iter().any(|id| id == employee_id) {
            return Ok(());
        }
        department.employee_ids.push(employee_id.to_string());
        self.write_members(department_id, &department.employee_ids).await?;
        tracing::info!(department_id, employee_id, "employee added to department");
        Ok(())
    }

    /// Remove a member. Removing an id that is not a member changes nothing.
    pub async fn remove_employee(&self, department_id: &str, employee_id: &str) -> Result<(), GatewayError> {
        let mut department = self.require(department_id).await?;
        let before = department.employee_ids.len();
        department.employee_ids.retain(|id| id != employee_id);
        if department.employee_ids.len() == before {
            return Ok(());
        }
        self.write_members(department_id, &department.employee_ids).await?;
        tracing::info!(department_id, employee_id, "employee removed from department");
        Ok(())
    }

    async fn require(&self, id: &str) -> Result<Department, GatewayError> {
        self.get(id)
            .await?
            .ok_or_else(|| GatewayError::not_found(KIND, id))
    }

    async fn write_members(&self, id: &str, members: &[String]) -> Result<(), GatewayError> {
        let patch = json!({
            "employeeIds": members,
            "updatedAt": timestamp(Utc::now()),
        });
        self.store
            .update(DEPARTMENTS_COLLECTION, id, patch)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Update, e))
    }
}

fn join_details(department: Department, employees: &HashMap<String, Employee>) -> DepartmentWithDetails {
    let manager = department
        .manager_id
        .as_ref()
        .and_then(|id| employees.get(id))
        .map(|e| ManagerSummary {
            id: e.id.clone().unwrap_or_default(),
            name: e.full_name(),
            email: e.personal_info.email.clone(),
        });

    let members: Vec<MemberSummary> = department
        .employee_ids
        .iter()
        .filter_map(|id| employees.get(id))
        .map(|e| MemberSummary {
            id: e.id.clone().unwrap_or_default(),
            name: e.full_name(),
            email: e.personal_info.email.clone(),
            position: e.job_info.position.clone(),
        })
        .collect();

    DepartmentWithDetails {
        employee_count: department.employee_ids.len(),
        department,
        manager,
        employees: members,
    }
}

#[async_trait]
impl Gateway<Department> for DepartmentService {
    async fn create(&self, record: &Department) -> Result<String, GatewayError> {
        let now = Utc::now();
        let mut department = record.clone();
        department.created_at = Some(now);
        department.updated_at = Some(now);

        let data = encode(KIND, Operation::Create, &department)?;
        let id = self
            .store
            .add(DEPARTMENTS_COLLECTION, data)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Create, e))?;
        tracing::info!(id = %id, name = %department.name, "department created");
        Ok(id)
    }

    async fn update(&self, id: &str, record: &Department) -> Result<(), GatewayError> {
        let mut patch = update_patch(KIND, record, Utc::now())?;
        // Cleared optionals must overwrite the stored value on merge
        if let Some(fields) = patch.as_object_mut() {
            for key in ["description", "managerId"] {
                fields.entry(key).or_insert(Value::Null);
            }
        }
        self.store
            .update(DEPARTMENTS_COLLECTION, id, patch)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Update, e))?;
        tracing::info!(id, "department updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        self.store
            .delete(DEPARTMENTS_COLLECTION, id)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Delete, e))?;
        tracing::info!(id, "department deleted");
        Ok(())
    }

    /// Alphabetical by name
    async fn list(&self) -> Result<Vec<Department>, GatewayError> {
        let query = Query::all().order_by("name", Direction::Ascending);
        let docs = self
            .store
            .query(DEPARTMENTS_COLLECTION, &query)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        Ok(decode_all(docs))
    }

    async fn list_by(&self, field: &str, value: Value) -> Result<Vec<Department>, GatewayError> {
        let query = Query::all()
            .where_eq(field, value)
            .order_by("name", Direction::Ascending);
        let docs = self
            .store
            .query(DEPARTMENTS_COLLECTION, &query)
            .await
            .map_err(|e| gateway_error(KIND, Operation::Load, e))?;
        Ok(decode_all(docs))
    }
}
