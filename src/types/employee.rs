//! Employee record and its three form sections.
//!
//! Documents are stored camelCase so field-path queries such as
//! `jobInfo.hierarchyLevel` match what the wizard writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employment contract types accepted by the job section
pub const EMPLOYMENT_TYPES: &[&str] = &["CLT", "PJ", "Intern", "Freelancer"];

/// Departments offered by the job section picker
pub const DEPARTMENT_OPTIONS: &[&str] = &[
    "Technology",
    "Design",
    "Marketing",
    "Sales",
    "Finance",
    "Human Resources",
    "Product",
    "Operations",
    "Customer Support",
    "Administration",
];

/// Work schedules offered by the job section picker
pub const WORK_SCHEDULES: &[&str] = &[
    "08:00 - 17:00",
    "09:00 - 18:00",
    "10:00 - 19:00",
    "Remote",
    "Hybrid",
    "Flexible",
];

/// Brazilian federative units (UF codes)
pub const STATE_CODES: &[&str] = &[
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Formatted as `(99) 99999-9999`
    pub phone: String,
    /// ISO date (`YYYY-MM-DD`) as typed into the form
    pub birth_date: String,
    /// Formatted as `999.999.999-99`
    pub cpf: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter UF code
    pub state: String,
    /// Formatted as `99999-999`
    pub zip_code: String,
}

/// Seniority inside the company. Managers can lead departments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    #[default]
    Junior,
    Mid,
    Senior,
    Manager,
}

impl HierarchyLevel {
    pub fn all() -> &'static [HierarchyLevel] {
        &[
            HierarchyLevel::Junior,
            HierarchyLevel::Mid,
            HierarchyLevel::Senior,
            HierarchyLevel::Manager,
        ]
    }

    /// Value as stored in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Junior => "junior",
            HierarchyLevel::Mid => "mid",
            HierarchyLevel::Senior => "senior",
            HierarchyLevel::Manager => "manager",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str() == value)
    }
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub position: String,
    pub department: String,
    /// Monthly salary in reais. Formatting is a display concern only.
    pub salary: f64,
    /// ISO date (`YYYY-MM-DD`)
    pub start_date: String,
    pub work_schedule: String,
    /// One of [`EMPLOYMENT_TYPES`]
    pub employment_type: String,
    #[serde(default)]
    pub hierarchy_level: HierarchyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            EmployeeStatus::Active => EmployeeStatus::Inactive,
            EmployeeStatus::Inactive => EmployeeStatus::Active,
        }
    }
}

/// The employee aggregate edited by the registration wizard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Backend-assigned identity; `None` until first persisted
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    pub personal_info: PersonalInfo,
    pub address_info: AddressInfo,
    pub job_info: JobInfo,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        self.personal_info.full_name()
    }

    pub fn is_manager(&self) -> bool {
        self.job_info.hierarchy_level == HierarchyLevel::Manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_serializes_camel_case_without_id() {
        let mut employee = Employee::default();
        employee.id = Some("abc".to_string());
        employee.personal_info.first_name = "Ana".to_string();
        employee.job_info.hierarchy_level = HierarchyLevel::Manager;

        let value = serde_json::to_value(&employee).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["personalInfo"]["firstName"], "Ana");
        assert_eq!(value["jobInfo"]["hierarchyLevel"], "manager");
        assert_eq!(value["status"], "active");
    }

    #[test]
    fn test_employee_deserializes_with_missing_optional_fields() {
        let json = serde_json::json!({
            "personalInfo": {
                "firstName": "Ana", "lastName": "Souza", "email": "ana@example.com",
                "phone": "(11) 91234-5678", "birthDate": "1990-01-01", "cpf": "529.982.247-25"
            },
            "addressInfo": {
                "street": "Rua Augusta", "number": "100", "neighborhood": "Centro",
                "city": "São Paulo", "state": "SP", "zipCode": "01000-000"
            },
            "jobInfo": {
                "position": "Engineer", "department": "Technology", "salary": 5000.0,
                "startDate": "2030-01-01", "workSchedule": "Remote", "employmentType": "CLT"
            }
        });

        let employee: Employee = serde_json::from_value(json).unwrap();
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.job_info.hierarchy_level, HierarchyLevel::Junior);
        assert!(employee.address_info.complement.is_none());
        assert_eq!(employee.full_name(), "Ana Souza");
    }

    #[test]
    fn test_hierarchy_level_round_trips_through_str() {
        for level in HierarchyLevel::all() {
            assert_eq!(HierarchyLevel::from_str_opt(level.as_str()), Some(*level));
        }
        assert_eq!(HierarchyLevel::from_str_opt("ceo"), None);
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(EmployeeStatus::Active.toggled(), EmployeeStatus::Inactive);
        assert_eq!(EmployeeStatus::Inactive.toggled(), EmployeeStatus::Active);
    }
}
