//! Department record and the joined view used by the department list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Employee id of the responsible manager; can be assigned later
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub employee_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Display data for a department's manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Display data for a department member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: String,
}

/// Department joined with its manager and members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentWithDetails {
    pub department: Department,
    pub manager: Option<ManagerSummary>,
    pub employees: Vec<MemberSummary>,
    pub employee_count: usize,
}

impl DepartmentWithDetails {
    /// Case-insensitive match on department name or manager name/email
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        if self.department.name.to_lowercase().contains(&term) {
            return true;
        }
        self.manager.as_ref().is_some_and(|m| {
            m.name.to_lowercase().contains(&term) || m.email.to_lowercase().contains(&term)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, manager: Option<(&str, &str)>) -> DepartmentWithDetails {
        DepartmentWithDetails {
            department: Department {
                name: name.to_string(),
                ..Department::default()
            },
            manager: manager.map(|(n, e)| ManagerSummary {
                id: "m1".to_string(),
                name: n.to_string(),
                email: e.to_string(),
            }),
            employees: Vec::new(),
            employee_count: 0,
        }
    }

    #[test]
    fn test_matches_name_and_manager() {
        let d = details("Finance", Some(("Carla Dias", "carla@corp.com")));
        assert!(d.matches("fin"));
        assert!(d.matches("CARLA"));
        assert!(d.matches("corp.com"));
        assert!(d.matches("   "));
        assert!(!d.matches("design"));
    }

    #[test]
    fn test_matches_without_manager() {
        let d = details("Design", None);
        assert!(d.matches("des"));
        assert!(!d.matches("carla"));
    }

    #[test]
    fn test_department_id_not_serialized() {
        let d = Department {
            id: Some("x".to_string()),
            name: "Ops".to_string(),
            ..Department::default()
        };
        let value = serde_json::to_value(&d).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["employeeIds"], serde_json::json!([]));
    }
}
