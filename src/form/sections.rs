//! Section layout of the editable records.
//!
//! A record is split into sections, one per wizard step. Each section owns a
//! fixed list of field paths and a pure validator over those fields.

use chrono::NaiveDate;

use super::validation::{
    validate_address_info, validate_department_details, validate_department_manager,
    validate_department_members, validate_job_info, validate_personal_info, FieldErrors,
};
use crate::types::{Department, Employee};

/// One step of a multi-section form
pub trait FormSection: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Sections in wizard order
    fn all() -> &'static [Self];

    fn label(&self) -> &'static str;

    /// Field paths validated by this section
    fn fields(&self) -> &'static [&'static str];

    fn index(&self) -> usize {
        Self::all().iter().position(|s| s == self).unwrap_or(0)
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }
}

/// An aggregate edited section by section and persisted as one document
pub trait SectionedRecord: Clone + Default + Send + Sync + 'static {
    type Section: FormSection;

    /// Label used in log events and user messages ("employee", "department")
    const KIND: &'static str;

    /// Validate one section only
    fn validate_section(&self, section: Self::Section, today: NaiveDate)
        -> Result<(), FieldErrors>;

    /// Validate every section of the aggregate
    fn validate(&self, today: NaiveDate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for section in Self::Section::all() {
            if let Err(section_errors) = self.validate_section(*section, today) {
                errors.extend(section_errors);
            }
        }
        errors.into_result()
    }

    /// First section that fails validation, if any
    fn first_invalid_section(&self, today: NaiveDate) -> Option<Self::Section> {
        Self::Section::all()
            .iter()
            .copied()
            .find(|s| self.validate_section(*s, today).is_err())
    }

    fn identity(&self) -> Option<&str>;

    fn set_identity(&mut self, id: String);
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmployeeSection {
    Personal,
    Address,
    Job,
}

const PERSONAL_FIELDS: &[&str] = &[
    "personalInfo.firstName",
    "personalInfo.lastName",
    "personalInfo.email",
    "personalInfo.phone",
    "personalInfo.birthDate",
    "personalInfo.cpf",
];

const ADDRESS_FIELDS: &[&str] = &[
    "addressInfo.street",
    "addressInfo.number",
    "addressInfo.complement",
    "addressInfo.neighborhood",
    "addressInfo.city",
    "addressInfo.state",
    "addressInfo.zipCode",
];

const JOB_FIELDS: &[&str] = &[
    "jobInfo.position",
    "jobInfo.department",
    "jobInfo.salary",
    "jobInfo.startDate",
    "jobInfo.workSchedule",
    "jobInfo.employmentType",
    "jobInfo.hierarchyLevel",
    "jobInfo.managerId",
];

impl FormSection for EmployeeSection {
    fn all() -> &'static [Self] {
        &[
            EmployeeSection::Personal,
            EmployeeSection::Address,
            EmployeeSection::Job,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            EmployeeSection::Personal => "Personal information",
            EmployeeSection::Address => "Address",
            EmployeeSection::Job => "Job information",
        }
    }

    fn fields(&self) -> &'static [&'static str] {
        match self {
            EmployeeSection::Personal => PERSONAL_FIELDS,
            EmployeeSection::Address => ADDRESS_FIELDS,
            EmployeeSection::Job => JOB_FIELDS,
        }
    }
}

impl SectionedRecord for Employee {
    type Section = EmployeeSection;
    const KIND: &'static str = "employee";

    fn validate_section(&self, section: EmployeeSection, today: NaiveDate) -> Result<(), FieldErrors> {
        match section {
            EmployeeSection::Personal => validate_personal_info(&self.personal_info, today),
            EmployeeSection::Address => validate_address_info(&self.address_info),
            EmployeeSection::Job => validate_job_info(&self.job_info, today),
        }
    }

    fn identity(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_identity(&mut self, id: String) {
        self.id = Some(id);
    }
}

// ─── Department ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepartmentSection {
    Details,
    Manager,
    Members,
}

impl FormSection for DepartmentSection {
    fn all() -> &'static [Self] {
        &[
            DepartmentSection::Details,
            DepartmentSection::Manager,
            DepartmentSection::Members,
        ]
    }

    fn label(&self) -> &'static str {
        match self {
            DepartmentSection::Details => "Details",
            DepartmentSection::Manager => "Manager",
            DepartmentSection::Members => "Members",
        }
    }

    fn fields(&self) -> &'static [&'static str] {
        match self {
            DepartmentSection::Details => &["name", "description"],
            DepartmentSection::Manager => &["managerId"],
            DepartmentSection::Members => &["employeeIds"],
        }
    }
}

impl SectionedRecord for Department {
    type Section = DepartmentSection;
    const KIND: &'static str = "department";

    fn validate_section(
        &self,
        section: DepartmentSection,
        _today: NaiveDate,
    ) -> Result<(), FieldErrors> {
        match section {
            DepartmentSection::Details => validate_department_details(self),
            DepartmentSection::Manager => validate_department_manager(self),
            DepartmentSection::Members => validate_department_members(self),
        }
    }

    fn identity(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_identity(&mut self, id: String) {
        self.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_partial_validation_stays_inside_section() {
        // A blank employee fails every section
        let employee = Employee::default();
        for section in EmployeeSection::all() {
            let errors = employee.validate_section(*section, today()).unwrap_err();
            for field in errors.fields() {
                assert!(
                    section.fields().contains(&field),
                    "{field} reported outside {section:?}"
                );
            }
        }
    }

    #[test]
    fn test_department_partial_validation_stays_inside_section() {
        let department = Department {
            manager_id: Some(String::new()),
            employee_ids: vec!["a".to_string(), "a".to_string()],
            ..Department::default()
        };
        for section in DepartmentSection::all() {
            let errors = department.validate_section(*section, today()).unwrap_err();
            for field in errors.fields() {
                assert!(section.fields().contains(&field));
            }
        }
    }

    #[test]
    fn test_full_validation_merges_sections() {
        let employee = Employee::default();
        let errors = employee.validate(today()).unwrap_err();
        assert!(errors.contains("personalInfo.firstName"));
        assert!(errors.contains("addressInfo.street"));
        assert!(errors.contains("jobInfo.position"));
        assert_eq!(
            employee.first_invalid_section(today()),
            Some(EmployeeSection::Personal)
        );
    }

    #[test]
    fn test_section_index_round_trip() {
        for (i, section) in EmployeeSection::all().iter().enumerate() {
            assert_eq!(section.index(), i);
            assert_eq!(EmployeeSection::from_index(i), Some(*section));
        }
        assert_eq!(EmployeeSection::from_index(3), None);
    }
}
