//! Record types edited by the forms and persisted through the gateways.

mod department;
mod employee;

pub use department::{Department, DepartmentWithDetails, ManagerSummary, MemberSummary};
pub use employee::{
    AddressInfo, Employee, EmployeeStatus, HierarchyLevel, JobInfo, PersonalInfo,
    DEPARTMENT_OPTIONS, EMPLOYMENT_TYPES, STATE_CODES, WORK_SCHEDULES,
};
