//! Per-section validation rules.
//!
//! Every validator is synchronous and pure: it reads one section (plus the
//! reference date) and returns `Ok(())` or a map of field path to message.
//! Each field reports only its first failing rule.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AddressInfo, Department, JobInfo, PersonalInfo, EMPLOYMENT_TYPES, STATE_CODES};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d{2}\)\s\d{4,5}-\d{4}$").expect("phone regex"));
static CPF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("cpf regex"));
static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}-\d{3}$").expect("zip regex"));

pub const MIN_AGE_YEARS: i32 = 18;
pub const MIN_SALARY: f64 = 1_000.0;
pub const MAX_SALARY: f64 = 1_000_000.0;

// ─── Field errors ────────────────────────────────────────────────────────────

/// Field path → human-readable message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error unless the field already has one
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

// ─── Rule chain ──────────────────────────────────────────────────────────────

/// Rule chain for one string field. The first failing rule wins and the
/// remaining rules are skipped.
struct Check<'a> {
    field: &'static str,
    value: &'a str,
    error: Option<String>,
    done: bool,
}

fn check<'a>(field: &'static str, value: &'a str) -> Check<'a> {
    Check {
        field,
        value,
        error: None,
        done: false,
    }
}

impl Check<'_> {
    fn rule(mut self, ok: impl FnOnce(&str) -> bool, message: &str) -> Self {
        if !self.done && !ok(self.value) {
            self.error = Some(message.to_string());
            self.done = true;
        }
        self
    }

    fn required(self, message: &str) -> Self {
        self.rule(|v| !v.trim().is_empty(), message)
    }

    /// Stop checking when the value is empty
    fn optional(mut self) -> Self {
        if self.value.trim().is_empty() {
            self.done = true;
        }
        self
    }

    /// Length rules ignore surrounding whitespace
    fn min_len(self, min: usize, message: &str) -> Self {
        self.rule(|v| v.trim().chars().count() >= min, message)
    }

    fn max_len(self, max: usize, message: &str) -> Self {
        self.rule(|v| v.trim().chars().count() <= max, message)
    }

    fn exact_len(self, len: usize, message: &str) -> Self {
        self.rule(|v| v.chars().count() == len, message)
    }

    fn matches(self, re: &Regex, message: &str) -> Self {
        self.rule(|v| re.is_match(v), message)
    }

    fn one_of(self, options: &[&str], message: &str) -> Self {
        self.rule(|v| options.contains(&v), message)
    }

    fn report(self, errors: &mut FieldErrors) {
        if let Some(message) = self.error {
            errors.insert(self.field, message);
        }
    }
}

// ─── Business rules ──────────────────────────────────────────────────────────

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Completed years between `birth` and `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// CPF check-digit validation (two-pass mod 11).
///
/// Non-digits are ignored. Eleven identical digits are rejected even though
/// their check digits are arithmetically consistent.
pub fn is_valid_cpf(value: &str) -> bool {
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check_digit = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 | 11 => 0,
            r => r,
        }
    };

    check_digit(9) == digits[9] && check_digit(10) == digits[10]
}

// ─── Employee sections ───────────────────────────────────────────────────────

pub fn validate_personal_info(info: &PersonalInfo, today: NaiveDate) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check("personalInfo.firstName", &info.first_name)
        .required("First name is required")
        .min_len(2, "First name must have at least 2 characters")
        .max_len(50, "First name must have at most 50 characters")
        .report(&mut errors);

    check("personalInfo.lastName", &info.last_name)
        .required("Last name is required")
        .min_len(2, "Last name must have at least 2 characters")
        .max_len(50, "Last name must have at most 50 characters")
        .report(&mut errors);

    check("personalInfo.email", &info.email)
        .required("Email is required")
        .matches(&EMAIL_RE, "Email must be a valid address")
        .report(&mut errors);

    check("personalInfo.phone", &info.phone)
        .required("Phone is required")
        .matches(&PHONE_RE, "Phone must use the format (99) 99999-9999")
        .report(&mut errors);

    check("personalInfo.birthDate", &info.birth_date)
        .required("Birth date is required")
        .rule(|v| parse_date(v).is_some(), "Birth date must be a valid date")
        .rule(
            |v| parse_date(v).is_some_and(|birth| age_on(birth, today) >= MIN_AGE_YEARS),
            "Employee must be at least 18 years old",
        )
        .report(&mut errors);

    check("personalInfo.cpf", &info.cpf)
        .required("CPF is required")
        .matches(&CPF_RE, "CPF must use the format 999.999.999-99")
        .rule(is_valid_cpf, "CPF is invalid")
        .report(&mut errors);

    errors.into_result()
}

pub fn validate_address_info(info: &AddressInfo) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check("addressInfo.street", &info.street)
        .required("Street is required")
        .min_len(5, "Street must have at least 5 characters")
        .max_len(100, "Street must have at most 100 characters")
        .report(&mut errors);

    check("addressInfo.number", &info.number)
        .required("Number is required")
        .max_len(10, "Number must have at most 10 characters")
        .report(&mut errors);

    check(
        "addressInfo.complement",
        info.complement.as_deref().unwrap_or(""),
    )
    .optional()
    .max_len(50, "Complement must have at most 50 characters")
    .report(&mut errors);

    check("addressInfo.neighborhood", &info.neighborhood)
        .required("Neighborhood is required")
        .min_len(2, "Neighborhood must have at least 2 characters")
        .max_len(50, "Neighborhood must have at most 50 characters")
        .report(&mut errors);

    check("addressInfo.city", &info.city)
        .required("City is required")
        .min_len(2, "City must have at least 2 characters")
        .max_len(50, "City must have at most 50 characters")
        .report(&mut errors);

    check("addressInfo.state", &info.state)
        .required("State is required")
        .exact_len(2, "State must have 2 characters (e.g. SP)")
        .one_of(STATE_CODES, "State must be a Brazilian state code")
        .report(&mut errors);

    check("addressInfo.zipCode", &info.zip_code)
        .required("ZIP code is required")
        .matches(&ZIP_RE, "ZIP code must use the format 99999-999")
        .report(&mut errors);

    errors.into_result()
}

pub fn validate_job_info(info: &JobInfo, today: NaiveDate) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check("jobInfo.position", &info.position)
        .required("Position is required")
        .min_len(2, "Position must have at least 2 characters")
        .max_len(50, "Position must have at most 50 characters")
        .report(&mut errors);

    check("jobInfo.department", &info.department)
        .required("Department is required")
        .min_len(2, "Department must have at least 2 characters")
        .max_len(50, "Department must have at most 50 characters")
        .report(&mut errors);

    if let Some(message) = salary_error(info.salary) {
        errors.insert("jobInfo.salary", message);
    }

    check("jobInfo.startDate", &info.start_date)
        .required("Start date is required")
        .rule(|v| parse_date(v).is_some(), "Start date must be a valid date")
        .rule(
            |v| parse_date(v).is_some_and(|start| start >= today),
            "Start date cannot be in the past",
        )
        .report(&mut errors);

    check("jobInfo.workSchedule", &info.work_schedule)
        .required("Work schedule is required")
        .report(&mut errors);

    check("jobInfo.employmentType", &info.employment_type)
        .required("Employment type is required")
        .one_of(EMPLOYMENT_TYPES, "Employment type is invalid")
        .report(&mut errors);

    errors.into_result()
}

fn salary_error(salary: f64) -> Option<&'static str> {
    if !salary.is_finite() {
        Some("Salary is required")
    } else if salary <= 0.0 {
        Some("Salary must be a positive value")
    } else if salary < MIN_SALARY {
        Some("Salary must be at least R$ 1.000,00")
    } else if salary > MAX_SALARY {
        Some("Salary must be at most R$ 1.000.000,00")
    } else {
        None
    }
}

// ─── Department sections ─────────────────────────────────────────────────────

pub fn validate_department_details(department: &Department) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    check("name", &department.name)
        .required("Department name is required")
        .rule(
            |v| v.trim().chars().count() <= 100,
            "Department name must have at most 100 characters",
        )
        .report(&mut errors);

    check("description", department.description.as_deref().unwrap_or(""))
        .optional()
        .max_len(500, "Description must have at most 500 characters")
        .report(&mut errors);

    errors.into_result()
}

/// A manager is optional and can be assigned after creation
pub fn validate_department_manager(department: &Department) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(manager_id) = &department.manager_id {
        check("managerId", manager_id)
            .required("Select a manager or leave the field empty")
            .report(&mut errors);
    }

    errors.into_result()
}

pub fn validate_department_members(department: &Department) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut seen = std::collections::HashSet::new();
    if department.employee_ids.iter().any(|id| !seen.insert(id)) {
        errors.insert("employeeIds", "An employee can only be listed once");
    } else if department.employee_ids.iter().any(|id| id.trim().is_empty()) {
        errors.insert("employeeIds", "Member ids cannot be empty");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CPF: &str = "529.982.247-25";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn valid_personal() -> PersonalInfo {
        PersonalInfo {
            first_name: "Ana".to_string(),
            last_name: "Souza".to_string(),
            email: "ana@example.com".to_string(),
            phone: "(11) 91234-5678".to_string(),
            birth_date: "1990-05-20".to_string(),
            cpf: VALID_CPF.to_string(),
        }
    }

    fn valid_job() -> JobInfo {
        JobInfo {
            position: "Engineer".to_string(),
            department: "Technology".to_string(),
            salary: 5_000.0,
            start_date: "2026-11-01".to_string(),
            work_schedule: "Remote".to_string(),
            employment_type: "CLT".to_string(),
            ..JobInfo::default()
        }
    }

    #[test]
    fn test_cpf_rejects_repeated_digits() {
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("00000000000"));
    }

    #[test]
    fn test_cpf_accepts_known_valid_numbers() {
        assert!(is_valid_cpf(VALID_CPF));
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("111.444.777-35"));
    }

    #[test]
    fn test_cpf_single_digit_alteration_is_invalid() {
        let digits: Vec<char> = "52998224725".chars().collect();
        for pos in 0..digits.len() {
            for replacement in '0'..='9' {
                if replacement == digits[pos] {
                    continue;
                }
                let mut altered = digits.clone();
                altered[pos] = replacement;
                let altered: String = altered.into_iter().collect();
                assert!(!is_valid_cpf(&altered), "{altered} should be invalid");
            }
        }
    }

    #[test]
    fn test_cpf_wrong_length() {
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529982247250"));
        assert!(!is_valid_cpf(""));
    }

    #[test]
    fn test_age_boundary() {
        let today = today();
        let exactly_18 = NaiveDate::from_ymd_opt(2008, 10, 18).unwrap();
        let one_day_short = NaiveDate::from_ymd_opt(2008, 10, 19).unwrap();
        assert_eq!(age_on(exactly_18, today), 18);
        assert_eq!(age_on(one_day_short, today), 17);

        let mut info = valid_personal();
        info.birth_date = "2008-10-18".to_string();
        assert!(validate_personal_info(&info, today).is_ok());

        info.birth_date = "2008-10-19".to_string();
        let errors = validate_personal_info(&info, today).unwrap_err();
        assert_eq!(
            errors.get("personalInfo.birthDate"),
            Some("Employee must be at least 18 years old")
        );
    }

    #[test]
    fn test_age_leap_day_birthday() {
        let birth = NaiveDate::from_ymd_opt(2008, 2, 29).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()), 17);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()), 18);
    }

    #[test]
    fn test_personal_reports_first_failing_rule_only() {
        let mut info = valid_personal();
        info.first_name = String::new();
        info.cpf = "111.111.111-11".to_string();
        info.phone = "11912345678".to_string();

        let errors = validate_personal_info(&info, today()).unwrap_err();
        assert_eq!(errors.get("personalInfo.firstName"), Some("First name is required"));
        assert_eq!(errors.get("personalInfo.cpf"), Some("CPF is invalid"));
        assert_eq!(
            errors.get("personalInfo.phone"),
            Some("Phone must use the format (99) 99999-9999")
        );
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_length_rules_ignore_surrounding_whitespace() {
        let mut info = valid_personal();
        info.first_name = " A".to_string();
        info.last_name = "  Souza  ".to_string();

        let errors = validate_personal_info(&info, today()).unwrap_err();
        assert_eq!(
            errors.get("personalInfo.firstName"),
            Some("First name must have at least 2 characters")
        );
        assert!(errors.get("personalInfo.lastName").is_none());
    }

    #[test]
    fn test_personal_accepts_landline_phone() {
        let mut info = valid_personal();
        info.phone = "(11) 3456-7890".to_string();
        assert!(validate_personal_info(&info, today()).is_ok());
    }

    #[test]
    fn test_cpf_format_checked_before_checksum() {
        let mut info = valid_personal();
        info.cpf = "52998224725".to_string();
        let errors = validate_personal_info(&info, today()).unwrap_err();
        assert_eq!(
            errors.get("personalInfo.cpf"),
            Some("CPF must use the format 999.999.999-99")
        );
    }

    #[test]
    fn test_address_rules() {
        let mut info = AddressInfo {
            street: "Rua Augusta".to_string(),
            number: "1500".to_string(),
            complement: None,
            neighborhood: "Consolação".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            zip_code: "01310-100".to_string(),
        };
        assert!(validate_address_info(&info).is_ok());

        info.state = "XX".to_string();
        info.zip_code = "01310100".to_string();
        info.complement = Some("x".repeat(51));
        let errors = validate_address_info(&info).unwrap_err();
        assert!(errors.contains("addressInfo.state"));
        assert!(errors.contains("addressInfo.zipCode"));
        assert!(errors.contains("addressInfo.complement"));

        info.state = "SPX".to_string();
        let errors = validate_address_info(&info).unwrap_err();
        assert_eq!(
            errors.get("addressInfo.state"),
            Some("State must have 2 characters (e.g. SP)")
        );
    }

    #[test]
    fn test_empty_complement_is_allowed() {
        let info = AddressInfo {
            street: "Rua Augusta".to_string(),
            number: "1".to_string(),
            complement: Some(String::new()),
            neighborhood: "Centro".to_string(),
            city: "Santos".to_string(),
            state: "SP".to_string(),
            zip_code: "11010-000".to_string(),
        };
        assert!(validate_address_info(&info).is_ok());
    }

    #[test]
    fn test_salary_bounds() {
        let mut job = valid_job();
        job.salary = 0.0;
        let errors = validate_job_info(&job, today()).unwrap_err();
        assert_eq!(errors.get("jobInfo.salary"), Some("Salary must be a positive value"));

        job.salary = 999.99;
        assert!(validate_job_info(&job, today()).is_err());

        job.salary = MIN_SALARY;
        assert!(validate_job_info(&job, today()).is_ok());

        job.salary = MAX_SALARY;
        assert!(validate_job_info(&job, today()).is_ok());

        job.salary = MAX_SALARY + 0.01;
        assert!(validate_job_info(&job, today()).is_err());

        job.salary = f64::NAN;
        let errors = validate_job_info(&job, today()).unwrap_err();
        assert_eq!(errors.get("jobInfo.salary"), Some("Salary is required"));
    }

    #[test]
    fn test_start_date_today_or_future() {
        let mut job = valid_job();
        job.start_date = "2026-10-18".to_string();
        assert!(validate_job_info(&job, today()).is_ok());

        job.start_date = "2026-10-17".to_string();
        let errors = validate_job_info(&job, today()).unwrap_err();
        assert_eq!(
            errors.get("jobInfo.startDate"),
            Some("Start date cannot be in the past")
        );
    }

    #[test]
    fn test_employment_type_membership() {
        let mut job = valid_job();
        job.employment_type = "Contractor".to_string();
        let errors = validate_job_info(&job, today()).unwrap_err();
        assert_eq!(
            errors.get("jobInfo.employmentType"),
            Some("Employment type is invalid")
        );
    }

    #[test]
    fn test_department_rules() {
        let mut department = Department {
            name: "   ".to_string(),
            ..Department::default()
        };
        assert!(validate_department_details(&department).is_err());

        department.name = "Finance".to_string();
        assert!(validate_department_details(&department).is_ok());
        assert!(validate_department_manager(&department).is_ok());

        department.manager_id = Some(" ".to_string());
        assert!(validate_department_manager(&department).is_err());

        department.employee_ids = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let errors = validate_department_members(&department).unwrap_err();
        assert!(errors.contains("employeeIds"));
    }

    #[test]
    fn test_field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.insert("a", "first");
        errors.insert("a", "second");
        assert_eq!(errors.get("a"), Some("first"));
        assert_eq!(errors.to_string(), "a: first");
    }
}
