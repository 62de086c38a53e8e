//! Employee registration wizard: three sections, one per step.
//!
//! The record lives in the `RecordForm`; the widgets here are views over it
//! and write every edit straight back into the record.

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use super::centered_rect;
use super::form_field::{FieldGroup, FormField, InputMask, LabeledField};
use crate::form::formatters::{format_currency, parse_currency};
use crate::form::{EmployeeSection, FormPhase, FormSection, RecordForm, SubmitError};
use crate::types::{
    Employee, HierarchyLevel, DEPARTMENT_OPTIONS, EMPLOYMENT_TYPES, STATE_CODES, WORK_SCHEDULES,
};

/// A manager offered by the job section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOption {
    pub id: String,
    pub name: String,
}

impl ManagerOption {
    pub fn from_employee(employee: &Employee) -> Option<Self> {
        Some(Self {
            id: employee.id.clone()?,
            name: employee.full_name(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    None,
    /// Validate everything and persist
    Submit,
    /// Leave without saving
    Cancel,
    /// Leave after a successful save
    Close,
}

pub struct EmployeeWizard {
    form: RecordForm<Employee>,
    group: FieldGroup,
    managers: Vec<ManagerOption>,
}

/// `""` first so an untouched picker stays empty and fails "required"
fn options_with_blank(values: &[&str]) -> Vec<String> {
    std::iter::once(String::new())
        .chain(values.iter().map(|v| (*v).to_string()))
        .collect()
}

fn section_fields(
    section: EmployeeSection,
    employee: &Employee,
    managers: &[ManagerOption],
) -> Vec<LabeledField> {
    match section {
        EmployeeSection::Personal => {
            let p = &employee.personal_info;
            vec![
                LabeledField::new(
                    "personalInfo.firstName",
                    "First name",
                    FormField::text(&p.first_name, "Ana", Some(50)),
                ),
                LabeledField::new(
                    "personalInfo.lastName",
                    "Last name",
                    FormField::text(&p.last_name, "Souza", Some(50)),
                ),
                LabeledField::new(
                    "personalInfo.email",
                    "Email",
                    FormField::text(&p.email, "ana@company.com", None),
                ),
                LabeledField::new(
                    "personalInfo.phone",
                    "Phone",
                    FormField::masked(&p.phone, "(11) 91234-5678", InputMask::Phone),
                ),
                LabeledField::new(
                    "personalInfo.birthDate",
                    "Birth date",
                    FormField::date(&p.birth_date),
                ),
                LabeledField::new(
                    "personalInfo.cpf",
                    "CPF",
                    FormField::masked(&p.cpf, "000.000.000-00", InputMask::Cpf),
                ),
            ]
        }
        EmployeeSection::Address => {
            let a = &employee.address_info;
            vec![
                LabeledField::new(
                    "addressInfo.street",
                    "Street",
                    FormField::text(&a.street, "Rua Augusta", Some(100)),
                ),
                LabeledField::new(
                    "addressInfo.number",
                    "Number",
                    FormField::text(&a.number, "1500", Some(10)),
                ),
                LabeledField::new(
                    "addressInfo.complement",
                    "Complement",
                    FormField::text(
                        a.complement.as_deref().unwrap_or_default(),
                        "Apt 12",
                        Some(50),
                    ),
                )
                .optional(),
                LabeledField::new(
                    "addressInfo.neighborhood",
                    "Neighborhood",
                    FormField::text(&a.neighborhood, "", Some(50)),
                ),
                LabeledField::new(
                    "addressInfo.city",
                    "City",
                    FormField::text(&a.city, "", Some(50)),
                ),
                LabeledField::new(
                    "addressInfo.state",
                    "State",
                    FormField::select(options_with_blank(STATE_CODES), &a.state),
                ),
                LabeledField::new(
                    "addressInfo.zipCode",
                    "ZIP code",
                    FormField::masked(&a.zip_code, "00000-000", InputMask::ZipCode),
                ),
            ]
        }
        EmployeeSection::Job => {
            let j = &employee.job_info;
            let salary = if j.salary > 0.0 {
                format_currency(j.salary)
            } else {
                String::new()
            };
            let levels: Vec<String> = HierarchyLevel::all()
                .iter()
                .map(|l| l.as_str().to_string())
                .collect();
            let manager_options: Vec<String> = std::iter::once(String::new())
                .chain(managers.iter().map(|m| m.name.clone()))
                .collect();
            let current_manager = j
                .manager_id
                .as_ref()
                .and_then(|id| managers.iter().find(|m| &m.id == id))
                .map(|m| m.name.clone())
                .unwrap_or_default();
            vec![
                LabeledField::new(
                    "jobInfo.position",
                    "Position",
                    FormField::text(&j.position, "Software Engineer", Some(50)),
                ),
                LabeledField::new(
                    "jobInfo.department",
                    "Department",
                    FormField::select(options_with_blank(DEPARTMENT_OPTIONS), &j.department),
                ),
                LabeledField::new(
                    "jobInfo.salary",
                    "Salary",
                    FormField::masked(&salary, "R$ 0,00", InputMask::Currency),
                ),
                LabeledField::new(
                    "jobInfo.startDate",
                    "Start date",
                    FormField::date(&j.start_date),
                ),
                LabeledField::new(
                    "jobInfo.workSchedule",
                    "Work schedule",
                    FormField::select(options_with_blank(WORK_SCHEDULES), &j.work_schedule),
                ),
                LabeledField::new(
                    "jobInfo.employmentType",
                    "Employment type",
                    FormField::select(options_with_blank(EMPLOYMENT_TYPES), &j.employment_type),
                ),
                LabeledField::new(
                    "jobInfo.hierarchyLevel",
                    "Hierarchy level",
                    FormField::select(levels, j.hierarchy_level.as_str()),
                ),
                LabeledField::new(
                    "jobInfo.managerId",
                    "Manager",
                    FormField::select(manager_options, &current_manager),
                )
                .optional(),
            ]
        }
    }
}

/// Copy a widget's value into the record field it is bound to
fn write_field(employee: &mut Employee, labeled: &LabeledField, managers: &[ManagerOption]) {
    let value = labeled.field.value();
    let p = &mut employee.personal_info;
    let a = &mut employee.address_info;
    let j = &mut employee.job_info;
    match labeled.key {
        "personalInfo.firstName" => p.first_name = value,
        "personalInfo.lastName" => p.last_name = value,
        "personalInfo.email" => p.email = value,
        "personalInfo.phone" => p.phone = value,
        "personalInfo.birthDate" => p.birth_date = value,
        "personalInfo.cpf" => p.cpf = value,
        "addressInfo.street" => a.street = value,
        "addressInfo.number" => a.number = value,
        "addressInfo.complement" => {
            a.complement = if value.trim().is_empty() {
                None
            } else {
                Some(value)
            }
        }
        "addressInfo.neighborhood" => a.neighborhood = value,
        "addressInfo.city" => a.city = value,
        "addressInfo.state" => a.state = value,
        "addressInfo.zipCode" => a.zip_code = value,
        "jobInfo.position" => j.position = value,
        "jobInfo.department" => j.department = value,
        "jobInfo.salary" => j.salary = parse_currency(&value),
        "jobInfo.startDate" => j.start_date = value,
        "jobInfo.workSchedule" => j.work_schedule = value,
        "jobInfo.employmentType" => j.employment_type = value,
        "jobInfo.hierarchyLevel" => {
            j.hierarchy_level = HierarchyLevel::from_str_opt(&value).unwrap_or_default();
        }
        "jobInfo.managerId" => {
            j.manager_id = labeled
                .field
                .selected_index()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| managers.get(idx))
                .map(|m| m.id.clone());
        }
        other => tracing::warn!(field = other, "unbound employee field"),
    }
}

impl EmployeeWizard {
    /// Blank registration
    pub fn new(managers: Vec<ManagerOption>) -> Self {
        Self::with_form(RecordForm::new(), managers)
    }

    /// Edit an existing employee
    pub fn edit(employee: Employee, managers: Vec<ManagerOption>) -> Self {
        Self::with_form(RecordForm::with_record(employee), managers)
    }

    fn with_form(form: RecordForm<Employee>, managers: Vec<ManagerOption>) -> Self {
        let mut wizard = Self {
            form,
            group: FieldGroup::default(),
            managers,
        };
        wizard.rebuild_fields();
        wizard
    }

    pub fn form(&self) -> &RecordForm<Employee> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm<Employee> {
        &mut self.form
    }

    /// Recreate the widgets for the active section from the record
    fn rebuild_fields(&mut self) {
        let section = self.form.current_section();
        self.group = FieldGroup::new(section_fields(section, self.form.record(), &self.managers));
        self.group.focus_first_error(self.form.errors());
    }

    /// Apply a submission outcome to the view
    pub fn after_submit(&mut self, result: &Result<String, SubmitError>) {
        if let Err(SubmitError::Invalid(_)) = result {
            self.form.go_to_first_error();
            self.rebuild_fields();
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> WizardAction {
        if let FormPhase::Succeeded { .. } = self.form.phase() {
            return match key {
                KeyCode::Char('n') if !self.form.is_editing_existing() => {
                    self.form.start_new();
                    self.rebuild_fields();
                    WizardAction::None
                }
                KeyCode::Char('n') => WizardAction::None,
                _ => WizardAction::Close,
            };
        }
        if self.form.is_busy() {
            return WizardAction::None;
        }

        match key {
            KeyCode::Esc => {
                if self.form.sequencer().is_first() {
                    return WizardAction::Cancel;
                }
                self.form.go_back();
                self.rebuild_fields();
            }
            KeyCode::Tab => self.group.next_field(),
            KeyCode::BackTab => self.group.prev_field(),
            KeyCode::PageUp => {
                self.form.go_back();
                self.rebuild_fields();
            }
            KeyCode::PageDown => return self.advance(),
            KeyCode::Enter => {
                if !self.group.is_last_field() {
                    self.group.next_field();
                } else {
                    return self.advance();
                }
            }
            other => self.edit_focused(other),
        }
        WizardAction::None
    }

    /// Next section, or submit on the last one
    fn advance(&mut self) -> WizardAction {
        if self.form.sequencer().is_last() {
            return WizardAction::Submit;
        }
        if self.form.advance_section().is_ok() {
            self.rebuild_fields();
        } else {
            self.group.focus_first_error(self.form.errors());
        }
        WizardAction::None
    }

    fn edit_focused(&mut self, key: KeyCode) {
        let Some(labeled) = self.group.focused_field_mut() else {
            return;
        };
        if !labeled.field.handle_key(key) {
            return;
        }
        write_field(self.form.record_mut(), labeled, &self.managers);
        // Errors already on screen follow the edits
        if self.form.error_for(labeled.key).is_some() {
            self.form.validate_current_section();
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = centered_rect(80, 95, frame.area());
        frame.render_widget(Clear, area);

        let title = if self.form.is_editing_existing() {
            " Edit Employee "
        } else {
            " Register Employee "
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let FormPhase::Succeeded { id } = self.form.phase() {
            self.render_success(frame, inner, id);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Steps
                Constraint::Length(1), // Progress
                Constraint::Length(1), // Banner
                Constraint::Min(5),    // Fields
                Constraint::Length(1), // Help
            ])
            .split(inner);

        let current = self.form.current_section();
        let steps: Vec<Span> = EmployeeSection::all()
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                let style = if *section == current {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if i < current.index() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                [
                    Span::styled(format!("{}. {}", i + 1, section.label()), style),
                    Span::raw("   "),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(steps)), chunks[0]);

        let progress = self.form.sequencer().progress();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Cyan))
            .label(format!("{progress:.0}%"))
            .ratio((progress / 100.0).clamp(0.0, 1.0));
        frame.render_widget(gauge, chunks[1]);

        let banner = if self.form.is_busy() {
            Some(Span::styled("Saving...", Style::default().fg(Color::Yellow)))
        } else {
            self.form
                .banner()
                .map(|b| Span::styled(b.to_string(), Style::default().fg(Color::Red)))
        };
        if let Some(banner) = banner {
            frame.render_widget(Paragraph::new(Line::from(banner)), chunks[2]);
        }

        self.group.render(frame, chunks[3], self.form.errors());

        let submit_label = if self.form.sequencer().is_last() {
            if self.form.is_editing_existing() {
                "Save"
            } else {
                "Register"
            }
        } else {
            "Next"
        };
        let help = Line::from(vec![
            Span::styled("[Tab]", Style::default().fg(Color::Cyan)),
            Span::raw(" field  "),
            Span::styled("[Enter/PgDn]", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {submit_label}  ")),
            Span::styled("[Esc/PgUp]", Style::default().fg(Color::Cyan)),
            Span::raw(" back"),
        ]);
        frame.render_widget(Paragraph::new(help), chunks[4]);
    }

    fn render_success(&self, frame: &mut Frame, area: Rect, id: &str) {
        let editing = self.form.is_editing_existing();
        let name = self.form.record().full_name();
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                if editing {
                    "Employee updated successfully!"
                } else {
                    "Employee registered successfully!"
                },
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(name),
            Line::from(Span::styled(
                format!("Saved with ID: {id}"),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
        ];
        if !editing {
            lines.push(Line::from(vec![
                Span::styled("[n]", Style::default().fg(Color::Cyan)),
                Span::raw(" Register another   "),
                Span::styled("[Esc]", Style::default().fg(Color::Cyan)),
                Span::raw(" Back to list"),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled("[Esc]", Style::default().fg(Color::Cyan)),
                Span::raw(" Back to list"),
            ]));
        }
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FIX_ERRORS_MESSAGE;
    use crate::gateway::Gateway;
    use crate::services::EmployeeService;
    use crate::store::MemoryStore;
    use crate::types::{AddressInfo, JobInfo, PersonalInfo};
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn type_str(wizard: &mut EmployeeWizard, text: &str) {
        for c in text.chars() {
            wizard.handle_key(KeyCode::Char(c));
        }
    }

    fn managers() -> Vec<ManagerOption> {
        vec![ManagerOption {
            id: "m1".to_string(),
            name: "Carla Lima".to_string(),
        }]
    }

    #[test]
    fn test_typing_writes_through_to_record() {
        let mut wizard = EmployeeWizard::new(managers());
        type_str(&mut wizard, "Ana");
        wizard.handle_key(KeyCode::Tab);
        type_str(&mut wizard, "Souza");
        wizard.handle_key(KeyCode::Tab);
        wizard.handle_key(KeyCode::Tab);
        type_str(&mut wizard, "11912345678");

        let p = &wizard.form().record().personal_info;
        assert_eq!(p.first_name, "Ana");
        assert_eq!(p.last_name, "Souza");
        assert_eq!(p.phone, "(11) 91234-5678");
    }

    #[test]
    fn test_enter_on_last_field_validates_section() {
        let mut wizard = EmployeeWizard::new(managers());
        for _ in 0..5 {
            wizard.handle_key(KeyCode::Enter);
        }
        assert_eq!(wizard.handle_key(KeyCode::Enter), WizardAction::None);

        assert_eq!(wizard.form().sequencer().current(), 0);
        assert_eq!(wizard.form().banner(), Some(FIX_ERRORS_MESSAGE));
        // Focus jumps back to the first invalid field
        assert_eq!(
            wizard.group.focused_field().map(|f| f.key),
            Some("personalInfo.firstName")
        );
    }

    #[test]
    fn test_esc_on_first_section_cancels() {
        let mut wizard = EmployeeWizard::new(Vec::new());
        assert_eq!(wizard.handle_key(KeyCode::Esc), WizardAction::Cancel);
    }

    #[test]
    fn test_salary_and_manager_fields_map_to_record() {
        let mut employee = Employee::default();
        employee.id = Some("e1".to_string());
        let mut wizard = EmployeeWizard::edit(employee, managers());
        wizard.form_mut().go_to(2);
        wizard.rebuild_fields();

        // Salary
        wizard.group.focused = 2;
        type_str(&mut wizard, "550000");
        assert!((wizard.form().record().job_info.salary - 5500.0).abs() < f64::EPSILON);

        // Manager picker: index 0 is "none"
        wizard.group.focused = 7;
        wizard.handle_key(KeyCode::Down);
        assert_eq!(
            wizard.form().record().job_info.manager_id.as_deref(),
            Some("m1")
        );
        wizard.handle_key(KeyCode::Up);
        assert_eq!(wizard.form().record().job_info.manager_id, None);
    }

    #[test]
    fn test_last_section_enter_requests_submit() {
        let mut wizard = EmployeeWizard::new(Vec::new());
        wizard.form_mut().go_to(2);
        wizard.rebuild_fields();
        assert_eq!(wizard.handle_key(KeyCode::PageDown), WizardAction::Submit);
    }

    #[test]
    fn test_existing_values_populate_widgets() {
        let mut employee = Employee::default();
        employee.job_info.salary = 1234.5;
        employee.job_info.employment_type = "PJ".to_string();
        let mut wizard = EmployeeWizard::edit(employee, Vec::new());
        wizard.form_mut().go_to(2);
        wizard.rebuild_fields();

        let values: Vec<String> = wizard.group.fields.iter().map(|f| f.field.value()).collect();
        assert_eq!(values[2], "R$ 1.234,50");
        assert_eq!(values[5], "PJ");
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn valid_employee() -> Employee {
        Employee {
            personal_info: PersonalInfo {
                first_name: "Ana".to_string(),
                last_name: "Souza".to_string(),
                email: "ana@example.com".to_string(),
                phone: "(11) 91234-5678".to_string(),
                birth_date: "1990-05-20".to_string(),
                cpf: "529.982.247-25".to_string(),
            },
            address_info: AddressInfo {
                street: "Rua Augusta".to_string(),
                number: "1500".to_string(),
                complement: None,
                neighborhood: "Consolação".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                zip_code: "01310-100".to_string(),
            },
            job_info: JobInfo {
                position: "Engineer".to_string(),
                department: "Technology".to_string(),
                salary: 5_000.0,
                start_date: "2026-11-01".to_string(),
                work_schedule: "Remote".to_string(),
                employment_type: "CLT".to_string(),
                ..JobInfo::default()
            },
            ..Employee::default()
        }
    }

    /// Register a valid employee through a fresh wizard
    async fn registered_wizard() -> (EmployeeWizard, String) {
        let service = EmployeeService::new(Arc::new(MemoryStore::new()));
        let form = RecordForm::with_record(valid_employee()).with_clock(fixed_today);
        let mut wizard = EmployeeWizard::with_form(form, managers());
        let id = wizard.form_mut().submit(&service).await.unwrap();
        (wizard, id)
    }

    fn screen_text(wizard: &mut EmployeeWizard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| wizard.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_register_another_after_create() {
        let (mut wizard, _) = registered_wizard().await;
        assert!(!wizard.form().is_editing_existing());

        assert_eq!(wizard.handle_key(KeyCode::Char('n')), WizardAction::None);

        assert_eq!(wizard.form().phase(), &FormPhase::Editing);
        assert_eq!(wizard.form().record(), &Employee::default());
        assert_eq!(wizard.form().sequencer().current(), 0);
        assert_eq!(
            wizard.group.focused_field().map(|f| f.key),
            Some("personalInfo.firstName")
        );
    }

    #[tokio::test]
    async fn test_success_panel_after_create() {
        let (mut wizard, id) = registered_wizard().await;
        let text = screen_text(&mut wizard);

        assert!(text.contains("Register Employee"));
        assert!(text.contains("Employee registered successfully!"));
        assert!(text.contains(&format!("Saved with ID: {id}")));
        assert!(text.contains("Register another"));
    }

    #[tokio::test]
    async fn test_success_after_edit_only_closes() {
        let service = EmployeeService::new(Arc::new(MemoryStore::new()));
        let mut employee = valid_employee();
        employee.id = Some(service.create(&employee).await.unwrap());
        let form = RecordForm::with_record(employee).with_clock(fixed_today);
        let mut wizard = EmployeeWizard::with_form(form, Vec::new());
        let id = wizard.form_mut().submit(&service).await.unwrap();

        let text = screen_text(&mut wizard);
        assert!(text.contains("Employee updated successfully!"));
        assert!(text.contains(&id));
        assert!(!text.contains("Register another"));

        assert_eq!(wizard.handle_key(KeyCode::Char('n')), WizardAction::None);
        assert!(matches!(wizard.form().phase(), FormPhase::Succeeded { .. }));
        assert_eq!(wizard.handle_key(KeyCode::Esc), WizardAction::Close);
    }
}
