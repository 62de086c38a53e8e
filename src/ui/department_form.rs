//! Department create/edit form: details, manager, member checklist.

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::centered_rect;
use super::form_field::{FieldGroup, FormField, LabeledField};
use super::wizard::ManagerOption;
use crate::form::{DepartmentSection, FormPhase, FormSection, RecordForm, SubmitError};
use crate::types::{Department, Employee};

/// An employee that can be added to the department
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOption {
    pub id: String,
    pub name: String,
    pub position: String,
}

impl MemberOption {
    pub fn from_employee(employee: &Employee) -> Option<Self> {
        Some(Self {
            id: employee.id.clone()?,
            name: employee.full_name(),
            position: employee.job_info.position.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentFormAction {
    None,
    Submit,
    Cancel,
    Close,
}

pub struct DepartmentFormScreen {
    form: RecordForm<Department>,
    group: FieldGroup,
    managers: Vec<ManagerOption>,
    members: Vec<MemberOption>,
    member_state: ListState,
}

impl DepartmentFormScreen {
    pub fn new(managers: Vec<ManagerOption>, members: Vec<MemberOption>) -> Self {
        Self::with_form(RecordForm::new(), managers, members)
    }

    pub fn edit(
        department: Department,
        managers: Vec<ManagerOption>,
        members: Vec<MemberOption>,
    ) -> Self {
        Self::with_form(RecordForm::with_record(department), managers, members)
    }

    fn with_form(
        form: RecordForm<Department>,
        managers: Vec<ManagerOption>,
        members: Vec<MemberOption>,
    ) -> Self {
        let mut member_state = ListState::default();
        if !members.is_empty() {
            member_state.select(Some(0));
        }
        let mut screen = Self {
            form,
            group: FieldGroup::default(),
            managers,
            members,
            member_state,
        };
        screen.rebuild_fields();
        screen
    }

    pub fn form(&self) -> &RecordForm<Department> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm<Department> {
        &mut self.form
    }

    fn rebuild_fields(&mut self) {
        let department = self.form.record();
        let fields = match self.form.current_section() {
            DepartmentSection::Details => vec![
                LabeledField::new(
                    "name",
                    "Name",
                    FormField::text(&department.name, "Engineering", Some(100)),
                ),
                LabeledField::new(
                    "description",
                    "Description",
                    FormField::text_area(
                        department.description.as_deref().unwrap_or_default(),
                        "What this department does",
                    ),
                )
                .optional(),
            ],
            DepartmentSection::Manager => {
                let options: Vec<String> = std::iter::once(String::new())
                    .chain(self.managers.iter().map(|m| m.name.clone()))
                    .collect();
                let current = department
                    .manager_id
                    .as_ref()
                    .and_then(|id| self.managers.iter().find(|m| &m.id == id))
                    .map(|m| m.name.clone())
                    .unwrap_or_default();
                vec![LabeledField::new(
                    "managerId",
                    "Manager",
                    FormField::select(options, &current),
                )
                .optional()]
            }
            // The checklist is drawn from `members`, not from widgets
            DepartmentSection::Members => Vec::new(),
        };
        self.group = FieldGroup::new(fields);
        self.group.focus_first_error(self.form.errors());
    }

    pub fn after_submit(&mut self, result: &Result<String, SubmitError>) {
        if let Err(SubmitError::Invalid(_)) = result {
            self.form.go_to_first_error();
            self.rebuild_fields();
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DepartmentFormAction {
        if let FormPhase::Succeeded { .. } = self.form.phase() {
            return match key {
                KeyCode::Char('n') if !self.form.is_editing_existing() => {
                    self.form.start_new();
                    self.rebuild_fields();
                    DepartmentFormAction::None
                }
                KeyCode::Char('n') => DepartmentFormAction::None,
                _ => DepartmentFormAction::Close,
            };
        }
        if self.form.is_busy() {
            return DepartmentFormAction::None;
        }

        let on_members = self.form.current_section() == DepartmentSection::Members;
        match key {
            KeyCode::Esc => {
                if self.form.sequencer().is_first() {
                    return DepartmentFormAction::Cancel;
                }
                self.form.go_back();
                self.rebuild_fields();
            }
            KeyCode::PageUp => {
                self.form.go_back();
                self.rebuild_fields();
            }
            KeyCode::PageDown => return self.advance(),
            KeyCode::Enter if on_members || self.group.is_last_field() => return self.advance(),
            KeyCode::Enter | KeyCode::Tab => self.group.next_field(),
            KeyCode::BackTab => self.group.prev_field(),
            KeyCode::Up | KeyCode::Char('k') if on_members => self.move_member_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') if on_members => self.move_member_cursor(1),
            KeyCode::Char(' ') if on_members => self.toggle_member(),
            other if !on_members => self.edit_focused(other),
            _ => {}
        }
        DepartmentFormAction::None
    }

    fn advance(&mut self) -> DepartmentFormAction {
        if self.form.sequencer().is_last() {
            return DepartmentFormAction::Submit;
        }
        if self.form.advance_section().is_ok() {
            self.rebuild_fields();
        } else {
            self.group.focus_first_error(self.form.errors());
        }
        DepartmentFormAction::None
    }

    fn move_member_cursor(&mut self, delta: isize) {
        if self.members.is_empty() {
            return;
        }
        let idx = self.member_state.selected().unwrap_or(0) as isize + delta;
        let idx = idx.clamp(0, self.members.len() as isize - 1) as usize;
        self.member_state.select(Some(idx));
    }

    fn toggle_member(&mut self) {
        let Some(member) = self
            .member_state
            .selected()
            .and_then(|idx| self.members.get(idx))
        else {
            return;
        };
        let ids = &mut self.form.record_mut().employee_ids;
        if let Some(pos) = ids.iter().position(|id| id == &member.id) {
            ids.remove(pos);
        } else {
            ids.push(member.id.clone());
        }
    }

    fn edit_focused(&mut self, key: KeyCode) {
        let Some(labeled) = self.group.focused_field_mut() else {
            return;
        };
        if !labeled.field.handle_key(key) {
            return;
        }
        let value = labeled.field.value();
        let department = self.form.record_mut();
        match labeled.key {
            "name" => department.name = value,
            "description" => {
                department.description = Some(value).filter(|v| !v.trim().is_empty());
            }
            "managerId" => {
                department.manager_id = labeled
                    .field
                    .selected_index()
                    .and_then(|idx| idx.checked_sub(1))
                    .and_then(|idx| self.managers.get(idx))
                    .map(|m| m.id.clone());
            }
            other => tracing::warn!(field = other, "unbound department field"),
        }
        if self.form.error_for(labeled.key).is_some() {
            self.form.validate_current_section();
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = centered_rect(70, 85, frame.area());
        frame.render_widget(Clear, area);

        let title = if self.form.is_editing_existing() {
            " Edit Department "
        } else {
            " New Department "
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
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(inner);

        let current = self.form.current_section();
        let steps: Vec<Span> = DepartmentSection::all()
            .iter()
            .enumerate()
            .flat_map(|(i, section)| {
                let style = if *section == current {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
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

        let banner = if self.form.is_busy() {
            Some(Span::styled("Saving...", Style::default().fg(Color::Yellow)))
        } else {
            self.form
                .banner()
                .map(|b| Span::styled(b.to_string(), Style::default().fg(Color::Red)))
        };
        if let Some(banner) = banner {
            frame.render_widget(Paragraph::new(Line::from(banner)), chunks[1]);
        }

        if current == DepartmentSection::Members {
            self.render_members(frame, chunks[2]);
        } else {
            self.group.render(frame, chunks[2], self.form.errors());
        }

        let help = if current == DepartmentSection::Members {
            "[Space] toggle member  [Enter] save  [Esc] back"
        } else {
            "[Tab] field  [Enter/PgDn] next  [Esc/PgUp] back"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(help, Style::default().fg(Color::DarkGray))),
            chunks[3],
        );
    }

    fn render_members(&mut self, frame: &mut Frame, area: Rect) {
        let selected = &self.form.record().employee_ids;
        let items: Vec<ListItem> = if self.members.is_empty() {
            vec![ListItem::new(Span::styled(
                "No employees registered yet",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.members
                .iter()
                .map(|m| {
                    let mark = if selected.contains(&m.id) { "[x]" } else { "[ ]" };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{mark} {}", m.name)),
                        Span::styled(
                            format!("  {}", m.position),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect()
        };
        let title = format!(" Members ({} selected) ", selected.len());
        let mut block = Block::default().title(title).borders(Borders::ALL);
        if let Some(message) = self.form.error_for("employeeIds") {
            block = block.title_bottom(Span::styled(
                format!(" {message} "),
                Style::default().fg(Color::Red),
            ));
        }
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, area, &mut self.member_state);
    }

    fn render_success(&self, frame: &mut Frame, area: Rect, id: &str) {
        let editing = self.form.is_editing_existing();
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                if editing {
                    "Department updated successfully!"
                } else {
                    "Department created successfully!"
                },
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(self.form.record().name.clone()),
            Line::from(Span::styled(
                format!("Saved with ID: {id}"),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
        ];
        if !editing {
            lines.push(Line::from("[n] New department   [Esc] Back to list"));
        } else {
            lines.push(Line::from("[Esc] Back to list"));
        }
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DepartmentService;
    use crate::store::MemoryStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn managers() -> Vec<ManagerOption> {
        vec![ManagerOption {
            id: "m1".to_string(),
            name: "Carla Lima".to_string(),
        }]
    }

    fn members() -> Vec<MemberOption> {
        vec![
            MemberOption {
                id: "e1".to_string(),
                name: "Ana Souza".to_string(),
                position: "Engineer".to_string(),
            },
            MemberOption {
                id: "e2".to_string(),
                name: "Bruno Dias".to_string(),
                position: "Analyst".to_string(),
            },
        ]
    }

    #[test]
    fn test_name_required_before_advancing() {
        let mut screen = DepartmentFormScreen::new(managers(), members());
        screen.handle_key(KeyCode::Tab);
        assert_eq!(screen.handle_key(KeyCode::Enter), DepartmentFormAction::None);
        assert_eq!(screen.form().current_section(), DepartmentSection::Details);
        assert!(screen.form().error_for("name").is_some());
        assert_eq!(screen.group.focused, 0);
    }

    #[test]
    fn test_full_flow_requests_submit() {
        let mut screen = DepartmentFormScreen::new(managers(), members());
        for c in "Engineering".chars() {
            screen.handle_key(KeyCode::Char(c));
        }
        screen.handle_key(KeyCode::PageDown);
        assert_eq!(screen.form().current_section(), DepartmentSection::Manager);

        screen.handle_key(KeyCode::Down);
        assert_eq!(screen.form().record().manager_id.as_deref(), Some("m1"));
        screen.handle_key(KeyCode::Enter);
        assert_eq!(screen.form().current_section(), DepartmentSection::Members);

        screen.handle_key(KeyCode::Char(' '));
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Char(' '));
        assert_eq!(screen.form().record().employee_ids, vec!["e1", "e2"]);

        // Toggling again removes the member
        screen.handle_key(KeyCode::Char(' '));
        assert_eq!(screen.form().record().employee_ids, vec!["e1"]);

        assert_eq!(screen.handle_key(KeyCode::Enter), DepartmentFormAction::Submit);
    }

    #[test]
    fn test_edit_prefills_manager() {
        let department = Department {
            id: Some("d1".to_string()),
            name: "Sales".to_string(),
            manager_id: Some("m1".to_string()),
            ..Department::default()
        };
        let mut screen = DepartmentFormScreen::edit(department, managers(), members());
        screen.handle_key(KeyCode::PageDown);
        let value = screen.group.focused_field().map(|f| f.field.value());
        assert_eq!(value.as_deref(), Some("Carla Lima"));
    }

    #[test]
    fn test_clearing_description_stores_none() {
        let department = Department {
            name: "Sales".to_string(),
            description: Some("x".to_string()),
            ..Department::default()
        };
        let mut screen = DepartmentFormScreen::edit(department, managers(), members());
        screen.handle_key(KeyCode::Tab);
        screen.handle_key(KeyCode::Backspace);
        assert_eq!(screen.form().record().description, None);
    }

    async fn created_screen() -> (DepartmentFormScreen, String) {
        let service = DepartmentService::new(Arc::new(MemoryStore::new()));
        let mut screen = DepartmentFormScreen::new(managers(), members());
        screen.form_mut().record_mut().name = "Engineering".to_string();
        let id = screen.form_mut().submit(&service).await.unwrap();
        (screen, id)
    }

    #[tokio::test]
    async fn test_new_department_after_create() {
        let (mut screen, _) = created_screen().await;
        assert!(!screen.form().is_editing_existing());

        assert_eq!(screen.handle_key(KeyCode::Char('n')), DepartmentFormAction::None);

        assert_eq!(screen.form().phase(), &FormPhase::Editing);
        assert_eq!(screen.form().record(), &Department::default());
        assert_eq!(screen.form().current_section(), DepartmentSection::Details);
    }

    #[tokio::test]
    async fn test_success_panel_shows_assigned_id() {
        let (mut screen, id) = created_screen().await;
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| screen.render(f)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Department created successfully!"));
        assert!(text.contains(&id));
        assert!(text.contains("[n] New department"));
    }
}
