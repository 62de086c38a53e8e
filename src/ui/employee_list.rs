//! Employee table: edit, toggle status, delete.

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::form::formatters::format_currency;
use crate::types::{Employee, EmployeeStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeListAction {
    None,
    Back,
    Refresh,
    New,
    Edit(String),
    ToggleStatus { id: String, status: EmployeeStatus },
    Delete(String),
}

pub struct EmployeeListScreen {
    employees: Vec<Employee>,
    table_state: TableState,
    /// Id awaiting delete confirmation
    confirm_delete: Option<String>,
    pub loading: bool,
    pub message: Option<String>,
}

impl Default for EmployeeListScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl EmployeeListScreen {
    pub fn new() -> Self {
        Self {
            employees: Vec::new(),
            table_state: TableState::default(),
            confirm_delete: None,
            loading: true,
            message: None,
        }
    }

    pub fn set_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees;
        self.loading = false;
        let selected = match self.table_state.selected() {
            _ if self.employees.is_empty() => None,
            Some(idx) => Some(idx.min(self.employees.len() - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn selected(&self) -> Option<&Employee> {
        self.table_state
            .selected()
            .and_then(|idx| self.employees.get(idx))
    }

    fn selected_id(&self) -> Option<String> {
        self.selected().and_then(|e| e.id.clone())
    }

    pub fn handle_key(&mut self, key: KeyCode) -> EmployeeListAction {
        if let Some(id) = self.confirm_delete.take() {
            return match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => EmployeeListAction::Delete(id),
                _ => EmployeeListAction::None,
            };
        }

        let len = self.employees.len();
        let idx = self.table_state.selected().unwrap_or(0);
        match key {
            KeyCode::Esc | KeyCode::Char('q') => EmployeeListAction::Back,
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                self.table_state.select(Some(idx.saturating_sub(1)));
                EmployeeListAction::None
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                self.table_state.select(Some((idx + 1).min(len - 1)));
                EmployeeListAction::None
            }
            KeyCode::Char('r') => EmployeeListAction::Refresh,
            KeyCode::Char('n') => EmployeeListAction::New,
            KeyCode::Enter | KeyCode::Char('e') => self
                .selected_id()
                .map_or(EmployeeListAction::None, EmployeeListAction::Edit),
            KeyCode::Char('s') => match self.selected() {
                Some(Employee { id: Some(id), status, .. }) => EmployeeListAction::ToggleStatus {
                    id: id.clone(),
                    status: status.toggled(),
                },
                _ => EmployeeListAction::None,
            },
            KeyCode::Char('d') | KeyCode::Delete => {
                self.confirm_delete = self.selected_id();
                EmployeeListAction::None
            }
            _ => EmployeeListAction::None,
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1)])
            .split(frame.area());

        let header = Row::new(["Name", "Email", "Position", "Department", "Salary", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .employees
            .iter()
            .map(|e| {
                let status_style = match e.status {
                    EmployeeStatus::Active => Style::default().fg(Color::Green),
                    EmployeeStatus::Inactive => Style::default().fg(Color::DarkGray),
                };
                Row::new(vec![
                    Cell::from(e.full_name()),
                    Cell::from(e.personal_info.email.clone()),
                    Cell::from(e.job_info.position.clone()),
                    Cell::from(e.job_info.department.clone()),
                    Cell::from(format_currency(e.job_info.salary)),
                    Cell::from(Span::styled(e.status.as_str(), status_style)),
                ])
            })
            .collect();

        let title = if self.loading {
            " Employees (loading...) ".to_string()
        } else {
            format!(" Employees ({}) ", self.employees.len())
        };
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(20),
                Constraint::Percentage(24),
                Constraint::Percentage(16),
                Constraint::Percentage(16),
                Constraint::Percentage(14),
                Constraint::Percentage(10),
            ],
        )
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(table, chunks[0], &mut self.table_state);

        let footer = if let Some(id) = &self.confirm_delete {
            let name = self
                .employees
                .iter()
                .find(|e| e.id.as_ref() == Some(id))
                .map(Employee::full_name)
                .unwrap_or_default();
            Line::from(Span::styled(
                format!("Delete {name}? [y/N]"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        } else if let Some(message) = &self.message {
            Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Yellow)))
        } else if self.employees.is_empty() && !self.loading {
            Line::from(Span::styled(
                "No employees yet. [n] register the first one  [Esc] back",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(Span::styled(
                "[e] edit  [s] toggle status  [d] delete  [n] new  [r] refresh  [Esc] back",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(footer), chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, status: EmployeeStatus) -> Employee {
        Employee {
            id: Some(id.to_string()),
            status,
            ..Employee::default()
        }
    }

    fn screen() -> EmployeeListScreen {
        let mut screen = EmployeeListScreen::new();
        screen.set_employees(vec![
            employee("a", EmployeeStatus::Active),
            employee("b", EmployeeStatus::Inactive),
        ]);
        screen
    }

    #[test]
    fn test_toggle_status_flips_selected() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Down);
        assert_eq!(
            screen.handle_key(KeyCode::Char('s')),
            EmployeeListAction::ToggleStatus {
                id: "b".to_string(),
                status: EmployeeStatus::Active,
            }
        );
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut screen = screen();
        assert_eq!(screen.handle_key(KeyCode::Char('d')), EmployeeListAction::None);
        assert_eq!(
            screen.handle_key(KeyCode::Char('y')),
            EmployeeListAction::Delete("a".to_string())
        );

        screen.handle_key(KeyCode::Char('d'));
        assert_eq!(screen.handle_key(KeyCode::Char('n')), EmployeeListAction::None);
        // Cancelled confirmation leaves normal keys working
        assert_eq!(
            screen.handle_key(KeyCode::Char('e')),
            EmployeeListAction::Edit("a".to_string())
        );
    }

    #[test]
    fn test_selection_survives_shrinking_list() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Down);
        screen.set_employees(vec![employee("a", EmployeeStatus::Active)]);
        assert_eq!(screen.selected().and_then(|e| e.id.as_deref()), Some("a"));

        screen.set_employees(Vec::new());
        assert!(screen.selected().is_none());
        assert_eq!(screen.handle_key(KeyCode::Char('e')), EmployeeListAction::None);
    }
}
