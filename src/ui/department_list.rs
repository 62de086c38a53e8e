//! Department list with search and multi-select bulk delete.

use std::collections::BTreeSet;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::types::DepartmentWithDetails;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentListAction {
    None,
    Back,
    Refresh,
    New,
    Edit(String),
    Delete(Vec<String>),
}

pub struct DepartmentListScreen {
    departments: Vec<DepartmentWithDetails>,
    search: String,
    searching: bool,
    selected_ids: BTreeSet<String>,
    table_state: TableState,
    confirm_delete: Option<Vec<String>>,
    pub loading: bool,
    pub message: Option<String>,
}

impl Default for DepartmentListScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl DepartmentListScreen {
    pub fn new() -> Self {
        Self {
            departments: Vec::new(),
            search: String::new(),
            searching: false,
            selected_ids: BTreeSet::new(),
            table_state: TableState::default(),
            confirm_delete: None,
            loading: true,
            message: None,
        }
    }

    pub fn set_departments(&mut self, departments: Vec<DepartmentWithDetails>) {
        self.departments = departments;
        self.loading = false;
        // Drop selections that no longer exist
        let known: BTreeSet<String> = self
            .departments
            .iter()
            .filter_map(|d| d.department.id.clone())
            .collect();
        self.selected_ids.retain(|id| known.contains(id));
        self.clamp_cursor();
    }

    /// Departments matching the search term, in list order
    pub fn visible(&self) -> Vec<&DepartmentWithDetails> {
        self.departments
            .iter()
            .filter(|d| d.matches(&self.search))
            .collect()
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected_ids
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(idx) => Some(idx.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn cursor_id(&self) -> Option<String> {
        let idx = self.table_state.selected()?;
        self.visible().get(idx)?.department.id.clone()
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DepartmentListAction {
        if let Some(ids) = self.confirm_delete.take() {
            return match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.selected_ids.clear();
                    DepartmentListAction::Delete(ids)
                }
                _ => DepartmentListAction::None,
            };
        }

        if self.searching {
            match key {
                KeyCode::Esc | KeyCode::Enter => self.searching = false,
                KeyCode::Backspace => {
                    self.search.pop();
                }
                KeyCode::Char(c) => self.search.push(c),
                _ => {}
            }
            self.clamp_cursor();
            return DepartmentListAction::None;
        }

        let len = self.visible().len();
        let idx = self.table_state.selected().unwrap_or(0);
        match key {
            KeyCode::Esc if !self.search.is_empty() => {
                self.search.clear();
                self.clamp_cursor();
            }
            KeyCode::Esc | KeyCode::Char('q') => return DepartmentListAction::Back,
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                self.table_state.select(Some(idx.saturating_sub(1)));
            }
            KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                self.table_state.select(Some((idx + 1).min(len - 1)));
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_id() {
                    if !self.selected_ids.remove(&id) {
                        self.selected_ids.insert(id);
                    }
                }
            }
            KeyCode::Char('a') => {
                let visible: Vec<String> = self
                    .visible()
                    .iter()
                    .filter_map(|d| d.department.id.clone())
                    .collect();
                if visible.iter().all(|id| self.selected_ids.contains(id)) {
                    for id in &visible {
                        self.selected_ids.remove(id);
                    }
                } else {
                    self.selected_ids.extend(visible);
                }
            }
            KeyCode::Char('r') => return DepartmentListAction::Refresh,
            KeyCode::Char('n') => return DepartmentListAction::New,
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(id) = self.cursor_id() {
                    return DepartmentListAction::Edit(id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let ids: Vec<String> = if self.selected_ids.is_empty() {
                    self.cursor_id().into_iter().collect()
                } else {
                    self.selected_ids.iter().cloned().collect()
                };
                if !ids.is_empty() {
                    self.confirm_delete = Some(ids);
                }
            }
            _ => {}
        }
        DepartmentListAction::None
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let search_style = if self.searching {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if self.searching { "|" } else { "" };
        let search = Paragraph::new(format!("{}{}", self.search, cursor)).block(
            Block::default()
                .title(" Search by name or manager ")
                .borders(Borders::ALL)
                .border_style(search_style),
        );
        frame.render_widget(search, chunks[0]);

        let rows: Vec<Row> = self
            .visible()
            .into_iter()
            .map(|d| {
                let checked = d
                    .department
                    .id
                    .as_ref()
                    .is_some_and(|id| self.selected_ids.contains(id));
                let manager = d
                    .manager
                    .as_ref()
                    .map(|m| format!("{} <{}>", m.name, m.email))
                    .unwrap_or_else(|| "-".to_string());
                Row::new(vec![
                    Cell::from(if checked { "[x]" } else { "[ ]" }),
                    Cell::from(d.department.name.clone()),
                    Cell::from(d.department.description.clone().unwrap_or_default()),
                    Cell::from(manager),
                    Cell::from(d.employee_count.to_string()),
                ])
            })
            .collect();

        let title = if self.loading {
            " Departments (loading...) ".to_string()
        } else if self.selected_ids.is_empty() {
            format!(" Departments ({}) ", self.departments.len())
        } else {
            format!(
                " Departments ({}, {} selected) ",
                self.departments.len(),
                self.selected_ids.len()
            )
        };
        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Percentage(22),
                Constraint::Percentage(33),
                Constraint::Percentage(30),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(["", "Name", "Description", "Manager", "Members"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title(title).borders(Borders::ALL))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(table, chunks[1], &mut self.table_state);

        let footer = if let Some(ids) = &self.confirm_delete {
            Line::from(Span::styled(
                format!("Delete {} department(s)? [y/N]", ids.len()),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        } else if let Some(message) = &self.message {
            Line::from(Span::styled(message.as_str(), Style::default().fg(Color::Yellow)))
        } else {
            Line::from(Span::styled(
                "[/] search  [Space] select  [a] all  [d] delete  [e] edit  [n] new  [Esc] back",
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Department, ManagerSummary};

    fn details(id: &str, name: &str, manager: Option<&str>) -> DepartmentWithDetails {
        DepartmentWithDetails {
            department: Department {
                id: Some(id.to_string()),
                name: name.to_string(),
                ..Department::default()
            },
            manager: manager.map(|m| ManagerSummary {
                id: "m".to_string(),
                name: m.to_string(),
                email: format!("{}@corp.com", m.to_lowercase()),
            }),
            employees: Vec::new(),
            employee_count: 0,
        }
    }

    fn screen() -> DepartmentListScreen {
        let mut screen = DepartmentListScreen::new();
        screen.set_departments(vec![
            details("d1", "Engineering", Some("Carla")),
            details("d2", "Finance", None),
            details("d3", "Sales", Some("Bruno")),
        ]);
        screen
    }

    fn search(screen: &mut DepartmentListScreen, term: &str) {
        screen.handle_key(KeyCode::Char('/'));
        for c in term.chars() {
            screen.handle_key(KeyCode::Char(c));
        }
        screen.handle_key(KeyCode::Enter);
    }

    #[test]
    fn test_search_filters_by_manager() {
        let mut screen = screen();
        search(&mut screen, "bruno");
        let names: Vec<_> = screen.visible().iter().map(|d| d.department.name.clone()).collect();
        assert_eq!(names, vec!["Sales"]);
        assert_eq!(
            screen.handle_key(KeyCode::Char('e')),
            DepartmentListAction::Edit("d3".to_string())
        );

        // Esc clears the search before leaving the screen
        assert_eq!(screen.handle_key(KeyCode::Esc), DepartmentListAction::None);
        assert_eq!(screen.visible().len(), 3);
        assert_eq!(screen.handle_key(KeyCode::Esc), DepartmentListAction::Back);
    }

    #[test]
    fn test_bulk_delete_uses_selection() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Char(' '));
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Char(' '));
        assert_eq!(screen.selected_ids().len(), 2);

        screen.handle_key(KeyCode::Char('d'));
        assert_eq!(
            screen.handle_key(KeyCode::Char('y')),
            DepartmentListAction::Delete(vec!["d1".to_string(), "d3".to_string()])
        );
        assert!(screen.selected_ids().is_empty());
    }

    #[test]
    fn test_delete_without_selection_targets_cursor() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Down);
        screen.handle_key(KeyCode::Delete);
        assert_eq!(
            screen.handle_key(KeyCode::Char('Y')),
            DepartmentListAction::Delete(vec!["d2".to_string()])
        );
    }

    #[test]
    fn test_select_all_toggles_visible() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Char('a'));
        assert_eq!(screen.selected_ids().len(), 3);
        screen.handle_key(KeyCode::Char('a'));
        assert!(screen.selected_ids().is_empty());
    }

    #[test]
    fn test_refresh_drops_stale_selection() {
        let mut screen = screen();
        screen.handle_key(KeyCode::Char('a'));
        screen.set_departments(vec![details("d2", "Finance", None)]);
        assert_eq!(screen.selected_ids().iter().collect::<Vec<_>>(), vec!["d2"]);
    }
}
