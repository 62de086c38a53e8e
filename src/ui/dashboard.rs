use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Employees,
    RegisterEmployee,
    Departments,
    NewDepartment,
    SignOut,
}

impl MenuItem {
    pub fn all() -> &'static [MenuItem] {
        &[
            MenuItem::Employees,
            MenuItem::RegisterEmployee,
            MenuItem::Departments,
            MenuItem::NewDepartment,
            MenuItem::SignOut,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Employees => "Employees",
            MenuItem::RegisterEmployee => "Register employee",
            MenuItem::Departments => "Departments",
            MenuItem::NewDepartment => "New department",
            MenuItem::SignOut => "Sign out",
        }
    }

    fn shortcut(&self) -> char {
        match self {
            MenuItem::Employees => 'e',
            MenuItem::RegisterEmployee => 'r',
            MenuItem::Departments => 'd',
            MenuItem::NewDepartment => 'n',
            MenuItem::SignOut => 'o',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    None,
    Open(MenuItem),
    Quit,
}

/// Counts shown in the header
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardStats {
    pub employees: usize,
    pub active_employees: usize,
    pub departments: usize,
}

pub struct Dashboard {
    list_state: ListState,
    pub user_email: String,
    pub stats: DashboardStats,
    pub status: Option<String>,
}

impl Dashboard {
    pub fn new(user_email: impl Into<String>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            list_state,
            user_email: user_email.into(),
            stats: DashboardStats::default(),
            status: None,
        }
    }

    pub fn selected(&self) -> MenuItem {
        let idx = self.list_state.selected().unwrap_or(0);
        MenuItem::all()[idx.min(MenuItem::all().len() - 1)]
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DashboardAction {
        let len = MenuItem::all().len();
        let idx = self.list_state.selected().unwrap_or(0);
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return DashboardAction::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_state.select(Some(idx.saturating_sub(1)));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.list_state.select(Some((idx + 1).min(len - 1)));
            }
            KeyCode::Enter => return DashboardAction::Open(self.selected()),
            KeyCode::Char(c) => {
                if let Some(item) = MenuItem::all().iter().find(|m| m.shortcut() == c) {
                    return DashboardAction::Open(*item);
                }
            }
            _ => {}
        }
        DashboardAction::None
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

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " staffdesk ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} employees ({} active) · {} departments",
                self.stats.employees, self.stats.active_employees, self.stats.departments
            )),
            Span::styled(
                format!("   {}", self.user_email),
                Style::default().fg(Color::DarkGray),
            ),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, chunks[0]);

        let items: Vec<ListItem> = MenuItem::all()
            .iter()
            .map(|item| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("[{}] ", item.shortcut()),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(item.label()),
                ]))
            })
            .collect();
        let menu = List::new(items)
            .block(Block::default().title(" Menu ").borders(Borders::ALL))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(menu, chunks[1], &mut self.list_state);

        let footer = match &self.status {
            Some(status) => Line::from(Span::styled(
                status.as_str(),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(Span::styled(
                "[Enter] open  [q] quit",
                Style::default().fg(Color::DarkGray),
            )),
        };
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }
}
