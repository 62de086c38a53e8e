pub mod dashboard;
pub mod department_form;
pub mod department_list;
pub mod employee_list;
pub mod form_field;
pub mod login;
pub mod terminal_guard;
pub mod wizard;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub use dashboard::{Dashboard, DashboardAction, DashboardStats, MenuItem};
pub use department_form::{DepartmentFormAction, DepartmentFormScreen, MemberOption};
pub use department_list::{DepartmentListAction, DepartmentListScreen};
pub use employee_list::{EmployeeListAction, EmployeeListScreen};
pub use login::{LoginAction, LoginMode, LoginScreen};
pub use terminal_guard::{install_panic_hook, TerminalGuard};
pub use wizard::{EmployeeWizard, ManagerOption, WizardAction};

/// Rect of `percent_x` by `percent_y` centered in `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect.width, 50);
        assert_eq!(rect.height, 20);
        assert_eq!(rect.x, 25);
        assert_eq!(rect.y, 10);
    }
}
