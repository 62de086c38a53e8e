//! Sign-in screen. F2 switches to account registration.

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use super::form_field::FormField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    None,
    Submit {
        mode: LoginMode,
        email: String,
        password: String,
    },
    Quit,
}

pub struct LoginScreen {
    email: FormField,
    password: FormField,
    /// 0 = email, 1 = password
    focused: usize,
    mode: LoginMode,
    error: Option<String>,
    pub busy: bool,
}

impl Default for LoginScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            email: FormField::text("", "you@company.com", None),
            password: FormField::password(),
            focused: 0,
            mode: LoginMode::SignIn,
            error: None,
            busy: false,
        }
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear the password after a failed attempt, keep the email
    pub fn reset_password(&mut self) {
        self.password = FormField::password();
        self.focused = 1;
    }

    pub fn handle_key(&mut self, key: KeyCode) -> LoginAction {
        if self.busy {
            return LoginAction::None;
        }
        match key {
            KeyCode::Esc => return LoginAction::Quit,
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
                self.focused = 1 - self.focused;
            }
            KeyCode::F(2) => {
                self.mode = match self.mode {
                    LoginMode::SignIn => LoginMode::Register,
                    LoginMode::Register => LoginMode::SignIn,
                };
                self.error = None;
            }
            KeyCode::Enter => {
                if self.focused == 0 {
                    self.focused = 1;
                    return LoginAction::None;
                }
                self.error = None;
                return LoginAction::Submit {
                    mode: self.mode,
                    email: self.email.value().trim().to_string(),
                    password: self.password.value(),
                };
            }
            other => {
                let field = if self.focused == 0 {
                    &mut self.email
                } else {
                    &mut self.password
                };
                if field.handle_key(other) {
                    self.error = None;
                }
            }
        }
        LoginAction::None
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = centered_rect(50, 50, frame.area());
        frame.render_widget(Clear, area);

        let title = match self.mode {
            LoginMode::SignIn => " Sign in ",
            LoginMode::Register => " Create account ",
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1), // Email label
                Constraint::Length(1), // Email
                Constraint::Length(1),
                Constraint::Length(1), // Password label
                Constraint::Length(1), // Password
                Constraint::Length(1),
                Constraint::Length(2), // Error
                Constraint::Min(0),
                Constraint::Length(1), // Help
            ])
            .split(inner);

        let label = |text: &'static str, focused: bool| {
            let style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Paragraph::new(Span::styled(text, style))
        };

        frame.render_widget(label("Email", self.focused == 0), chunks[0]);
        self.email.render(frame, chunks[1], self.focused == 0);
        frame.render_widget(label("Password", self.focused == 1), chunks[3]);
        self.password.render(frame, chunks[4], self.focused == 1);

        let status = if self.busy {
            Some(Span::styled("Please wait...", Style::default().fg(Color::Yellow)))
        } else {
            self.error
                .as_ref()
                .map(|e| Span::styled(e.clone(), Style::default().fg(Color::Red)))
        };
        if let Some(status) = status {
            frame.render_widget(
                Paragraph::new(Line::from(status)).alignment(Alignment::Center),
                chunks[6],
            );
        }

        let switch = match self.mode {
            LoginMode::SignIn => " create account  ",
            LoginMode::Register => " sign in instead  ",
        };
        let help = Line::from(vec![
            Span::styled("[Enter]", Style::default().fg(Color::Cyan)),
            Span::raw(" submit  "),
            Span::styled("[F2]", Style::default().fg(Color::Cyan)),
            Span::raw(switch),
            Span::styled("[Esc]", Style::default().fg(Color::Cyan)),
            Span::raw(" quit"),
        ]);
        frame.render_widget(Paragraph::new(help).alignment(Alignment::Center), chunks[8]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(screen: &mut LoginScreen, text: &str) {
        for c in text.chars() {
            screen.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_enter_moves_to_password_then_submits() {
        let mut screen = LoginScreen::new();
        type_str(&mut screen, "ana@corp.com ");
        assert_eq!(screen.handle_key(KeyCode::Enter), LoginAction::None);
        type_str(&mut screen, "secret");

        assert_eq!(
            screen.handle_key(KeyCode::Enter),
            LoginAction::Submit {
                mode: LoginMode::SignIn,
                email: "ana@corp.com".to_string(),
                password: "secret".to_string(),
            }
        );
    }

    #[test]
    fn test_f2_switches_to_registration() {
        let mut screen = LoginScreen::new();
        screen.handle_key(KeyCode::F(2));
        assert_eq!(screen.mode(), LoginMode::Register);
    }

    #[test]
    fn test_busy_screen_ignores_input() {
        let mut screen = LoginScreen::new();
        screen.busy = true;
        assert_eq!(screen.handle_key(KeyCode::Esc), LoginAction::None);
    }

    #[test]
    fn test_typing_clears_error() {
        let mut screen = LoginScreen::new();
        screen.set_error("User not found");
        type_str(&mut screen, "a");
        assert!(screen.error().is_none());
    }
}
