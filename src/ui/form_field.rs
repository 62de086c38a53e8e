//! Reusable form field widgets for the record forms

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::form::formatters::{
    format_cpf, format_currency, format_phone, format_zip_code, remove_formatting,
};
use crate::form::FieldErrors;

/// Live formatting applied to a text input after every keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMask {
    None,
    Cpf,
    Phone,
    ZipCode,
    /// Typed digits are cents: `123456` → `R$ 1.234,56`
    Currency,
}

impl InputMask {
    /// Longest digit run accepted by the mask
    fn max_digits(self) -> Option<usize> {
        match self {
            InputMask::Cpf => Some(11),
            InputMask::Phone => Some(11),
            InputMask::ZipCode => Some(8),
            InputMask::Currency => Some(9),
            InputMask::None => None,
        }
    }

    fn is_digit_mask(self) -> bool {
        self.max_digits().is_some()
    }

    /// Reformat `raw` for display
    pub fn apply(self, raw: &str) -> String {
        let digits = || {
            let mut d = remove_formatting(raw);
            if let Some(max) = self.max_digits() {
                d.truncate(max);
            }
            d
        };
        match self {
            InputMask::None => raw.to_string(),
            InputMask::Cpf => format_cpf(&digits()),
            InputMask::Phone => format_phone(&digits()),
            InputMask::ZipCode => format_zip_code(&digits()),
            InputMask::Currency => {
                let cents: u64 = digits().parse().unwrap_or(0);
                if cents == 0 {
                    String::new()
                } else {
                    format_currency(cents as f64 / 100.0)
                }
            }
        }
    }
}

/// A form field widget that can handle different input types
pub enum FormField {
    /// Single-line text input
    TextInput {
        value: String,
        cursor_pos: usize,
        placeholder: String,
        max_length: Option<usize>,
        mask: InputMask,
        secret: bool,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
    /// Selection from predefined options; the first option may be a blank
    /// "not selected" entry
    EnumSelect {
        options: Vec<String>,
        selected: usize,
        list_state: ListState,
    },
    /// Date input (YYYY-MM-DD format)
    DateInput { value: String, cursor_pos: usize },
}

impl FormField {
    pub fn text(value: &str, placeholder: &str, max_length: Option<usize>) -> Self {
        FormField::TextInput {
            cursor_pos: value.chars().count(),
            value: value.to_string(),
            placeholder: placeholder.to_string(),
            max_length,
            mask: InputMask::None,
            secret: false,
        }
    }

    pub fn masked(value: &str, placeholder: &str, mask: InputMask) -> Self {
        let value = mask.apply(value);
        FormField::TextInput {
            cursor_pos: value.chars().count(),
            value,
            placeholder: placeholder.to_string(),
            max_length: None,
            mask,
            secret: false,
        }
    }

    /// Text input rendered as bullets
    pub fn password() -> Self {
        FormField::TextInput {
            value: String::new(),
            cursor_pos: 0,
            placeholder: String::new(),
            max_length: None,
            mask: InputMask::None,
            secret: true,
        }
    }

    pub fn text_area(value: &str, placeholder: &str) -> Self {
        let mut textarea = TextArea::default();
        textarea.insert_str(value);
        FormField::TextArea {
            textarea: Box::new(textarea),
            placeholder: placeholder.to_string(),
        }
    }

    /// Select among `options`, preselecting `current` when present
    pub fn select(options: Vec<String>, current: &str) -> Self {
        let selected = options.iter().position(|o| o == current).unwrap_or(0);
        let mut list_state = ListState::default();
        list_state.select(Some(selected));
        FormField::EnumSelect {
            options,
            selected,
            list_state,
        }
    }

    pub fn date(value: &str) -> Self {
        FormField::DateInput {
            cursor_pos: value.len(),
            value: value.to_string(),
        }
    }

    /// Get the current value as a string
    pub fn value(&self) -> String {
        match self {
            FormField::TextInput { value, .. } => value.clone(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n"),
            FormField::EnumSelect {
                options, selected, ..
            } => options.get(*selected).cloned().unwrap_or_default(),
            FormField::DateInput { value, .. } => value.clone(),
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match self {
            FormField::EnumSelect { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                max_length,
                mask,
                ..
            } => handle_text_key(value, cursor_pos, *max_length, *mask, key),
            FormField::TextArea { textarea, .. } => match key {
                // Tab moves focus between fields
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Esc => false,
                _ => {
                    textarea.input(crossterm::event::KeyEvent::new(
                        key,
                        crossterm::event::KeyModifiers::NONE,
                    ));
                    true
                }
            },
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => match key {
                KeyCode::Up | KeyCode::Char('k') => {
                    if *selected > 0 {
                        *selected -= 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if *selected < options.len().saturating_sub(1) {
                        *selected += 1;
                        list_state.select(Some(*selected));
                    }
                    true
                }
                _ => false,
            },
            FormField::DateInput { value, cursor_pos } => match key {
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                    if value.len() < 10 {
                        value.insert(*cursor_pos, c);
                        *cursor_pos += 1;
                    }
                    true
                }
                KeyCode::Backspace => {
                    if *cursor_pos > 0 {
                        *cursor_pos -= 1;
                        value.remove(*cursor_pos);
                    }
                    true
                }
                KeyCode::Left => {
                    *cursor_pos = cursor_pos.saturating_sub(1);
                    true
                }
                KeyCode::Right => {
                    if *cursor_pos < value.len() {
                        *cursor_pos += 1;
                    }
                    true
                }
                _ => false,
            },
        }
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextInput { .. } | FormField::DateInput { .. } => 1,
            FormField::TextArea { .. } => 4,
            FormField::EnumSelect { options, .. } => (options.len() as u16).clamp(1, 4),
        }
    }

    /// Render the field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let text_style = Style::default().fg(if focused { Color::White } else { Color::Gray });

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                max_length,
                secret,
                ..
            } => {
                if value.is_empty() && !focused {
                    let line = Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ));
                    frame.render_widget(Paragraph::new(line), area);
                    return;
                }

                let mut text: String = if *secret {
                    "•".repeat(value.chars().count())
                } else {
                    value.clone()
                };
                if focused {
                    insert_cursor(&mut text, *cursor_pos);
                }

                let suffix = max_length
                    .map(|m| format!(" ({}/{})", value.chars().count(), m))
                    .unwrap_or_default();

                let line = Line::from(vec![
                    Span::raw(text),
                    Span::styled(suffix, Style::default().fg(Color::DarkGray)),
                ]);
                frame.render_widget(Paragraph::new(line).style(text_style), area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                let border_color = if focused { Color::Cyan } else { Color::Gray };
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border_color)),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
            FormField::EnumSelect {
                options,
                selected,
                list_state,
            } => {
                let items: Vec<ListItem> = options
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        let label = if opt.is_empty() { "(none)" } else { opt.as_str() };
                        let style = if i == *selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default().fg(Color::Gray)
                        };
                        ListItem::new(Span::styled(label.to_string(), style))
                    })
                    .collect();

                let highlight = if focused {
                    Style::default()
                        .add_modifier(Modifier::REVERSED)
                        .fg(Color::Cyan)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                let list = List::new(items)
                    .highlight_style(highlight)
                    .highlight_symbol("> ");

                frame.render_stateful_widget(list, area, list_state);
            }
            FormField::DateInput { value, cursor_pos } => {
                let display = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        "YYYY-MM-DD",
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let mut text = value.clone();
                    if focused {
                        insert_cursor(&mut text, *cursor_pos);
                    }
                    Line::from(text)
                };
                frame.render_widget(Paragraph::new(display).style(text_style), area);
            }
        }
    }
}

fn insert_cursor(text: &mut String, cursor_chars: usize) {
    let byte_pos = text
        .char_indices()
        .nth(cursor_chars)
        .map_or(text.len(), |(i, _)| i);
    text.insert(byte_pos, '|');
}

fn handle_text_key(
    value: &mut String,
    cursor_pos: &mut usize,
    max_length: Option<usize>,
    mask: InputMask,
    key: KeyCode,
) -> bool {
    if mask.is_digit_mask() {
        // Masked inputs edit at the end only; the mask owns the layout
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let mut raw = remove_formatting(value);
                raw.push(c);
                *value = mask.apply(&raw);
            }
            KeyCode::Backspace => {
                let mut raw = remove_formatting(value);
                raw.pop();
                *value = mask.apply(&raw);
            }
            KeyCode::Char(_) => {}
            _ => return false,
        }
        *cursor_pos = value.chars().count();
        return true;
    }

    let len = value.chars().count();
    let byte_at = |s: &str, pos: usize| s.char_indices().nth(pos).map_or(s.len(), |(i, _)| i);
    match key {
        KeyCode::Char(c) => {
            if max_length.map_or(true, |m| len < m) {
                let at = byte_at(value, *cursor_pos);
                value.insert(at, c);
                *cursor_pos += 1;
            }
            true
        }
        KeyCode::Backspace => {
            if *cursor_pos > 0 {
                *cursor_pos -= 1;
                let at = byte_at(value, *cursor_pos);
                value.remove(at);
            }
            true
        }
        KeyCode::Delete => {
            if *cursor_pos < len {
                let at = byte_at(value, *cursor_pos);
                value.remove(at);
            }
            true
        }
        KeyCode::Left => {
            *cursor_pos = cursor_pos.saturating_sub(1);
            true
        }
        KeyCode::Right => {
            if *cursor_pos < len {
                *cursor_pos += 1;
            }
            true
        }
        KeyCode::Home => {
            *cursor_pos = 0;
            true
        }
        KeyCode::End => {
            *cursor_pos = len;
            true
        }
        _ => false,
    }
}

// ─── Field groups ────────────────────────────────────────────────────────────

/// A field bound to a record path, with its label
pub struct LabeledField {
    /// Record field path, the key used by `FieldErrors`
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub field: FormField,
}

impl LabeledField {
    pub fn new(key: &'static str, label: &'static str, field: FormField) -> Self {
        Self {
            key,
            label,
            required: true,
            field,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// The fields of one form section with a focus cursor
#[derive(Default)]
pub struct FieldGroup {
    pub fields: Vec<LabeledField>,
    pub focused: usize,
}

impl FieldGroup {
    pub fn new(fields: Vec<LabeledField>) -> Self {
        Self { fields, focused: 0 }
    }

    pub fn focused_field(&self) -> Option<&LabeledField> {
        self.fields.get(self.focused)
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut LabeledField> {
        self.fields.get_mut(self.focused)
    }

    pub fn next_field(&mut self) {
        if self.focused < self.fields.len().saturating_sub(1) {
            self.focused += 1;
        }
    }

    pub fn prev_field(&mut self) {
        self.focused = self.focused.saturating_sub(1);
    }

    pub fn is_last_field(&self) -> bool {
        self.focused >= self.fields.len().saturating_sub(1)
    }

    /// Focus the first field that has an error
    pub fn focus_first_error(&mut self, errors: &FieldErrors) {
        if let Some(idx) = self.fields.iter().position(|f| errors.contains(f.key)) {
            self.focused = idx;
        }
    }

    /// Render label, widget and error line for every field
    pub fn render(&mut self, frame: &mut Frame, area: Rect, errors: &FieldErrors) {
        let constraints: Vec<Constraint> = self
            .fields
            .iter()
            .map(|f| Constraint::Length(f.field.render_height() + 2))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, labeled) in self.fields.iter_mut().enumerate() {
            let focused = idx == self.focused;
            let row = rows[idx];
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Length(labeled.field.render_height()),
                    Constraint::Length(1),
                ])
                .split(row);

            let marker = if labeled.required { " *" } else { "" };
            let label_style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("{}{}", labeled.label, marker),
                    label_style,
                ))),
                parts[0],
            );

            labeled.field.render(frame, parts[1], focused);

            if let Some(message) = errors.get(labeled.key) {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        format!("  {message}"),
                        Style::default().fg(Color::Red),
                    )),
                    parts[2],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(field: &mut FormField, text: &str) {
        for c in text.chars() {
            field.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_text_input_handles_chars() {
        let mut field = FormField::text("", "Name", None);
        assert!(field.handle_key(KeyCode::Char('h')));
        assert!(field.handle_key(KeyCode::Char('i')));
        assert_eq!(field.value(), "hi");
    }

    #[test]
    fn test_text_input_respects_max_length() {
        let mut field = FormField::text("", "", Some(3));
        type_str(&mut field, "abcd");
        assert_eq!(field.value(), "abc");
    }

    #[test]
    fn test_text_input_edits_multibyte_text() {
        let mut field = FormField::text("João", "", None);
        field.handle_key(KeyCode::Left);
        field.handle_key(KeyCode::Backspace);
        assert_eq!(field.value(), "Joo");
    }

    #[test]
    fn test_cpf_mask_formats_while_typing() {
        let mut field = FormField::masked("", "000.000.000-00", InputMask::Cpf);
        type_str(&mut field, "52998224725999");
        assert_eq!(field.value(), "529.982.247-25");

        field.handle_key(KeyCode::Backspace);
        assert_eq!(field.value(), "5299822472");
    }

    #[test]
    fn test_phone_and_zip_masks() {
        let mut phone = FormField::masked("", "", InputMask::Phone);
        type_str(&mut phone, "11987654321");
        assert_eq!(phone.value(), "(11) 98765-4321");

        let mut zip = FormField::masked("", "", InputMask::ZipCode);
        type_str(&mut zip, "01310-100");
        assert_eq!(zip.value(), "01310-100");
    }

    #[test]
    fn test_currency_mask_treats_digits_as_cents() {
        let mut field = FormField::masked("", "R$ 0,00", InputMask::Currency);
        type_str(&mut field, "450000");
        assert_eq!(field.value(), "R$ 4.500,00");

        // Existing values are re-rendered through the mask
        let field = FormField::masked(&format_currency(1234.5), "", InputMask::Currency);
        assert_eq!(field.value(), "R$ 1.234,50");
    }

    #[test]
    fn test_enum_select_navigation() {
        let options = vec!["CLT".to_string(), "PJ".to_string(), "Intern".to_string()];
        let mut field = FormField::select(options, "PJ");
        assert_eq!(field.value(), "PJ");

        field.handle_key(KeyCode::Up);
        assert_eq!(field.value(), "CLT");
        field.handle_key(KeyCode::Up);
        assert_eq!(field.value(), "CLT");

        field.handle_key(KeyCode::Down);
        field.handle_key(KeyCode::Down);
        assert_eq!(field.selected_index(), Some(2));
    }

    #[test]
    fn test_date_input_only_accepts_date_chars() {
        let mut field = FormField::date("");
        type_str(&mut field, "2026-1x0-18");
        assert_eq!(field.value(), "2026-10-18");
    }

    #[test]
    fn test_field_group_focus_first_error() {
        let mut group = FieldGroup::new(vec![
            LabeledField::new("a", "A", FormField::text("", "", None)),
            LabeledField::new("b", "B", FormField::text("", "", None)),
        ]);
        let mut errors = FieldErrors::new();
        errors.insert("b", "Required");

        group.focus_first_error(&errors);
        assert_eq!(group.focused_field().map(|f| f.key), Some("b"));
        assert!(group.is_last_field());

        group.next_field();
        assert_eq!(group.focused, 1);
        group.prev_field();
        group.prev_field();
        assert_eq!(group.focused, 0);
    }
}
