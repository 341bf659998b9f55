use ratatui::{prelude::*, widgets::Paragraph};

use super::ScreenAction;
use crate::adapters::tui::{event::AppEvent, widgets::TextInput};
use crate::application::ComplaintStore;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FormField {
    Number,
    Model,
    Complaint,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Number => FormField::Model,
            FormField::Model => FormField::Complaint,
            FormField::Complaint => FormField::Number,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Number => FormField::Complaint,
            FormField::Model => FormField::Number,
            FormField::Complaint => FormField::Model,
        }
    }
}

/// "Submit a Complaint" form.
pub struct AddComplaintScreen {
    number: TextInput,
    model: TextInput,
    complaint: TextInput,
    focused: FormField,
}

impl Default for AddComplaintScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl AddComplaintScreen {
    pub fn new() -> Self {
        let mut screen = Self {
            number: TextInput::new("Vehicle Number", "e.g. KA01AB1234").uppercase(),
            model: TextInput::new("Model", "Vehicle make and model"),
            complaint: TextInput::new("Complaint", "Describe the problem"),
            focused: FormField::Number,
        };
        screen.sync_focus();
        screen
    }

    /// Submission stays disabled until every field has text.
    pub fn can_submit(&self) -> bool {
        !self.number.is_blank() && !self.model.is_blank() && !self.complaint.is_blank()
    }

    pub fn help_text(&self) -> &'static str {
        "Tab/↓: next field | Shift+Tab/↑: previous field | Enter: submit | Esc: cancel"
    }

    pub fn handle_event(&mut self, event: AppEvent, store: &ComplaintStore) -> ScreenAction {
        match event {
            AppEvent::Quit => return ScreenAction::Quit,
            AppEvent::Escape => return ScreenAction::Back,
            AppEvent::Tab | AppEvent::Down => self.focus(self.focused.next()),
            AppEvent::BackTab | AppEvent::Up => self.focus(self.focused.previous()),
            AppEvent::Character(c) => self.field_mut().insert_char(c),
            AppEvent::Backspace => self.field_mut().delete_char(),
            AppEvent::Left => self.field_mut().move_left(),
            AppEvent::Right => self.field_mut().move_right(),
            AppEvent::Enter => {
                if self.can_submit() {
                    self.submit(store);
                    return ScreenAction::Back;
                }
                // Enter on an unfinished form moves on to the next field
                self.focus(self.focused.next());
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn submit(&mut self, store: &ComplaintStore) {
        let number = self.number.take();
        let model = self.model.take();
        let complaint = self.complaint.take();
        store.add_complaint(number.trim().into(), model.trim(), complaint.trim());
    }

    fn focus(&mut self, field: FormField) {
        self.focused = field;
        self.sync_focus();
    }

    fn sync_focus(&mut self) {
        self.number.set_focused(self.focused == FormField::Number);
        self.model.set_focused(self.focused == FormField::Model);
        self.complaint.set_focused(self.focused == FormField::Complaint);
    }

    fn field_mut(&mut self) -> &mut TextInput {
        match self.focused {
            FormField::Number => &mut self.number,
            FormField::Model => &mut self.model,
            FormField::Complaint => &mut self.complaint,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Vehicle number
                Constraint::Length(3), // Model
                Constraint::Length(3), // Complaint
                Constraint::Length(1), // Spacer
                Constraint::Length(1), // Submit button
                Constraint::Min(0),
            ])
            .split(area);

        self.number.render(frame, chunks[0]);
        self.model.render(frame, chunks[1]);
        self.complaint.render(frame, chunks[2]);

        let button_style = if self.can_submit() {
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        };
        let button = Paragraph::new(Line::from(Span::styled(" Submit Complaint ", button_style)))
            .alignment(Alignment::Center);
        frame.render_widget(button, chunks[4]);
    }
}
