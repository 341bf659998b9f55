use chrono::{DateTime, Duration, Utc};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::ScreenAction;
use crate::adapters::tui::{
    event::AppEvent,
    widgets::{status_badge, TextInput, TimeAgo},
};
use crate::application::{ComplaintStore, Snapshot};
use crate::domain::{CommentId, Complaint, NewComment, Status, VehicleNumber};
use crate::ports::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DetailFocus {
    Status,
    CommentInput,
    Comments,
}

impl DetailFocus {
    fn next(self) -> Self {
        match self {
            DetailFocus::Status => DetailFocus::CommentInput,
            DetailFocus::CommentInput => DetailFocus::Comments,
            DetailFocus::Comments => DetailFocus::Status,
        }
    }

    fn previous(self) -> Self {
        match self {
            DetailFocus::Status => DetailFocus::Comments,
            DetailFocus::CommentInput => DetailFocus::Status,
            DetailFocus::Comments => DetailFocus::CommentInput,
        }
    }
}

/// Text being edited in place of the comment input.
enum Editing {
    Comment(CommentId, TextInput),
    Summary(TextInput),
}

/// "Complaint Details": status, technician summary and the comment thread
/// of one complaint.
pub struct ComplaintDetailsScreen {
    number: VehicleNumber,
    complaint: Option<Complaint>,
    selected_status: Status,
    focus: DetailFocus,
    comment_input: TextInput,
    comment_state: ListState,
    editing: Option<Editing>,
    // One label per comment, in thread order
    time_labels: Vec<(CommentId, TimeAgo)>,
    author: String,
    live_labels: bool,
    refresh_interval: Duration,
    message: Option<String>,
}

impl ComplaintDetailsScreen {
    pub fn new(number: VehicleNumber, complaints: &Snapshot, config: &AppConfig) -> Self {
        let refresh_seconds = config.time_refresh_seconds.min(u64::from(u32::MAX)) as i64;
        let mut screen = Self {
            number,
            complaint: None,
            selected_status: Status::default(),
            focus: DetailFocus::Status,
            comment_input: TextInput::new("Add Comment", "Write a comment and press Enter"),
            comment_state: ListState::default(),
            editing: None,
            time_labels: Vec::new(),
            author: config.author.clone(),
            live_labels: config.live_time_labels,
            refresh_interval: Duration::seconds(refresh_seconds),
            message: None,
        };
        screen.refresh_at(complaints, Utc::now());
        screen
    }

    pub fn number(&self) -> &VehicleNumber {
        &self.number
    }

    pub fn refresh(&mut self, complaints: &Snapshot) {
        self.refresh_at(complaints, Utc::now());
    }

    fn refresh_at(&mut self, complaints: &Snapshot, now: DateTime<Utc>) {
        self.complaint = complaints.iter().find(|c| c.number == self.number).cloned();

        let Some(complaint) = &self.complaint else {
            self.time_labels.clear();
            self.comment_state.select(None);
            return;
        };
        self.selected_status = complaint.status;

        // Reuse labels of comments that survived so their refresh cadence holds
        let mut previous = std::mem::take(&mut self.time_labels);
        self.time_labels = complaint
            .comments
            .iter()
            .map(|comment| {
                let label = previous
                    .iter()
                    .position(|(id, _)| id == &comment.id)
                    .map(|i| previous.swap_remove(i).1)
                    .unwrap_or_else(|| {
                        TimeAgo::new(comment.time, self.live_labels, self.refresh_interval, now)
                    });
                (comment.id.clone(), label)
            })
            .collect();

        let count = complaint.comments.len();
        match self.comment_state.selected() {
            _ if count == 0 => self.comment_state.select(None),
            Some(i) if i >= count => self.comment_state.select(Some(count - 1)),
            None => self.comment_state.select(Some(0)),
            _ => {}
        }
    }

    /// Advance live time labels. Returns true when any label changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.time_labels
            .iter_mut()
            .fold(false, |changed, (_, label)| label.tick(now) || changed)
    }

    pub fn help_text(&self) -> &'static str {
        if self.editing.is_some() {
            return "Enter: save | Esc: cancel";
        }
        match self.focus {
            DetailFocus::Status => {
                "←/→ or 1-3: set status | t: technician summary | Tab: next section | Esc: back"
            }
            DetailFocus::CommentInput => "type a comment | Enter: post | Tab: next section | Esc: back",
            DetailFocus::Comments => {
                "j/k: select | e: edit | x: delete | Tab: next section | Esc: back"
            }
        }
    }

    pub fn handle_event(&mut self, event: AppEvent, store: &ComplaintStore) -> ScreenAction {
        if event == AppEvent::Quit {
            return ScreenAction::Quit;
        }
        if self.complaint.is_none() {
            return match event {
                AppEvent::Escape | AppEvent::Character('q') => ScreenAction::Back,
                _ => ScreenAction::None,
            };
        }
        if let Some(editing) = self.editing.take() {
            self.handle_editing_event(editing, event, store);
            return ScreenAction::None;
        }

        match event {
            AppEvent::Tab => self.set_focus(self.focus.next()),
            AppEvent::BackTab => self.set_focus(self.focus.previous()),
            AppEvent::Escape => {
                if self.focus == DetailFocus::CommentInput && !self.comment_input.value().is_empty()
                {
                    self.comment_input.clear();
                } else {
                    return ScreenAction::Back;
                }
            }
            _ => match self.focus {
                DetailFocus::Status => return self.handle_status_event(event, store),
                DetailFocus::CommentInput => self.handle_input_event(event, store),
                DetailFocus::Comments => return self.handle_comments_event(event, store),
            },
        }
        ScreenAction::None
    }

    fn handle_status_event(&mut self, event: AppEvent, store: &ComplaintStore) -> ScreenAction {
        match event {
            AppEvent::Character('q') => return ScreenAction::Back,
            AppEvent::Left | AppEvent::Character('h') => {
                self.apply_status(self.selected_status.previous(), store)
            }
            AppEvent::Right | AppEvent::Character('l') => {
                self.apply_status(self.selected_status.next(), store)
            }
            AppEvent::Character(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                self.apply_status(Status::ALL[index], store);
            }
            AppEvent::Character('t') => {
                let current = self
                    .complaint
                    .as_ref()
                    .map(|c| c.technician_comment.as_str())
                    .unwrap_or_default();
                let mut input =
                    TextInput::new("Technician Summary", "Summary of the work done").with_value(current);
                input.set_focused(true);
                self.editing = Some(Editing::Summary(input));
            }
            AppEvent::Down | AppEvent::Enter => self.set_focus(DetailFocus::CommentInput),
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_input_event(&mut self, event: AppEvent, store: &ComplaintStore) {
        match event {
            AppEvent::Character(c) => self.comment_input.insert_char(c),
            AppEvent::Backspace => self.comment_input.delete_char(),
            AppEvent::Left => self.comment_input.move_left(),
            AppEvent::Right => self.comment_input.move_right(),
            AppEvent::Enter => self.submit_comment(store),
            AppEvent::Up => self.set_focus(DetailFocus::Status),
            AppEvent::Down => self.set_focus(DetailFocus::Comments),
            _ => {}
        }
    }

    fn handle_comments_event(&mut self, event: AppEvent, store: &ComplaintStore) -> ScreenAction {
        match event {
            AppEvent::Character('q') => return ScreenAction::Back,
            AppEvent::Down | AppEvent::Character('j') => self.next_comment(),
            AppEvent::Up | AppEvent::Character('k') => {
                if self.comment_state.selected().unwrap_or(0) == 0 {
                    self.set_focus(DetailFocus::CommentInput);
                } else {
                    self.previous_comment();
                }
            }
            AppEvent::Character('e') | AppEvent::Enter => self.start_comment_edit(),
            AppEvent::Character('x') | AppEvent::Delete => self.delete_selected_comment(store),
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_editing_event(&mut self, mut editing: Editing, event: AppEvent, store: &ComplaintStore) {
        let input = match &mut editing {
            Editing::Comment(_, input) | Editing::Summary(input) => input,
        };
        match event {
            AppEvent::Character(c) => input.insert_char(c),
            AppEvent::Backspace => input.delete_char(),
            AppEvent::Left => input.move_left(),
            AppEvent::Right => input.move_right(),
            AppEvent::Escape => return,
            AppEvent::Enter => {
                self.save_edit(editing, store);
                return;
            }
            _ => {}
        }
        self.editing = Some(editing);
    }

    fn save_edit(&mut self, editing: Editing, store: &ComplaintStore) {
        let result = match editing {
            Editing::Comment(id, mut input) => {
                store.edit_comment(&self.number, &id, input.take())
            }
            Editing::Summary(mut input) => store
                .update_status(&self.number, self.selected_status, Some(input.take()))
                .map(|_| ()),
        };
        if let Err(e) = result {
            self.message = Some(e.to_string());
        }
    }

    fn apply_status(&mut self, status: Status, store: &ComplaintStore) {
        self.selected_status = status;
        self.message = match store.update_status(&self.number, status, None) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
    }

    fn submit_comment(&mut self, store: &ComplaintStore) {
        if self.comment_input.is_blank() {
            return;
        }
        let text = self.comment_input.take();
        let comment = NewComment::new(text, self.author.as_str(), Utc::now());
        if let Err(e) = store.add_comment(&self.number, comment) {
            self.message = Some(e.to_string());
        }
    }

    fn start_comment_edit(&mut self) {
        let Some(comment) = self.selected_comment_id().and_then(|id| {
            self.complaint
                .as_ref()
                .and_then(|c| c.comment(&id))
                .cloned()
        }) else {
            return;
        };
        let mut input = TextInput::new("Edit Comment", "").with_value(&comment.text);
        input.set_focused(true);
        self.editing = Some(Editing::Comment(comment.id, input));
    }

    fn delete_selected_comment(&mut self, store: &ComplaintStore) {
        let Some(id) = self.selected_comment_id() else {
            return;
        };
        if let Err(e) = store.delete_comment(&self.number, &id) {
            self.message = Some(e.to_string());
        }
    }

    fn selected_comment_id(&self) -> Option<CommentId> {
        let index = self.comment_state.selected()?;
        self.complaint
            .as_ref()
            .and_then(|c| c.comments.get(index))
            .map(|c| c.id.clone())
    }

    fn next_comment(&mut self) {
        let count = self.complaint.as_ref().map_or(0, |c| c.comments.len());
        if count == 0 {
            return;
        }
        let i = match self.comment_state.selected() {
            Some(i) if i + 1 < count => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.comment_state.select(Some(i));
    }

    fn previous_comment(&mut self) {
        let i = self
            .comment_state
            .selected()
            .map_or(0, |i| i.saturating_sub(1));
        self.comment_state.select(Some(i));
    }

    fn set_focus(&mut self, focus: DetailFocus) {
        self.focus = focus;
        self.comment_input
            .set_focused(focus == DetailFocus::CommentInput);
    }

    fn focused_border(&self, focus: DetailFocus) -> Style {
        if self.focus == focus && self.editing.is_none() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some(complaint) = self.complaint.clone() else {
            let paragraph = Paragraph::new("Request not found.")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                );
            frame.render_widget(paragraph, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(8), // Complaint card
                Constraint::Length(3), // Status selector
                Constraint::Length(3), // Comment input or edit field
                Constraint::Min(0),    // Comment history
                Constraint::Length(1), // Message line
            ])
            .split(area);

        self.render_card(frame, chunks[0], &complaint);
        self.render_status_selector(frame, chunks[1]);

        match &self.editing {
            Some(Editing::Comment(_, input)) | Some(Editing::Summary(input)) => {
                input.render(frame, chunks[2])
            }
            None => self.comment_input.render(frame, chunks[2]),
        }

        self.render_comments(frame, chunks[3], &complaint);

        if let Some(message) = &self.message {
            let paragraph = Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, chunks[4]);
        }
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, complaint: &Complaint) {
        let label = Style::default().fg(Color::DarkGray);
        let summary = if complaint.technician_comment.is_empty() {
            Span::styled("(none)", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(complaint.technician_comment.as_str())
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Vehicle Number: ", label),
                Span::styled(
                    complaint.number.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Model: ", label),
                Span::raw(complaint.model.as_str()),
            ]),
            Line::from(vec![
                Span::styled("Complaint: ", label),
                Span::raw(complaint.complaint.as_str()),
            ]),
            Line::from(vec![
                Span::styled("Status: ", label),
                status_badge(complaint.status),
            ]),
            Line::from(vec![Span::styled("Technician Summary: ", label), summary]),
            Line::from(vec![
                Span::styled("Submitted: ", label),
                Span::styled(complaint.created_display(), Style::default().fg(Color::Gray)),
            ]),
        ];

        let block = Block::default()
            .title("Complaint")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status_selector(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for (i, status) in Status::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("   "));
            }
            spans.push(Span::styled(
                format!("[{}] ", i + 1),
                Style::default().fg(Color::DarkGray),
            ));
            if *status == self.selected_status {
                spans.push(status_badge(*status));
            } else {
                spans.push(Span::styled(
                    status.as_str(),
                    Style::default().fg(Color::Gray),
                ));
            }
        }

        let block = Block::default()
            .title("Update Status")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(self.focused_border(DetailFocus::Status));
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_comments(&mut self, frame: &mut Frame, area: Rect, complaint: &Complaint) {
        let title = format!("Comment History ({})", complaint.comments.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(self.focused_border(DetailFocus::Comments));

        if complaint.comments.is_empty() {
            let paragraph = Paragraph::new("No comments yet")
                .block(block)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(paragraph, area);
            return;
        }

        let meta = Style::default().fg(Color::DarkGray);
        let items: Vec<ListItem> = complaint
            .comments
            .iter()
            .map(|comment| {
                let when = match self.time_labels.iter().find(|(id, _)| id == &comment.id) {
                    Some((_, label)) => label.span(meta),
                    None => Span::styled(comment.time_since_created(), meta),
                };
                ListItem::new(vec![
                    Line::from(comment.text.clone()),
                    Line::from(vec![Span::styled(format!("{} · ", comment.author), meta), when]),
                ])
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, area, &mut self.comment_state);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{empty_store, render_to_text};
    use super::*;

    const NUMBER: &str = "KA01AB1234";

    async fn store_with_complaint() -> ComplaintStore {
        let store = empty_store().await;
        store.add_complaint(NUMBER.into(), "Swift", "Brake noise");
        store
    }

    fn screen(store: &ComplaintStore) -> ComplaintDetailsScreen {
        let config = AppConfig {
            author: "Asha (Service Desk)".to_string(),
            ..AppConfig::default()
        };
        ComplaintDetailsScreen::new(NUMBER.into(), &store.snapshot(), &config)
    }

    fn send(screen: &mut ComplaintDetailsScreen, store: &ComplaintStore, events: &[AppEvent]) {
        for event in events {
            screen.handle_event(event.clone(), store);
            screen.refresh(&store.snapshot());
        }
    }

    fn type_text(screen: &mut ComplaintDetailsScreen, store: &ComplaintStore, text: &str) {
        let events: Vec<_> = text.chars().map(AppEvent::Character).collect();
        send(screen, store, &events);
    }

    fn stored(store: &ComplaintStore) -> Complaint {
        store.complaint(&NUMBER.into()).unwrap()
    }

    #[tokio::test]
    async fn unknown_number_shows_not_found() {
        let store = empty_store().await;
        let mut screen = screen(&store);

        let text = render_to_text(60, 10, |frame| {
            let area = frame.area();
            screen.render(frame, area)
        });
        assert!(text.contains("Request not found."));
        assert_eq!(screen.handle_event(AppEvent::Escape, &store), ScreenAction::Back);
    }

    #[tokio::test]
    async fn status_keys_apply_immediately() {
        let store = store_with_complaint().await;
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::Character('2')]);
        assert_eq!(stored(&store).status, Status::InProgress);

        send(&mut screen, &store, &[AppEvent::Right]);
        assert_eq!(stored(&store).status, Status::Completed);

        // Cycles around the ends
        send(&mut screen, &store, &[AppEvent::Right]);
        assert_eq!(stored(&store).status, Status::Pending);

        send(&mut screen, &store, &[AppEvent::Left, AppEvent::Left]);
        assert_eq!(stored(&store).status, Status::InProgress);
    }

    #[tokio::test]
    async fn posts_comment_with_configured_author() {
        let store = store_with_complaint().await;
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::Tab]);
        type_text(&mut screen, &store, "Pads replaced");
        send(&mut screen, &store, &[AppEvent::Enter]);

        let complaint = stored(&store);
        assert_eq!(complaint.comments.len(), 1);
        assert_eq!(complaint.comments[0].text, "Pads replaced");
        assert_eq!(complaint.comments[0].author, "Asha (Service Desk)");
        assert_eq!(complaint.status, Status::Pending);

        let text = render_to_text(80, 24, |frame| {
            let area = frame.area();
            screen.render(frame, area)
        });
        assert!(text.contains("Pads replaced"));
        assert!(text.contains("Just now"));
    }

    #[tokio::test]
    async fn blank_comment_is_not_posted() {
        let store = store_with_complaint().await;
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::Tab]);
        type_text(&mut screen, &store, "   ");
        send(&mut screen, &store, &[AppEvent::Enter]);

        assert!(stored(&store).comments.is_empty());
    }

    #[tokio::test]
    async fn edit_and_delete_selected_comment() {
        let store = store_with_complaint().await;
        let id = store
            .add_comment(&NUMBER.into(), NewComment::new("Pads worn", "Ravi", Utc::now()))
            .unwrap();
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::BackTab, AppEvent::Character('e')]);
        send(&mut screen, &store, &vec![AppEvent::Backspace; 4]);
        type_text(&mut screen, &store, "replaced");
        send(&mut screen, &store, &[AppEvent::Enter]);

        let complaint = stored(&store);
        assert_eq!(complaint.comment(&id).unwrap().text, "Pads replaced");
        assert_eq!(complaint.comment(&id).unwrap().author, "Ravi");

        send(&mut screen, &store, &[AppEvent::Character('x')]);
        assert!(stored(&store).comments.is_empty());
    }

    #[tokio::test]
    async fn escape_cancels_comment_edit() {
        let store = store_with_complaint().await;
        let id = store
            .add_comment(&NUMBER.into(), NewComment::new("Pads worn", "Ravi", Utc::now()))
            .unwrap();
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::BackTab, AppEvent::Character('e')]);
        type_text(&mut screen, &store, " badly");
        assert_eq!(screen.handle_event(AppEvent::Escape, &store), ScreenAction::None);

        assert_eq!(stored(&store).comment(&id).unwrap().text, "Pads worn");
        assert_eq!(screen.handle_event(AppEvent::Escape, &store), ScreenAction::Back);
    }

    #[tokio::test]
    async fn technician_summary_keeps_status() {
        let store = store_with_complaint().await;
        let mut screen = screen(&store);

        send(&mut screen, &store, &[AppEvent::Character('3'), AppEvent::Character('t')]);
        type_text(&mut screen, &store, "Replaced pads");
        send(&mut screen, &store, &[AppEvent::Enter]);

        let complaint = stored(&store);
        assert_eq!(complaint.status, Status::Completed);
        assert_eq!(complaint.technician_comment, "Replaced pads");
    }

    #[tokio::test]
    async fn live_labels_follow_the_clock() {
        let store = store_with_complaint().await;
        let posted = Utc::now();
        store
            .add_comment(&NUMBER.into(), NewComment::new("Pads worn", "Ravi", posted))
            .unwrap();
        let mut screen = screen(&store);

        assert!(!screen.tick(posted + Duration::seconds(10)));
        assert!(screen.tick(posted + Duration::minutes(10)));
        assert_eq!(screen.time_labels[0].1.display(), "10 minutes ago");
    }

    #[tokio::test]
    async fn static_labels_ignore_ticks() {
        let store = store_with_complaint().await;
        let posted = Utc::now();
        store
            .add_comment(&NUMBER.into(), NewComment::new("Pads worn", "Ravi", posted))
            .unwrap();
        let config = AppConfig {
            live_time_labels: false,
            ..AppConfig::default()
        };
        let mut screen = ComplaintDetailsScreen::new(NUMBER.into(), &store.snapshot(), &config);

        assert!(!screen.tick(posted + Duration::hours(2)));
        assert_eq!(screen.time_labels[0].1.display(), "Just now");
    }

    #[tokio::test]
    async fn deleted_complaint_turns_into_not_found() {
        let store = store_with_complaint().await;
        let mut screen = screen(&store);

        store.delete_complaint(&NUMBER.into()).unwrap();
        screen.refresh(&store.snapshot());

        let text = render_to_text(60, 10, |frame| {
            let area = frame.area();
            screen.render(frame, area)
        });
        assert!(text.contains("Request not found."));
    }
}
