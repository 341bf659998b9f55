use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};

use super::ScreenAction;
use crate::adapters::tui::{
    event::AppEvent,
    navigation::Route,
    widgets::{status_badge, TextInput},
};
use crate::application::{ComplaintStore, Snapshot};
use crate::domain::Complaint;

/// "Complaint History": every complaint with its status, newest last.
pub struct ComplaintListScreen {
    complaints: Snapshot,
    // Indexes into `complaints`, in display order
    filtered: Vec<usize>,
    table_state: TableState,
    search: TextInput,
    matcher: Matcher,
    message: Option<String>,
}

impl ComplaintListScreen {
    pub fn new(complaints: Snapshot) -> Self {
        let mut screen = Self {
            complaints,
            filtered: Vec::new(),
            table_state: TableState::default(),
            search: TextInput::new("Search", "Press / to filter complaints"),
            matcher: Matcher::new(Config::DEFAULT),
            message: None,
        };
        screen.update_filtered();
        screen
    }

    pub fn refresh(&mut self, complaints: Snapshot) {
        self.complaints = complaints;
        self.update_filtered();
    }

    pub fn selected(&self) -> Option<&Complaint> {
        self.table_state
            .selected()
            .and_then(|i| self.filtered.get(i))
            .and_then(|&index| self.complaints.get(index))
    }

    pub fn visible(&self) -> impl Iterator<Item = &Complaint> {
        self.filtered.iter().filter_map(|&i| self.complaints.get(i))
    }

    pub fn help_text(&self) -> &'static str {
        if self.search.is_focused() {
            "type to filter | Enter/Tab: back to list | Esc: clear filter"
        } else {
            "j/k: navigate | Enter: details | a: add complaint | D: delete | /: search | q: quit"
        }
    }

    pub fn handle_event(&mut self, event: AppEvent, store: &ComplaintStore) -> ScreenAction {
        if self.search.is_focused() {
            return self.handle_search_event(event);
        }

        match event {
            AppEvent::Quit | AppEvent::Character('q') => return ScreenAction::Quit,
            AppEvent::Down | AppEvent::Character('j') => self.next(),
            AppEvent::Up | AppEvent::Character('k') => self.previous(),
            AppEvent::Character('g') => self.select_first(),
            AppEvent::Character('G') => {
                if !self.filtered.is_empty() {
                    self.table_state.select(Some(self.filtered.len() - 1));
                }
            }
            AppEvent::Character('/') => self.search.set_focused(true),
            AppEvent::Character('a') => return ScreenAction::Navigate(Route::AddComplaint),
            AppEvent::Enter => {
                if let Some(complaint) = self.selected() {
                    return ScreenAction::Navigate(Route::ComplaintDetails {
                        number: complaint.number.clone(),
                    });
                }
            }
            AppEvent::Character('D') | AppEvent::Delete => self.delete_selected(store),
            AppEvent::Escape if !self.search.value().is_empty() => {
                self.search.clear();
                self.update_filtered();
            }
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_search_event(&mut self, event: AppEvent) -> ScreenAction {
        match event {
            AppEvent::Quit => return ScreenAction::Quit,
            AppEvent::Character(c) => {
                self.search.insert_char(c);
                self.update_filtered();
            }
            AppEvent::Backspace => {
                self.search.delete_char();
                self.update_filtered();
            }
            AppEvent::Left => self.search.move_left(),
            AppEvent::Right => self.search.move_right(),
            AppEvent::Escape => {
                self.search.clear();
                self.search.set_focused(false);
                self.update_filtered();
            }
            AppEvent::Enter | AppEvent::Tab | AppEvent::Down => self.search.set_focused(false),
            _ => {}
        }
        ScreenAction::None
    }

    fn delete_selected(&mut self, store: &ComplaintStore) {
        let Some(number) = self.selected().map(|c| c.number.clone()) else {
            return;
        };
        self.message = match store.delete_complaint(&number) {
            Ok(_) => Some(format!("Deleted complaint {number}")),
            Err(e) => Some(e.to_string()),
        };
    }

    fn update_filtered(&mut self) {
        let query = self.search.value().trim();
        if query.is_empty() {
            self.filtered = (0..self.complaints.len()).collect();
        } else {
            let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
            let mut buf = Vec::new();
            let mut scored: Vec<(u32, usize)> = self
                .complaints
                .iter()
                .enumerate()
                .filter_map(|(i, complaint)| {
                    let haystack = format!(
                        "{} {} {}",
                        complaint.number, complaint.model, complaint.complaint
                    );
                    pattern
                        .score(Utf32Str::new(&haystack, &mut buf), &mut self.matcher)
                        .map(|score| (score, i))
                })
                .collect();
            scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
            self.filtered = scored.into_iter().map(|(_, i)| i).collect();
        }

        // Keep the selection inside the list
        match self.table_state.selected() {
            _ if self.filtered.is_empty() => self.table_state.select(None),
            Some(selected) if selected >= self.filtered.len() => {
                self.table_state.select(Some(self.filtered.len() - 1))
            }
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    fn select_first(&mut self) {
        if !self.filtered.is_empty() {
            self.table_state.select(Some(0));
        }
    }

    fn next(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.filtered.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        let i = self.table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.table_state.select(Some(i));
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search bar
                Constraint::Min(0),    // Table
                Constraint::Length(1), // Message line
            ])
            .split(area);

        self.search.render(frame, chunks[0]);
        self.render_table(frame, chunks[1]);

        if let Some(message) = &self.message {
            let paragraph =
                Paragraph::new(message.as_str()).style(Style::default().fg(Color::Yellow));
            frame.render_widget(paragraph, chunks[2]);
        }
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let title = format!("Complaints ({})", self.filtered.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Green));

        if self.filtered.is_empty() {
            let message = if self.search.value().trim().is_empty() {
                "No complaints found."
            } else {
                "No complaints match your search"
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(paragraph, area);
            return;
        }

        let header_cells = ["Vehicle", "Complaint", "Model", "Created", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = self
            .visible()
            .map(|complaint| {
                let summary = complaint.complaint.lines().next().unwrap_or_default();
                Row::new(vec![
                    Cell::from(complaint.number.to_string())
                        .style(Style::default().add_modifier(Modifier::BOLD)),
                    Cell::from(summary.to_string()),
                    Cell::from(complaint.model.clone()).style(Style::default().fg(Color::Gray)),
                    Cell::from(complaint.created_display())
                        .style(Style::default().fg(Color::DarkGray)),
                    Cell::from(Line::from(status_badge(complaint.status))),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12), // Vehicle number
                Constraint::Min(20),    // Complaint text (flexible)
                Constraint::Length(16), // Model
                Constraint::Length(13), // Created date
                Constraint::Length(13), // Status badge
            ],
        )
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{empty_store, render_to_text};
    use super::*;
    use crate::domain::Status;

    async fn seeded_store() -> ComplaintStore {
        let store = empty_store().await;
        store.add_complaint("KA01AB1234".into(), "Swift", "Brake noise");
        store.add_complaint("MH12XY9876".into(), "Innova", "AC not cooling");
        store.add_complaint("TN09CD5555".into(), "Nexon", "Battery drains overnight");
        store
    }

    fn type_query(screen: &mut ComplaintListScreen, store: &ComplaintStore, query: &str) {
        screen.handle_event(AppEvent::Character('/'), store);
        for c in query.chars() {
            screen.handle_event(AppEvent::Character(c), store);
        }
    }

    #[tokio::test]
    async fn empty_state_message() {
        let store = empty_store().await;
        let mut screen = ComplaintListScreen::new(store.snapshot());

        let text = render_to_text(80, 12, |frame| {
            let area = frame.area();
            screen.render(frame, area)
        });
        assert!(text.contains("No complaints found."));
    }

    #[tokio::test]
    async fn renders_rows_with_status() {
        let store = seeded_store().await;
        store
            .update_status(&"MH12XY9876".into(), Status::InProgress, None)
            .unwrap();
        let mut screen = ComplaintListScreen::new(store.snapshot());

        let text = render_to_text(100, 12, |frame| {
            let area = frame.area();
            screen.render(frame, area)
        });
        assert!(text.contains("KA01AB1234"));
        assert!(text.contains("AC not cooling"));
        assert!(text.contains("In Progress"));
        assert!(text.contains("Complaints (3)"));
    }

    #[tokio::test]
    async fn enter_opens_selected_complaint() {
        let store = seeded_store().await;
        let mut screen = ComplaintListScreen::new(store.snapshot());

        screen.handle_event(AppEvent::Down, &store);
        let action = screen.handle_event(AppEvent::Enter, &store);
        assert_eq!(
            action,
            ScreenAction::Navigate(Route::ComplaintDetails {
                number: "MH12XY9876".into()
            })
        );
        assert_eq!(
            screen.handle_event(AppEvent::Character('a'), &store),
            ScreenAction::Navigate(Route::AddComplaint)
        );
    }

    #[tokio::test]
    async fn fuzzy_filter_narrows_rows() {
        let store = seeded_store().await;
        let mut screen = ComplaintListScreen::new(store.snapshot());

        type_query(&mut screen, &store, "battery");
        let numbers: Vec<_> = screen.visible().map(|c| c.number.to_string()).collect();
        assert_eq!(numbers, vec!["TN09CD5555"]);

        // Typing 'q' while searching filters instead of quitting
        assert_eq!(
            screen.handle_event(AppEvent::Character('q'), &store),
            ScreenAction::None
        );
        assert_eq!(screen.visible().count(), 0);

        screen.handle_event(AppEvent::Escape, &store);
        assert_eq!(screen.visible().count(), 3);
    }

    #[tokio::test]
    async fn delete_removes_selected_complaint() {
        let store = seeded_store().await;
        let mut screen = ComplaintListScreen::new(store.snapshot());

        screen.handle_event(AppEvent::Character('D'), &store);
        assert!(store.complaint(&"KA01AB1234".into()).is_none());

        screen.refresh(store.snapshot());
        assert_eq!(screen.visible().count(), 2);
        assert_eq!(
            screen.selected().map(|c| c.number.to_string()),
            Some("MH12XY9876".to_string())
        );
    }

    #[tokio::test]
    async fn selection_clamps_after_refresh() {
        let store = seeded_store().await;
        let mut screen = ComplaintListScreen::new(store.snapshot());

        screen.handle_event(AppEvent::Character('G'), &store);
        store.delete_complaint(&"TN09CD5555".into()).unwrap();
        screen.refresh(store.snapshot());

        assert_eq!(
            screen.selected().map(|c| c.number.to_string()),
            Some("MH12XY9876".to_string())
        );
    }
}
