use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::watch;

use super::{
    event::{AppEvent, EventHandler},
    navigation::{Navigator, Route},
    screens::{AddComplaintScreen, ComplaintDetailsScreen, ComplaintListScreen, ScreenAction},
};
use crate::application::{ComplaintStore, Snapshot};
use crate::ports::AppConfig;
use ratatui::{prelude::*, widgets::Paragraph};

/// A mounted screen. Dropping it stops its time label refreshes.
enum Screen {
    List(ComplaintListScreen),
    Add(AddComplaintScreen),
    Details(ComplaintDetailsScreen),
}

pub struct App {
    store: Arc<ComplaintStore>,
    updates: watch::Receiver<Snapshot>,
    config: AppConfig,

    // Screens mirror the navigator stack one to one
    navigator: Navigator,
    screens: Vec<Screen>,
}

impl App {
    pub fn new(store: Arc<ComplaintStore>, config: AppConfig) -> Self {
        let mut updates = store.subscribe();
        let snapshot = updates.borrow_and_update().clone();

        Self {
            store,
            updates,
            config,
            navigator: Navigator::new(Route::ComplaintList),
            screens: vec![Screen::List(ComplaintListScreen::new(snapshot))],
        }
    }

    /// Handles one event. Returns true when the app should quit.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        if event == AppEvent::Tick {
            self.tick(Utc::now());
            self.sync();
            return false;
        }

        let action = match self.screens.last_mut() {
            Some(Screen::List(screen)) => screen.handle_event(event, &self.store),
            Some(Screen::Add(screen)) => screen.handle_event(event, &self.store),
            Some(Screen::Details(screen)) => screen.handle_event(event, &self.store),
            None => ScreenAction::Quit,
        };

        let quit = match action {
            ScreenAction::None => false,
            ScreenAction::Quit => true,
            ScreenAction::Navigate(route) => {
                self.open(route);
                false
            }
            ScreenAction::Back => {
                if self.navigator.go_back() {
                    self.screens.pop();
                }
                false
            }
        };

        self.sync();
        quit
    }

    fn open(&mut self, route: Route) {
        let screen = match &route {
            Route::ComplaintList => Screen::List(ComplaintListScreen::new(self.store.snapshot())),
            Route::AddComplaint => Screen::Add(AddComplaintScreen::new()),
            Route::ComplaintDetails { number } => Screen::Details(ComplaintDetailsScreen::new(
                number.clone(),
                &self.store.snapshot(),
                &self.config,
            )),
        };
        self.navigator.navigate(route);
        self.screens.push(screen);
    }

    /// Pushes the latest snapshot to every mounted screen if the store changed.
    fn sync(&mut self) {
        if !self.updates.has_changed().unwrap_or(false) {
            return;
        }
        let snapshot = self.updates.borrow_and_update().clone();
        tracing::debug!(
            "Refreshing {} screens with {} complaints",
            self.navigator.depth(),
            snapshot.len()
        );

        for screen in &mut self.screens {
            match screen {
                Screen::List(screen) => screen.refresh(snapshot.clone()),
                Screen::Details(screen) => screen.refresh(&snapshot),
                Screen::Add(_) => {}
            }
        }
    }

    fn tick(&mut self, now: DateTime<Utc>) {
        for screen in &mut self.screens {
            if let Screen::Details(screen) = screen {
                screen.tick(now);
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(0),    // Screen
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        self.render_title_bar(frame, chunks[0]);

        let help_text = match self.screens.last_mut() {
            Some(Screen::List(screen)) => {
                screen.render(frame, chunks[1]);
                screen.help_text()
            }
            Some(Screen::Add(screen)) => {
                screen.render(frame, chunks[1]);
                screen.help_text()
            }
            Some(Screen::Details(screen)) => {
                screen.render(frame, chunks[1]);
                screen.help_text()
            }
            None => "",
        };

        let paragraph = Paragraph::new(format!("{help_text} | Ctrl+C: quit"))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, chunks[2]);
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            self.navigator.current().title(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(Screen::Details(screen)) = self.screens.last() {
            spans.push(Span::styled(
                format!("  {}", screen.number()),
                Style::default().fg(Color::Gray),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

pub async fn run_tui(mut app: App) -> Result<()> {
    // color-eyre is already initialized in main.rs

    // Set up terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app).await;

    // Cleanup runs even when the loop failed
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut event_handler = EventHandler::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let event = event_handler.next_event().await?;
        if app.handle_event(event) {
            tracing::info!("Quitting");
            return Ok(());
        }
    }
}
