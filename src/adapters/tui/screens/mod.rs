pub mod add_complaint;
pub mod complaint_details;
pub mod complaint_list;

pub use add_complaint::*;
pub use complaint_details::*;
pub use complaint_list::*;

use super::navigation::Route;

/// What a screen asks the app to do after handling an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    None,
    Navigate(Route),
    Back,
    Quit,
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::adapters::storage::MemoryStorage;
    use crate::application::ComplaintStore;
    use ratatui::{backend::TestBackend, buffer::Buffer, Frame, Terminal};
    use std::sync::Arc;

    pub async fn empty_store() -> ComplaintStore {
        ComplaintStore::open(Arc::new(MemoryStorage::new()))
            .await
            .unwrap()
    }

    /// Renders into an in-memory terminal and returns the screen text, one line per row.
    pub fn render_to_text(width: u16, height: u16, draw: impl FnOnce(&mut Frame)) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(draw).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn buffer_text(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
