pub mod status_badge;
pub mod text_input;
pub mod time_ago;

pub use status_badge::*;
pub use text_input::*;
pub use time_ago::*;
