pub mod app;
pub mod event;
pub mod navigation;
pub mod screens;
pub mod widgets;

pub use app::{run_tui, App};
