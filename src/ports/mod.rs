pub mod config_store;
pub mod storage;

pub use config_store::*;
pub use storage::*;
