pub mod complaint_store;
pub mod error;

pub use complaint_store::*;
pub use error::*;
