pub mod comment;
pub mod complaint;
pub mod error;
pub mod relative_time;

pub use comment::*;
pub use complaint::*;
pub use error::*;
pub use relative_time::*;
