pub mod compositor;
pub mod error;
pub mod math;
pub mod operations;
pub mod projection;
pub mod snap;
pub mod topology;

pub use error::{Result, SelectError};
