pub mod api;
pub mod chat;
pub mod error;
pub mod prediction;
pub mod session;
pub mod user;
pub mod view;

// Re-export common error type
pub use error::{Result, SanaError};
