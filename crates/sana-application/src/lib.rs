pub mod controller;

pub use controller::{ChatController, ProfileView, SendOutcome, SendStage, Startup};
