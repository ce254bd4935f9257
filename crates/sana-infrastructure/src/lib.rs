pub mod config_storage;
pub mod paths;
pub mod session_storage;

pub use config_storage::ClientConfig;
pub use paths::SanaPaths;
pub use session_storage::FileSessionStore;
