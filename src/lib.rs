pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod state;


// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{RelayError, RelayResult};
pub use state::AppState;
