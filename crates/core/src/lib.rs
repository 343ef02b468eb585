pub mod config;
pub mod error;
pub mod settings;
pub mod task;
pub mod time;

pub use config::Config;
pub use error::*;
pub use settings::EmailSettings;
pub use task::*;
