pub mod config;
pub mod logger;
pub mod prompt;

pub use config::AppConfig;
