//! Platform layer for paybot.
//!
//! - [`env::Environment`] abstracts environment variable access so the
//!   configuration loader can be exercised against an in-memory map.
//! - [`config_loader`] turns the flat environment into a validated
//!   [`BotConfig`](paybot_types::config::BotConfig), failing fast on
//!   missing or malformed settings.

pub mod config_loader;
pub mod env;

pub use config_loader::{load_config, load_env_file, normalize_log_level};
pub use env::{Environment, MapEnvironment, NativeEnvironment};
