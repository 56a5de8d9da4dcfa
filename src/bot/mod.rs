//! Telegram front end.
//!
//! - **commands**: parsing of `/command args` messages
//! - **format**: reply rendering
//! - **handler**: command dispatch over the cached news and user stores
//! - **telegram**: Bot API client and the polling loop

pub mod commands;
pub mod config;
pub mod format;
pub mod handler;
pub mod telegram;

pub use commands::{parse_topic_language, Command, COMMAND_DESCRIPTIONS};
pub use config::BotConfig;
pub use handler::BotHandler;
pub use telegram::TelegramClient;
