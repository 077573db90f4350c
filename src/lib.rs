pub mod analyzer;
pub mod config;
pub mod error;
pub mod format;
pub mod inspect;
pub mod logging;
pub mod system;
pub mod ui;
