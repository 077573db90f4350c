pub mod builder;
pub mod collector;
pub mod platform;
pub mod port;
pub mod snapshot;
pub mod source;
