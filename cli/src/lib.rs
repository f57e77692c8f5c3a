pub mod client;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod reconciler;
pub mod render;
pub mod resolver;
pub mod util;
