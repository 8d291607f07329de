pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod display;
pub mod input;
pub mod prompts;
pub mod session;
pub mod template;
pub mod transcript;
pub mod transport;
