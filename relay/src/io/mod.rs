//! Side-effecting building blocks: configuration, child processes, HTTP.

pub mod chat;
pub mod config;
pub mod delegate;
pub mod process;
