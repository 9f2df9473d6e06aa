// ABOUTME: Library crate for termlink exposing the session bridge, client and PTY host

pub mod bridge;
pub mod client;
pub mod config;
pub mod server;
