//! Web-clip receiver: accepts rendered markdown plus assets over HTTP and
//! commits each clip atomically into a dated folder of a notes vault.

pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod security;
pub mod server;
pub mod vault;
