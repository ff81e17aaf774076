pub mod config;
pub mod status_poller;
