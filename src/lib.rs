pub mod catalog;
pub mod docker;
pub mod server;
pub mod version;
pub mod web;
