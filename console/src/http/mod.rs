pub mod apps;
pub mod auth;
pub mod client;
pub mod files;
pub mod stats;
