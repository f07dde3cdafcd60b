//! EasyTP console library
//!
//! Client for the EasyTP remote desktop backend: session handling,
//! application polling, the personal file store and the admin audit log.

pub mod activity;
pub mod app;
pub mod apps;
pub mod authn;
pub mod cache;
pub mod errors;
pub mod files;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod storage;
pub mod utils;
pub mod workers;
