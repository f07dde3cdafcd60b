//! Integration tests against an in-process fake backend

mod common;
mod test_apps;
mod test_files;
mod test_session;
