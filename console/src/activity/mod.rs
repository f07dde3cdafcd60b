pub mod filter;
pub mod log;
