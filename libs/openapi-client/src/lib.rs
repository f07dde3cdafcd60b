//! Wire models for the EasyTP dashboard backend.

pub mod models;
