//! Command implementations for the imgtag CLI.

pub mod config;
pub mod tag;
