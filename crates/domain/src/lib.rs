pub mod config;
pub mod error;
pub mod plan;
pub mod role;
pub mod tool;
pub mod trace;
