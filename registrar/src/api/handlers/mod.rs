//! API request handlers.

pub mod organizations;
pub mod programs;
pub mod run_modes;
