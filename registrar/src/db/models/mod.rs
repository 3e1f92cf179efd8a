//! Database record structures matching table schemas.

pub mod course_codes;
pub mod defaults;
pub mod organizations;
pub mod programs;
pub mod run_modes;
pub mod users;
