//! API request/response models.

pub mod course_codes;
pub mod organizations;
pub mod programs;
pub mod run_modes;
pub mod users;
