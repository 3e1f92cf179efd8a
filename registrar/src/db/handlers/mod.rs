//! Repository implementations for database operations.

pub mod course_codes;
pub mod defaults;
pub mod organizations;
pub mod programs;
pub mod repository;
pub mod run_modes;
pub mod users;

pub use course_codes::CourseCodes;
pub use defaults::Defaults;
pub use organizations::Organizations;
pub use programs::Programs;
pub use repository::Repository;
pub use run_modes::RunModes;
pub use users::Users;
