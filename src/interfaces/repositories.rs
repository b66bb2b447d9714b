pub mod admin;
pub mod basic_info;
pub mod category;
pub mod experience;
pub mod log;
pub mod mongo_repo;
pub mod project;
