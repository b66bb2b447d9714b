pub mod auth;
pub mod basic_info;
pub mod categories;
pub mod dashboard;
pub mod experiences;
pub mod extractors;
pub mod logs;
pub mod projects;
