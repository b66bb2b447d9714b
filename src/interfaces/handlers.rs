pub mod auth;
pub mod basic_info;
pub mod categories;
pub mod dashboard;
pub mod experiences;
pub mod home;
pub mod logs;
pub mod projects;
pub mod system;
pub mod uploads;
