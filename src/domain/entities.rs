pub mod admin;
pub mod basic_info;
pub mod category;
pub mod dashboard;
pub mod experience;
pub mod image;
pub mod log_entry;
pub mod option_fields;
pub mod pagination;
pub mod project;
pub mod token;
