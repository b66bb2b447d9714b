pub mod login_attempts;
