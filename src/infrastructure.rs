pub mod auth;
pub mod db;
pub mod limiter;
pub mod logging;
pub mod storage;
pub mod utils;
