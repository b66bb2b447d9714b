pub mod log_sink;
pub mod tracing_setup;
