pub mod azure;
pub mod blob_store;
pub mod images;
