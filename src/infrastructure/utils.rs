pub mod get_client_ip;
pub mod object_id;
