pub mod client_config;
pub mod default_config;
