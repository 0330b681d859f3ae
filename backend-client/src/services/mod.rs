pub mod app_config;
pub mod auth;
pub mod csv_upload;
pub mod feedback;
pub mod profile;
pub mod question_stream;
pub mod vector_sync;
