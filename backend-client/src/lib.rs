//! HTTP client for the SDK chatbot backend.
//!
//! [`BackendClient`] keeps the sign-in cookie for every call and implements
//! [`chat_stream::QuestionTransport`] over the backend's server-push question
//! stream. Auxiliary operations (CSV upload, vector-store sync, feedback,
//! profile, feature config) live in [`services`].

mod client;
pub mod config;
mod error_handler;
pub mod services;

pub use client::{BackendClient, BackendReply};
pub use config::{
    client_config::{ClientConfig, Credentials},
    default_config::{config_from_env, config_from_lookup},
};
pub use error_handler::{BackendError, ConfigError, Result};
pub use services::{app_config::AppConfig, csv_upload::DEFAULT_DELIMITER, vector_sync::SyncRequest};
