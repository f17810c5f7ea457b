// src/lib.rs
//! Client and data-synchronization layer for the laboratory
//! chemical-inventory dashboard backend.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod format;
pub mod models;
pub mod monitoring;
pub mod query;
pub mod session;
pub mod stores;
pub mod token_store;
pub mod validator;

pub use client::{ApiClient, ApiRequest, Navigator, NullNavigator, RecordingNavigator};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use session::{AuthSession, AuthState};
pub use stores::DataSource;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
