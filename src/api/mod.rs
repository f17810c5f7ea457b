// src/api/mod.rs
//! Typed endpoint wrappers. Each function maps to one backend route and goes
//! through [`ApiClient`](crate::client::ApiClient).

pub mod auth;
pub mod chat;
pub mod experiments;
pub mod export;
pub mod monitoring;
pub mod reagents;
pub mod users;

pub use export::{download_export, ExportFile, ExportKind, ExportRange};
