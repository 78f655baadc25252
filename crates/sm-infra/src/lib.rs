//! # sm-infra
//!
//! Infrastructure adapters for Stillmind: file-backed repositories for the
//! flow's local records and the HTTP client for account reconciliation and
//! result upload.

pub mod account_client;
pub mod app_dirs;
pub mod mood_store;
pub mod progress_store;

pub use account_client::{AccountApiConfig, HttpAccountClient};
pub use mood_store::FileMoodStore;
pub use progress_store::FileProgressStore;
