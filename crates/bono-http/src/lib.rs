//! # bono-http
//!
//! The HTTP implementation of [`bono_core::ScoringBackend`].
//!
//! ```rust,ignore
//! use bono_http::{ClientConfig, HttpScoringClient};
//!
//! let config = ClientConfig::default().with_env_override();
//! let client = HttpScoringClient::new(config)?;
//! let submitter = Submitter::new(Box::new(client));
//! ```

pub mod client;
pub mod config;

pub use client::HttpScoringClient;
pub use config::{ClientConfig, BASE_URL_ENV};
