//! # Airflow SDK
//!
//! Minimal async client for the Apache Airflow stable REST API (`/api/v1`).
//! Payloads are returned as raw JSON; the SDK only owns connection settings,
//! authentication and status handling.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use airflow_sdk::{AirflowClient, AirflowResult, ClientConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> AirflowResult<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8080")
//!         .username("airflow")
//!         .password("airflow")
//!         .build()?;
//!
//!     let client = AirflowClient::new(Arc::new(config))?;
//!     let health = client.health().await?;
//!     println!("{}", health);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::AirflowClient;
pub use config::{AccessLevel, AuthMode, ClientConfig, ClientConfigBuilder, Credentials};
pub use error::{AirflowError, AirflowResult};

pub use reqwest::Method;
