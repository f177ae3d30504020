//! Transport layer for the Airflow SDK.

pub mod http;

pub use http::HttpTransport;
