// MCP (Model Context Protocol) server for Apache Airflow
// Exposes the Airflow REST API as tools over line-delimited JSON-RPC on stdio

pub mod handler;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use handler::McpHandler;
pub use server::McpServer;
pub use transport::LineTransport;
