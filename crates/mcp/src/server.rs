// MCP server loop: read a line, route it, write at most one response line

use crate::handler::McpHandler;
use crate::protocol::RpcMessage;
use crate::transport::LineTransport;
use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};

pub struct McpServer<R, W> {
    transport: LineTransport<R, W>,
    handler: McpHandler,
}

impl<R, W> McpServer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(transport: LineTransport<R, W>, handler: McpHandler) -> Self {
        Self { transport, handler }
    }

    /// Serve until the input stream ends.
    ///
    /// Messages are handled strictly one at a time, so responses leave in
    /// request order. Only I/O failures on the streams end the loop early.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            tools = self.handler.registry().list_schemas().len(),
            "MCP server started on stdio"
        );

        while let Some(line) = self
            .transport
            .read_line()
            .await
            .context("Failed to read from input stream")?
        {
            if line.is_empty() {
                continue;
            }

            let Some(message) = RpcMessage::parse(&line) else {
                tracing::warn!(len = line.len(), "discarding line that is not a JSON-RPC message");
                continue;
            };

            if let Some(response) = self.handler.handle(message).await {
                let json = serde_json::to_string(&response).context("Failed to encode response")?;
                self.transport
                    .write_line(&json)
                    .await
                    .context("Failed to write to output stream")?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    pub fn into_transport(self) -> LineTransport<R, W> {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airflow_sdk::{AccessLevel, ClientConfig};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handler(base_url: &str, access_level: AccessLevel) -> McpHandler {
        let config = ClientConfig::builder()
            .base_url(base_url)
            .username("airflow")
            .password("airflow")
            .access_level(access_level)
            .build()
            .unwrap();
        McpHandler::new(Arc::new(config))
    }

    async fn run(input: impl AsRef<[u8]>, handler: McpHandler) -> Vec<Value> {
        let transport = LineTransport::new(input.as_ref(), Vec::new());
        let mut server = McpServer::new(transport, handler);
        server.run().await.unwrap();

        let output = String::from_utf8(server.into_transport().into_writer()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_session() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"three","method":"ping"}"#,
            "\n",
        );

        let responses = run(input, handler("http://localhost:8080", AccessLevel::ReadOnly)).await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 9);
        assert_eq!(responses[2], json!({"jsonrpc": "2.0", "id": "three", "result": {}}));
    }

    #[tokio::test]
    async fn test_notifications_produce_no_output() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
            "\n",
        );

        let responses = run(input, handler("http://localhost:8080", AccessLevel::ReadOnly)).await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_is_skipped() {
        let input = concat!(
            "not json at all\n",
            "\n",
            "   \n",
            "[1,2]\n",
            r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#,
            "\n",
        );

        let responses = run(input, handler("http://localhost:8080", AccessLevel::ReadOnly)).await;
        assert_eq!(responses, vec![json!({"jsonrpc": "2.0", "id": 5, "result": {}})]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_loop_alive() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#);
        input.push(b'\n');

        let responses = run(&input, handler("http://localhost:8080", AccessLevel::ReadOnly)).await;
        assert_eq!(responses, vec![json!({"jsonrpc": "2.0", "id": 5, "result": {}})]);
    }

    #[tokio::test]
    async fn test_empty_input_ends_cleanly() {
        let responses = run("", handler("http://localhost:8080", AccessLevel::ReadOnly)).await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_failed_tool_call_keeps_loop_alive() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_health","arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"pause_dag","arguments":{"dag_id":"etl"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"foo/bar"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#,
            "\n",
        );

        let responses = run(input, handler(&server.uri(), AccessLevel::ReadOnly)).await;

        assert_eq!(responses.len(), 4);
        let ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("500"));
        let text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not permitted in read-only mode"));
        assert_eq!(responses[2]["error"]["code"], -32601);
        assert_eq!(responses[3]["result"], json!({}));
    }
}
