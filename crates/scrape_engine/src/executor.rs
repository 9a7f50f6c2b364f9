use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use scrape_core::{PageResponse, QueryRequest, TransportError, TransportErrorKind};
use scrape_logging::scrape_trace;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/graphql";

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl ExecutorSettings {
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 8 * 1024 * 1024,
            headers: Vec::new(),
        }
    }
}

/// Issues a single query and returns its decoded `data` object.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, request: &QueryRequest) -> Result<PageResponse, TransportError>;
}

/// GraphQL over HTTP: `POST {"query", "variables"}`, expects `{"data", "errors"}`.
///
/// One client is built up front so pages of a scrape share its connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    settings: ExecutorSettings,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GraphQlBody {
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

impl ReqwestExecutor {
    pub fn new(settings: ExecutorSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(TransportErrorKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, TransportError> {
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for ReqwestExecutor {
    async fn execute(&self, request: &QueryRequest) -> Result<PageResponse, TransportError> {
        let endpoint = reqwest::Url::parse(&self.settings.endpoint).map_err(|err| {
            TransportError::new(TransportErrorKind::InvalidEndpoint, err.to_string())
        })?;
        let body = serde_json::to_vec(request)
            .map_err(|err| TransportError::new(TransportErrorKind::Decode, err.to_string()))?;
        let mut builder = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);
        for (name, value) in &self.settings.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                TransportErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = self.read_body(response).await?;
        scrape_trace!("received {} byte(s) from {}", bytes.len(), self.settings.endpoint);
        decode_body(&bytes)
    }
}

fn decode_body(bytes: &[u8]) -> Result<PageResponse, TransportError> {
    let body: GraphQlBody = serde_json::from_slice(bytes)
        .map_err(|err| TransportError::new(TransportErrorKind::Decode, err.to_string()))?;
    if !body.errors.is_empty() {
        let messages = body
            .errors
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TransportError::new(TransportErrorKind::GraphQl, messages));
    }
    match body.data {
        Some(data) => Ok(PageResponse::new(data)),
        None => Err(TransportError::new(
            TransportErrorKind::Decode,
            "response carried no data",
        )),
    }
}

fn too_large(max_bytes: u64, actual: u64) -> TransportError {
    TransportError::new(
        TransportErrorKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(TransportErrorKind::Decode, err.to_string());
    }
    TransportError::new(TransportErrorKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::decode_body;
    use scrape_core::TransportErrorKind;
    use serde_json::json;

    #[test]
    fn decodes_data_object() {
        let page = decode_body(br#"{"data": {"funds": [{"id": "0x1"}]}}"#).unwrap();
        assert_eq!(page.data["funds"], json!([{"id": "0x1"}]));
    }

    #[test]
    fn errors_array_wins_over_partial_data() {
        let err = decode_body(
            br#"{"data": {"funds": []}, "errors": [{"message": "a"}, {"message": "b"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::GraphQl);
        assert_eq!(err.message, "a; b");
    }

    #[test]
    fn missing_data_is_a_decode_error() {
        let err = decode_body(br#"{"data": null}"#).unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Decode);

        let err = decode_body(b"<html>").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Decode);
    }
}
