//! # HTTP Contract / HTTP 契约
//!
//! The request and response shapes exchanged with a [`Transport`]. The engine
//! only depends on these types; `infra::http` provides the real client.
//!
//! 与 [`Transport`] 交换的请求和响应结构。引擎只依赖这些类型。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to '{url}' timed out")]
    Timeout { url: String },
    #[error("Request to '{url}' failed: {message}")]
    Request { url: String, message: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    /// JSON text, already checked to parse.
    Json(String),
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartPart>),
}

/// An outbound request, fully assembled.
/// 一个完整组装好的出站请求。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

/// A received response with its body decoded as text.
/// 接收到的响应，正文以文本形式解码。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub reason_phrase: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_reason_phrase(mut self, reason: impl Into<String>) -> Self {
        self.reason_phrase = Some(reason.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// All values of header `name` (case-insensitive), joined with `,`.
    pub fn header_value(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect();
        (!values.is_empty()).then(|| values.join(","))
    }
}

/// Sends one request and returns its response.
///
/// Implementations must not interpret the status code: any response that
/// arrives is `Ok`, only failures to obtain one are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
