// Shared test helpers for integration tests
#![allow(dead_code)]

use api_case_runner::core::http::{HttpRequest, HttpResponse, Transport, TransportError};
use api_case_runner::core::instruction::{Action, ContentType, Instruction};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A transport that records every request and answers with queued responses.
/// When the queue is empty it answers `200 OK` with an empty body.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| HttpResponse::new(200).with_reason_phrase("OK")))
    }
}

/// A transport that never answers, for cancellation tests.
pub struct PendingTransport;

#[async_trait]
impl Transport for PendingTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        std::future::pending().await
    }
}

/// A transport that always fails.
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Request {
            url: request.url,
            message: "connection refused".to_string(),
        })
    }
}

pub fn token() -> CancellationToken {
    CancellationToken::new()
}

/// Shorthand for building an instruction in tests.
pub fn instruction(step_id: i32, action: Action) -> Instruction {
    Instruction::new(step_id, action)
}

pub fn send(step_id: i32, method: &str, endpoint: &str) -> Instruction {
    let mut i = Instruction::new(step_id, Action::Send);
    i.method = method.to_string();
    i.endpoint = Some(endpoint.to_string());
    i
}

pub fn named(step_id: i32, action: Action, name: &str, value: &str) -> Instruction {
    let mut i = Instruction::new(step_id, action);
    i.name = Some(name.to_string());
    i.value = Some(value.to_string());
    i
}

pub fn content(step_id: i32, content_type: ContentType, value: &str) -> Instruction {
    let mut i = Instruction::new(step_id, Action::AddContent);
    i.content_type = content_type;
    i.value = Some(value.to_string());
    i
}

pub fn with_value(step_id: i32, action: Action, value: &str) -> Instruction {
    let mut i = Instruction::new(step_id, action);
    i.value = Some(value.to_string());
    i
}

/// A two-table document: the first table creates a user and captures its id,
/// the second one fetches the user by that id.
pub const CHAINED_DOCUMENT: &str = r#"# TC-001: Create and fetch a user

- **Module**: Users
- **Type**: Definition
- **Status**: Unknown

## Create

| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |
| 1 | Create user | Action=Send Method=POST Endpoint=users | Request sent | |
| 2 | Body | Action=AddContent ContentType=application/json Value={"name":"alice"} | Body set | |
| 3 | Status | Action=CheckStatusCode Value=201 | 201 | |
| 4 | Capture id | Action=StoreVariable Name=AliceId JsonPath=$.id | Id captured | |

## Fetch

| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |
| 1 | Fetch user | Action=Send Method=GET Endpoint=users/@@AliceId@@ | Request sent | |
| 2 | Status | Action=CheckStatusCode Value=200 | 200 | |
| 3 | Name | Action=CheckContent JsonPath=$.name Value=alice | alice | |
"#;

/// A single-table document with three steps listed out of order.
pub const SIMPLE_DOCUMENT: &str = r#"# TC-002: Health check

- **Module**: Ops
- **Type**: Definition
- **Status**: Unknown

Some prose before the table.

| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |
| 3 | Status | Action=CheckStatusCode Value=200 | 200 | |
| 1 | Ping | Action=Send Method=GET Endpoint=health | Request sent | |
| 2 | Header | Action=CheckContentHeader Name=Content-Type Value=application/json | JSON | |

Some prose after the table.
"#;
