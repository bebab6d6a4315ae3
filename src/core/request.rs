//! # Request Builder / 请求构建器
//!
//! Assembles the single request of a table. Headers are applied first, then
//! content, then the Send instruction's method and URL, whatever order the
//! steps appear in.
//!
//! 组装一个表格的唯一请求：先头部，再内容，最后是 Send 指令的方法和 URL。

use reqwest::Url;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::core::execution::{ExecutionError, read_file, read_text_file};
use crate::core::http::{HttpRequest, MultipartPart, RequestBody};
use crate::core::instruction::{Action, ContentType, Instruction};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Builds the request for one table's instructions, sent to `domain` unless
/// the Send instruction carries its own Domain.
pub async fn build_request(
    instructions: &[Instruction],
    domain: &str,
    cancel: &CancellationToken,
) -> Result<HttpRequest, ExecutionError> {
    let send = instructions
        .iter()
        .find(|i| i.action == Action::Send)
        .ok_or(ExecutionError::MissingSend)?;

    let headers = instructions
        .iter()
        .filter(|i| i.action == Action::AddHeader)
        .map(|i| {
            (
                i.name.clone().unwrap_or_default(),
                i.value.clone().unwrap_or_default(),
            )
        })
        .collect();

    let content: Vec<&Instruction> = instructions
        .iter()
        .filter(|i| i.action == Action::AddContent)
        .collect();
    let body = build_body(&content, cancel).await?;

    let url = build_url(send, domain, instructions)?;

    Ok(HttpRequest {
        method: send.method.clone(),
        url,
        headers,
        body,
    })
}

fn build_url(
    send: &Instruction,
    domain: &str,
    instructions: &[Instruction],
) -> Result<String, ExecutionError> {
    let base = non_blank(&send.domain).unwrap_or(domain);
    let endpoint = send.endpoint.as_deref().unwrap_or_default();
    let raw = format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        endpoint.trim().trim_start_matches('/')
    );

    let mut url = Url::parse(&raw).map_err(|e| ExecutionError::InvalidUrl {
        step_id: send.step_id,
        url: raw.clone(),
        message: e.to_string(),
    })?;

    // Percent-encoded, so a space is `%20` rather than the form-style `+`.
    let mut query: Vec<String> = url
        .query()
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .into_iter()
        .collect();
    query.extend(
        instructions
            .iter()
            .filter(|i| i.action == Action::AddQueryParameter)
            .map(|i| {
                format!(
                    "{}={}",
                    urlencoding::encode(i.name.as_deref().unwrap_or_default()),
                    urlencoding::encode(i.value.as_deref().unwrap_or_default())
                )
            }),
    );
    if !query.is_empty() {
        url.set_query(Some(&query.join("&")));
    }

    Ok(url.into())
}

async fn build_body(
    content: &[&Instruction],
    cancel: &CancellationToken,
) -> Result<RequestBody, ExecutionError> {
    let Some(first) = content.first() else {
        return Ok(RequestBody::Empty);
    };

    if let Some(unsupported) = content.iter().find(|i| !i.content_type.is_supported()) {
        return Err(ExecutionError::UnsupportedContentType {
            step_id: unsupported.step_id,
            content_type: unsupported.content_type.to_string(),
        });
    }

    match &first.content_type {
        ContentType::FormUrlEncoded => Ok(RequestBody::Form(
            content
                .iter()
                .filter_map(|i| Some((non_blank(&i.name)?, non_blank(&i.value)?)))
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )),
        ContentType::Text => Ok(RequestBody::Text(text_content(first, cancel).await?)),
        ContentType::Json => {
            let text = text_content(first, cancel).await?;
            serde_json::from_str::<serde_json::Value>(&text).map_err(|e| {
                ExecutionError::InvalidJsonContent {
                    step_id: first.step_id,
                    message: e.to_string(),
                }
            })?;
            Ok(RequestBody::Json(text))
        }
        ContentType::MultipartFormData => {
            let mut parts = Vec::new();
            for instruction in content {
                if let Some(part) = multipart_part(instruction, cancel).await? {
                    parts.push(part);
                }
            }
            Ok(RequestBody::Multipart(parts))
        }
        ContentType::Other(raw) => Err(ExecutionError::UnsupportedContentType {
            step_id: first.step_id,
            content_type: raw.clone(),
        }),
    }
}

/// Body text of a text or JSON content step: the file if one is given,
/// otherwise the literal value.
async fn text_content(
    instruction: &Instruction,
    cancel: &CancellationToken,
) -> Result<String, ExecutionError> {
    match non_blank(&instruction.file) {
        Some(file) => read_text_file(file, instruction.step_id, cancel).await,
        None => Ok(instruction.value.clone().unwrap_or_default()),
    }
}

async fn multipart_part(
    instruction: &Instruction,
    cancel: &CancellationToken,
) -> Result<Option<MultipartPart>, ExecutionError> {
    let name = instruction.name.clone().unwrap_or_default();

    if let Some(file) = non_blank(&instruction.file) {
        let bytes = read_file(file, instruction.step_id, cancel).await?;
        let path = Path::new(file);
        let file_name = match non_blank(&instruction.value) {
            Some(value) => value.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.to_string()),
        };
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        return Ok(Some(MultipartPart::File {
            name,
            file_name,
            mime_type,
            bytes,
        }));
    }

    let value = instruction.value.clone().unwrap_or_default();
    if name.trim().is_empty() && value.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(MultipartPart::Text { name, value }))
}
