//! # Request Builder Unit Tests / 请求构建器单元测试
//!
//! Tests for turning a table's instructions into one outbound request.
//!
//! 测试将表格指令组装为单个出站请求。

mod common;

use api_case_runner::core::execution::ExecutionError;
use api_case_runner::core::http::{MultipartPart, RequestBody};
use api_case_runner::core::instruction::{Action, ContentType};
use api_case_runner::core::request::build_request;
use common::{content, named, send, token};

#[cfg(test)]
mod url_tests {
    use super::*;

    #[tokio::test]
    async fn test_url_joins_domain_and_endpoint() {
        let request = build_request(&[send(1, "GET", "users")], "https://api.test/", &token())
            .await
            .unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "https://api.test/users");
        assert_eq!(request.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let instructions = vec![
            send(1, "GET", "search"),
            named(2, Action::AddQueryParameter, "q", "a b&c"),
            named(3, Action::AddQueryParameter, "page", "2"),
        ];
        let request = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(request.url, "https://api.test/search?q=a%20b%26c&page=2");
    }

    #[tokio::test]
    async fn test_query_parameters_append_to_endpoint_query() {
        let instructions = vec![
            send(1, "GET", "search?lang=en"),
            named(2, Action::AddQueryParameter, "q", "a b"),
        ];
        let request = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(request.url, "https://api.test/search?lang=en&q=a%20b");
    }

    #[tokio::test]
    async fn test_send_domain_overrides_base_domain() {
        let mut s = send(1, "DELETE", "items/3");
        s.domain = Some("http://other.test:8080".to_string());
        let request = build_request(&[s], "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(request.method, "DELETE");
        assert_eq!(request.url, "http://other.test:8080/items/3");
    }

    #[tokio::test]
    async fn test_invalid_domain_is_an_error() {
        let err = build_request(&[send(4, "GET", "users")], "not a url", &token())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::InvalidUrl { step_id: 4, .. }));
    }

    #[tokio::test]
    async fn test_missing_send_is_an_error() {
        let err = build_request(
            &[named(1, Action::AddHeader, "X-A", "1")],
            "https://api.test",
            &token(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExecutionError::MissingSend));
    }
}

#[cfg(test)]
mod header_tests {
    use super::*;

    #[tokio::test]
    async fn test_headers_applied_regardless_of_step_order() {
        let instructions = vec![
            send(1, "GET", "me"),
            named(2, Action::AddHeader, "Authorization", "Bearer abc"),
            named(3, Action::AddHeader, "X-Trace", "t-1"),
        ];
        let request = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(
            request.headers,
            vec![
                ("Authorization".to_string(), "Bearer abc".to_string()),
                ("X-Trace".to_string(), "t-1".to_string()),
            ]
        );
    }
}

#[cfg(test)]
mod body_tests {
    use super::*;

    #[tokio::test]
    async fn test_json_body_from_value() {
        let instructions = vec![
            send(1, "POST", "users"),
            content(2, ContentType::Json, r#"{"name":"alice"}"#),
        ];
        let request = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(request.body, RequestBody::Json(r#"{"name":"alice"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_an_error() {
        let instructions = vec![send(1, "POST", "users"), content(2, ContentType::Json, "{nope")];
        let err = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::InvalidJsonContent { step_id: 2, .. }));
    }

    #[tokio::test]
    async fn test_text_body_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello from disk").unwrap();

        let mut body = content(2, ContentType::Text, "ignored");
        body.file = Some(path.to_string_lossy().into_owned());
        let request = build_request(&[send(1, "PUT", "notes/1"), body], "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(request.body, RequestBody::Text("hello from disk".to_string()));
    }

    #[tokio::test]
    async fn test_missing_content_file_is_an_error() {
        let mut body = content(2, ContentType::Text, "");
        body.file = Some("no/such/file.txt".to_string());
        let err = build_request(&[send(1, "POST", "x"), body], "https://api.test", &token())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::FileNotFound { step_id: 2, .. }));
    }

    #[tokio::test]
    async fn test_form_body_skips_blank_pairs() {
        let mut a = content(2, ContentType::FormUrlEncoded, "alice");
        a.name = Some("user".to_string());
        let mut blank = content(3, ContentType::FormUrlEncoded, "");
        blank.name = Some("empty".to_string());
        let mut b = content(4, ContentType::FormUrlEncoded, "secret");
        b.name = Some("password".to_string());

        let request = build_request(&[send(1, "POST", "login"), a, blank, b], "https://api.test", &token())
            .await
            .unwrap();

        assert_eq!(
            request.body,
            RequestBody::Form(vec![
                ("user".to_string(), "alice".to_string()),
                ("password".to_string(), "secret".to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_multipart_body_with_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut field = content(2, ContentType::MultipartFormData, "alice");
        field.name = Some("user".to_string());
        let mut file = content(3, ContentType::MultipartFormData, "");
        file.name = Some("avatar".to_string());
        file.file = Some(path.to_string_lossy().into_owned());

        let request = build_request(&[send(1, "POST", "upload"), field, file], "https://api.test", &token())
            .await
            .unwrap();

        let RequestBody::Multipart(parts) = request.body else {
            panic!("expected a multipart body");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            MultipartPart::Text {
                name: "user".to_string(),
                value: "alice".to_string()
            }
        );
        assert_eq!(
            parts[1],
            MultipartPart::File {
                name: "avatar".to_string(),
                file_name: "avatar.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            }
        );
    }

    #[tokio::test]
    async fn test_multipart_file_part_named_by_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp-upload.png");
        std::fs::write(&path, b"png").unwrap();

        let mut file = content(2, ContentType::MultipartFormData, "profile.png");
        file.name = Some("avatar".to_string());
        file.file = Some(path.to_string_lossy().into_owned());

        let request = build_request(&[send(1, "POST", "upload"), file], "https://api.test", &token())
            .await
            .unwrap();

        let RequestBody::Multipart(parts) = request.body else {
            panic!("expected a multipart body");
        };
        let MultipartPart::File { file_name, mime_type, .. } = &parts[0] else {
            panic!("expected a file part, got {:?}", parts[0]);
        };
        assert_eq!(file_name, "profile.png");
        assert_eq!(mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_an_error() {
        let instructions = vec![
            send(1, "POST", "xml"),
            content(2, ContentType::Other("application/xml".to_string()), "<a/>"),
        ];
        let err = build_request(&instructions, "https://api.test", &token())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExecutionError::UnsupportedContentType { step_id: 2, .. }
        ));
    }
}
