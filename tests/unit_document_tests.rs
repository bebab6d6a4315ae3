//! # Document Module Unit Tests / Document 模块单元测试
//!
//! Tests for parsing test-case documents and writing step outcomes back into
//! them.
//!
//! 测试测试用例文档的解析以及步骤结果的回写。

mod common;

use api_case_runner::core::document::{
    extract_table_sections, normalize_cell, parse_heading, parse_tables, parse_test_case,
    parse_test_steps, read_test_case, write_back_table_results,
    DocumentError,
};
use api_case_runner::core::models::{StepResult, TestCaseStatus, TestCaseType};
use common::{CHAINED_DOCUMENT, SIMPLE_DOCUMENT};
use std::path::Path;

const SINGLE_TABLE: &str = "\
| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |
| 1 | Step one | Data 1 | Result 1 | |";

#[cfg(test)]
mod parse_tests {
    use super::*;

    #[test]
    fn test_parse_heading_and_tags() {
        let tc = parse_test_case(CHAINED_DOCUMENT, Path::new("cases/users.md")).unwrap();

        assert_eq!(tc.id, "TC-001");
        assert_eq!(tc.title, "Create and fetch a user");
        assert_eq!(tc.module.as_deref(), Some("Users"));
        assert_eq!(tc.case_type(), Some(TestCaseType::Definition));
        assert_eq!(tc.status(), Some(TestCaseStatus::Unknown));
        assert!(tc.is_definition());
        assert_eq!(tc.file, Path::new("cases/users.md"));
        assert!(tc.linked_file.is_none());
    }

    #[test]
    fn test_parse_heading_rejects_non_heading() {
        assert_eq!(
            parse_heading("# TC-9: Title: with colon"),
            Some(("TC-9".to_string(), "Title: with colon".to_string()))
        );
        assert!(parse_heading("TC-9: no hash").is_none());
        assert!(parse_heading("# no colon").is_none());
    }

    #[test]
    fn test_missing_heading_is_an_error() {
        let err = parse_test_case("just prose\n", Path::new("x.md")).unwrap_err();
        assert!(matches!(err, DocumentError::MissingHeading(_)));
    }

    #[test]
    fn test_two_tables_in_document_order() {
        let tables = parse_tables(CHAINED_DOCUMENT);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].steps.len(), 4);
        assert_eq!(tables[1].steps.len(), 3);
        assert!(tables[1].steps[0].test_data.contains("@@AliceId@@"));
    }

    #[test]
    fn test_steps_sorted_by_id() {
        let tables = parse_tables(SIMPLE_DOCUMENT);
        let ids: Vec<i32> = tables[0].steps.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let steps = parse_test_steps(SIMPLE_DOCUMENT);
        assert_eq!(steps[0].description, "Ping");
        assert_eq!(steps[2].description, "Status");
    }

    #[test]
    fn test_cells_are_normalized() {
        let content = "\
| Step ID | Description | Test Data | Expected Result | Actual Result |
| --- | --- | --- | --- | --- |
| 1 | a \\| b | Action=CheckContent Value=&quot;x&quot; | &lt;ok&gt; &amp; &#65;&#x42; | ✅ |";
        let steps = parse_test_steps(content);

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].description, "a | b");
        assert_eq!(steps[0].test_data, "Action=CheckContent Value=\"x\"");
        assert_eq!(steps[0].expected_result, "<ok> & AB");
        assert_eq!(steps[0].is_success, Some(true));
    }

    #[test]
    fn test_normalize_cell_keeps_unknown_entities() {
        assert_eq!(normalize_cell(" a &unknown; b "), "a &unknown; b");
        assert_eq!(normalize_cell("Tom & Jerry"), "Tom & Jerry");
    }

    #[test]
    fn test_tables_without_steps_are_dropped() {
        let content = "\
# TC-3: Empty

| Step ID | Description | Test Data | Expected Result | Actual Result |
| ------- | ----------- | --------- | --------------- | ------------- |

| Name | Value |
| ---- | ----- |
| a | b |
";
        assert!(parse_tables(content).is_empty());
        assert_eq!(extract_table_sections(content).len(), 1);
    }

    #[test]
    fn test_other_tables_are_ignored() {
        let content = format!("| Name | Value |\n| --- | --- |\n| 1 | x |\n\n{SINGLE_TABLE}\n");
        let tables = parse_tables(&content);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].steps[0].test_data, "Data 1");
    }

    #[test]
    fn test_descriptive_rows_are_not_actionable() {
        let content = "\
| Step ID | Description | Test Data | Expected Result | Actual Result |
| --- | --- | --- | --- | --- |
| 1 | Context only | | | |
| 2 | Ping | Action=Send Endpoint=ping | | |";
        let tables = parse_tables(content);

        assert_eq!(tables[0].steps.len(), 2);
        assert_eq!(tables[0].actionable_steps().count(), 1);
    }

    #[test]
    fn test_link_resolved_relative_to_document() {
        let content = "# TC-4: Linked\n\n- **Link**: [setup](setup/login.md)\n";
        let tc = parse_test_case(content, Path::new("cases/tc4.md")).unwrap();

        assert_eq!(
            tc.linked_file.as_deref(),
            Some(Path::new("cases/setup/login.md"))
        );
    }

    #[tokio::test]
    async fn test_read_test_case_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("simple.md");
        std::fs::write(&path, SIMPLE_DOCUMENT).unwrap();

        let tc = read_test_case(&path, &common::token()).await.unwrap();
        assert_eq!(tc.id, "TC-002");
        assert_eq!(tc.file, path);
    }

    #[tokio::test]
    async fn test_read_test_case_missing_file() {
        let err = read_test_case(Path::new("does/not/exist.md"), &common::token())
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
    }

    #[tokio::test]
    async fn test_read_test_case_cancelled() {
        let token = common::token();
        token.cancel();
        let err = read_test_case(Path::new("whatever.md"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Cancelled));
    }
}

#[cfg(test)]
mod write_back_tests {
    use super::*;

    #[test]
    fn test_success_written_to_actual_result() {
        let updated = write_back_table_results(SINGLE_TABLE, &[vec![StepResult::success(1)]]);

        assert!(updated.contains("| 1 | Step one | Data 1 | Result 1 | ✅ |"));
        let steps = parse_test_steps(&updated);
        assert_eq!(steps[0].is_success, Some(true));
    }

    #[test]
    fn test_failure_message_joined_and_escaped() {
        let results = vec![
            StepResult::failed(1, "Expected status code '200' but was '404'."),
            StepResult::failed(1, "a | b"),
        ];
        let updated = write_back_table_results(SINGLE_TABLE, &[results]);

        assert!(updated.contains(
            "| ❌ Expected status code '200' but was '404'.; a \\| b |"
        ));
        let steps = parse_test_steps(&updated);
        assert_eq!(steps[0].is_success, Some(false));
        assert!(steps[0].actual_result.ends_with("a | b"));
    }

    #[test]
    fn test_rows_without_result_keep_their_cell() {
        let content = "\
| Step ID | Description | Test Data | Expected Result | Actual Result |
| --- | --- | --- | --- | --- |
| 1 | One | a | b | old |
| 2 | Two | c | d | |";
        let updated = write_back_table_results(content, &[vec![StepResult::success(2)]]);

        assert!(updated.contains("| 1 | One | a | b | old |"));
        assert!(updated.contains("| 2 | Two | c | d | ✅ |"));
    }

    #[test]
    fn test_missing_actual_result_column_is_added() {
        let content = "\
Intro

| Step ID | Description | Test Data | Expected Result |
| ------- | ----------- | --------- | --------------- |
| 1 | Step one | Data 1 | Result 1 |

Outro";
        let updated = write_back_table_results(content, &[vec![StepResult::success(1)]]);

        assert!(updated.contains(
            "| Step ID | Description | Test Data | Expected Result | Actual Result |"
        ));
        assert!(updated.contains("| ------------- |"));
        assert!(updated.contains("| 1 | Step one | Data 1 | Result 1 | - |"));
        assert!(updated.starts_with("Intro\n"));
        assert!(updated.ends_with("\nOutro"));
    }

    #[test]
    fn test_non_table_lines_preserved() {
        let updated = write_back_table_results(SIMPLE_DOCUMENT, &[vec![StepResult::success(1)]]);

        let original: Vec<&str> = SIMPLE_DOCUMENT
            .lines()
            .filter(|l| !l.starts_with('|'))
            .collect();
        let rewritten: Vec<&str> = updated.lines().filter(|l| !l.starts_with('|')).collect();
        assert_eq!(original, rewritten);
        assert_eq!(updated.lines().count(), SIMPLE_DOCUMENT.lines().count());
    }

    #[test]
    fn test_crlf_line_endings_preserved() {
        let content = SINGLE_TABLE.replace('\n', "\r\n") + "\r\n";
        let updated = write_back_table_results(&content, &[vec![StepResult::success(1)]]);

        assert!(updated.contains("| 1 | Step one | Data 1 | Result 1 | ✅ |\r\n"));
        assert_eq!(updated.matches("\r\n").count(), content.matches("\r\n").count());
    }

    #[test]
    fn test_table_results_applied_per_table() {
        let tables = vec![
            vec![StepResult::success(1), StepResult::failed(3, "bad status")],
            vec![StepResult::success(1)],
        ];
        let updated = write_back_table_results(CHAINED_DOCUMENT, &tables);
        let parsed = parse_tables(&updated);

        assert_eq!(parsed[0].steps[0].is_success, Some(true));
        assert_eq!(parsed[0].steps[1].is_success, None);
        assert_eq!(parsed[0].steps[2].is_success, Some(false));
        assert_eq!(parsed[1].steps[0].is_success, Some(true));
        assert_eq!(parsed[1].steps[2].is_success, None);
    }

    #[test]
    fn test_table_results_for_unexecuted_tables_leave_them_alone() {
        let tables = vec![vec![StepResult::success(1)]];
        let updated = write_back_table_results(CHAINED_DOCUMENT, &tables);
        let parsed = parse_tables(&updated);

        assert_eq!(parsed[0].steps[0].is_success, Some(true));
        assert!(parsed[1].steps.iter().all(|s| s.is_success.is_none()));
    }
}
