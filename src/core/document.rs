//! # Document Parser Module / 文档解析模块
//!
//! Turns a test-case document into a [`TestCase`]: the `# <Id>: <Title>`
//! heading, the `- **Tag**: value` metadata lines and every step table whose
//! header carries the `Step ID | Description | Test Data | Expected Result |
//! Actual Result` columns. Other tables and all prose are ignored.
//!
//! The companion write-back operation annotates the Actual Result cells with
//! step outcomes and leaves every line outside the step tables untouched.
//!
//! 将测试用例文档解析为 [`TestCase`]，并支持把步骤结果回写到文档中。

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::models::{FAILURE_GLYPH, SUCCESS_GLYPH, StepResult, Table, TestCase, TestStep};

pub const STEP_ID_COLUMN: &str = "Step ID";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const TEST_DATA_COLUMN: &str = "Test Data";
pub const EXPECTED_RESULT_COLUMN: &str = "Expected Result";
pub const ACTUAL_RESULT_COLUMN: &str = "Actual Result";

static LINK_TARGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("link pattern is valid"));

/// Errors raised while reading a test-case document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read test case document '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Test case document '{0}' does not start with a '# <Id>: <Title>' heading")]
    MissingHeading(PathBuf),
    #[error("Reading the test case document was cancelled")]
    Cancelled,
}

/// Reads and parses the document at `path`.
pub async fn read_test_case(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<TestCase, DocumentError> {
    let content = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(DocumentError::Cancelled),
        res = tokio::fs::read_to_string(path) => res.map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?,
    };
    parse_test_case(&content, path)
}

/// Parses a document's text. `file` is recorded on the test case and anchors
/// the resolution of a linked document.
pub fn parse_test_case(content: &str, file: &Path) -> Result<TestCase, DocumentError> {
    let lines: Vec<&str> = content.lines().collect();

    let (id, title) = lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| parse_heading(l))
        .ok_or_else(|| DocumentError::MissingHeading(file.to_path_buf()))?;

    let linked_file = find_tag(&lines, "Link").and_then(|link| resolve_link(file, &link));

    let mut test_case = TestCase::default();
    test_case.id = id;
    test_case.title = title;
    test_case.module = find_tag(&lines, "Module");
    test_case.raw_type = find_tag(&lines, "Type").unwrap_or_default();
    test_case.raw_status = find_tag(&lines, "Status").unwrap_or_default();
    test_case.tables = parse_tables(content);
    test_case.file = file.to_path_buf();
    test_case.linked_file = linked_file;

    Ok(test_case)
}

/// Splits a `# <Id>: <Title>` heading into its id and title.
pub fn parse_heading(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if !line.starts_with('#') {
        return None;
    }
    let (id, title) = line.split_once(':')?;
    let id: String = id
        .chars()
        .filter(|c| *c != '#' && !c.is_whitespace())
        .collect();
    if id.is_empty() {
        return None;
    }
    Some((id, title.trim().to_string()))
}

/// Finds the value of a `- **<tag>**: value` metadata line.
pub fn find_tag(lines: &[&str], tag: &str) -> Option<String> {
    let prefix = format!("- **{tag}**:");
    lines.iter().find_map(|line| {
        line.trim_start()
            .strip_prefix(&prefix)
            .map(|value| value.trim().to_string())
    })
}

fn resolve_link(file: &Path, link: &str) -> Option<PathBuf> {
    let target = LINK_TARGET_PATTERN.captures(link)?.get(1)?.as_str().trim();
    if target.is_empty() {
        return None;
    }
    let base = file.parent().unwrap_or_else(|| Path::new(""));
    Some(base.join(target))
}

/// Parses every step table in `content`, in document order.
/// Tables without a single parsable step are dropped.
pub fn parse_tables(content: &str) -> Vec<Table> {
    extract_table_sections(content)
        .iter()
        .map(|section| Table {
            steps: parse_test_steps(section),
        })
        .filter(|table| !table.steps.is_empty())
        .collect()
}

/// Returns the text of every step table in `content`, header included.
pub fn extract_table_sections(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    locate_sections(&lines, true)
        .into_iter()
        .map(|section| lines[section.start..section.end].join("\n"))
        .collect()
}

/// Parses the steps of all step tables in `content`, sorted by step id.
pub fn parse_test_steps(content: &str) -> Vec<TestStep> {
    let lines: Vec<&str> = content.lines().collect();
    let mut steps: Vec<TestStep> = locate_sections(&lines, true)
        .iter()
        .flat_map(|section| section_steps(&lines, section))
        .collect();
    steps.sort_by_key(|s| s.id);
    steps
}

/// Column positions of a recognised step table.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    step_id: usize,
    description: usize,
    test_data: usize,
    expected_result: usize,
    actual_result: Option<usize>,
}

/// Line range `[start, end)` of a step table; `start` is the header line.
#[derive(Debug, Clone, Copy)]
struct Section {
    start: usize,
    end: usize,
    columns: ColumnMap,
}

fn locate_sections(lines: &[&str], require_actual_result: bool) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let columns = is_table_row(lines[i])
            .then(|| header_columns(&split_cells(lines[i])))
            .flatten()
            .filter(|c| !require_actual_result || c.actual_result.is_some());

        match columns {
            Some(columns) => {
                let end = (i + 1..lines.len())
                    .find(|&j| !is_table_row(lines[j]))
                    .unwrap_or(lines.len());
                sections.push(Section {
                    start: i,
                    end,
                    columns,
                });
                i = end;
            }
            None => i += 1,
        }
    }

    sections
}

fn section_steps(lines: &[&str], section: &Section) -> Vec<TestStep> {
    let mut steps: Vec<TestStep> = lines[section.start + 1..section.end]
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| !is_separator_row(cells))
        .filter_map(|cells| parse_row(&cells, &section.columns))
        .collect();
    steps.sort_by_key(|s| s.id);
    steps
}

fn header_columns(cells: &[String]) -> Option<ColumnMap> {
    let position = |name: &str| cells.iter().position(|c| c == name);
    Some(ColumnMap {
        step_id: position(STEP_ID_COLUMN)?,
        description: position(DESCRIPTION_COLUMN)?,
        test_data: position(TEST_DATA_COLUMN)?,
        expected_result: position(EXPECTED_RESULT_COLUMN)?,
        actual_result: position(ACTUAL_RESULT_COLUMN),
    })
}

fn parse_row(cells: &[String], columns: &ColumnMap) -> Option<TestStep> {
    let id = cells.get(columns.step_id)?.trim().parse::<i32>().ok()?;
    let cell = |index: usize| cells.get(index).map(|c| normalize_cell(c)).unwrap_or_default();

    let actual_result = columns.actual_result.map(|i| cell(i)).unwrap_or_default();
    let is_success = if actual_result.starts_with(SUCCESS_GLYPH) {
        Some(true)
    } else if actual_result.starts_with(FAILURE_GLYPH) {
        Some(false)
    } else {
        None
    };

    Some(TestStep {
        id,
        description: cell(columns.description),
        test_data: cell(columns.test_data),
        expected_result: cell(columns.expected_result),
        actual_result,
        is_success,
    })
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().any(|c| c.contains('-'))
        && cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Splits a table row into its raw, trimmed cells. `\|` does not split and is
/// kept escaped; use [`normalize_cell`] to obtain the cell's text.
fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = match inner.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push_str("\\|");
                chars.next();
            }
            '|' => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Restores escaped pipes and decodes common text entities.
pub fn normalize_cell(raw: &str) -> String {
    decode_entities(&raw.trim().replace("\\|", "|"))
}

fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "quot" => Some('"'),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

fn escape_cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "\\|")
}

/// Text of an Actual Result cell for the given outcomes of one step.
fn actual_result_cell(results: &[&StepResult]) -> String {
    let failures: Vec<&str> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| r.error.as_deref().unwrap_or_default())
        .filter(|e| !e.is_empty())
        .collect();

    if results.iter().all(|r| r.success) {
        SUCCESS_GLYPH.to_string()
    } else if failures.is_empty() {
        FAILURE_GLYPH.to_string()
    } else {
        format!("{} {}", FAILURE_GLYPH, escape_cell(&failures.join("; ")))
    }
}

/// Rewrites the Actual Result cells of the executed tables. `tables[i]`
/// holds the results of the i-th table returned by [`parse_tables`], so step
/// ids only need to be unique within a table.
///
/// Rows without a result keep their current cell. Tables lacking the Actual
/// Result column gain it. Every line outside the step tables is preserved.
pub fn write_back_table_results(content: &str, tables: &[Vec<StepResult>]) -> String {
    let lookups: Vec<BTreeMap<i32, Vec<&StepResult>>> = tables
        .iter()
        .map(|results| {
            let mut by_id: BTreeMap<i32, Vec<&StepResult>> = BTreeMap::new();
            for result in results {
                by_id.entry(result.step_id).or_default().push(result);
            }
            by_id
        })
        .collect();

    rewrite_sections(content, |table_index, step_id| {
        lookups
            .get(table_index?)
            .and_then(|by_id| by_id.get(&step_id))
            .map(|r| actual_result_cell(r))
    })
}

/// Rewrites step-table rows. `cell_for(table_index, step_id)` yields the new
/// Actual Result text. `table_index` is the position among the tables
/// [`parse_tables`] returns, and `None` for a table lacking the Actual Result
/// column.
fn rewrite_sections<F>(content: &str, cell_for: F) -> String
where
    F: Fn(Option<usize>, i32) -> Option<String>,
{
    let lines: Vec<&str> = content.split('\n').collect();
    let logical: Vec<&str> = lines.iter().map(|l| l.trim_end_matches('\r')).collect();
    let mut output: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

    let mut table_index = 0;
    for section in locate_sections(&logical, false) {
        let columns = section.columns;
        let mut has_steps = false;
        let index = columns.actual_result.map(|_| table_index);

        for line_no in section.start..section.end {
            let line = logical[line_no];
            let eol = if lines[line_no].ends_with('\r') { "\r" } else { "" };
            let mut cells = split_cells(line);

            let rewritten = if line_no == section.start {
                columns.actual_result.is_none().then(|| {
                    cells.push(ACTUAL_RESULT_COLUMN.to_string());
                    cells
                })
            } else if is_separator_row(&cells) {
                columns.actual_result.is_none().then(|| {
                    cells.push("-".repeat(ACTUAL_RESULT_COLUMN.len()));
                    cells
                })
            } else {
                let step_id = cells
                    .get(columns.step_id)
                    .and_then(|c| c.trim().parse::<i32>().ok());
                step_id.map(|step_id| {
                    has_steps = true;
                    let target = match columns.actual_result {
                        Some(column) => {
                            if cells.len() <= column {
                                cells.resize(column + 1, String::new());
                            }
                            column
                        }
                        None => {
                            cells.push("-".to_string());
                            cells.len() - 1
                        }
                    };
                    if let Some(cell) = cell_for(index, step_id) {
                        cells[target] = cell;
                    }
                    cells
                })
            };

            if let Some(cells) = rewritten {
                output[line_no] = format!("| {} |{}", cells.join(" | "), eol);
            }
        }

        if has_steps && index.is_some() {
            table_index += 1;
        }
    }

    output.join("\n")
}
