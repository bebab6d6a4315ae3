//! # File System Operations Module / 文件系统操作模块
//!
//! This module locates test-case documents on disk and provides the path
//! helpers used when results are written out.
//!
//! 此模块负责在磁盘上查找测试用例文档，并提供写出结果时使用的路径工具。

use anyhow::{Context, Result, bail};
use fs_extra::dir::get_dir_content;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::document::parse_heading;
use crate::infra::t;

/// Number of leading lines inspected when deciding whether a file is a
/// test-case definition.
const HEADER_LINES: usize = 10;

/// Finds test-case documents below `dir`.
///
/// Without `test_case_id`, every `*.md` file that looks like a definition is
/// returned, sorted by path. With an id, the single definition whose heading
/// id contains it (case-insensitive) is returned, and no match is an error.
///
/// # Arguments
/// * `dir` - Directory searched recursively
/// * `test_case_id` - Optional id, or part of one, to select a single document
pub fn find_test_case_files(dir: &Path, test_case_id: Option<&str>) -> Result<Vec<PathBuf>> {
    if !is_directory(dir) {
        bail!("{}", t!("fs.directory_not_found", path = dir.display()));
    }

    let content = get_dir_content(dir)
        .with_context(|| t!("fs.directory_read_failed", path = dir.display()).to_string())?;

    let mut files: Vec<PathBuf> = content
        .files
        .into_iter()
        .map(PathBuf::from)
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        })
        .collect();
    files.sort();

    let definitions: Vec<(PathBuf, String)> = files
        .into_iter()
        .filter_map(|path| {
            let text = fs::read_to_string(&path).ok()?;
            looks_like_definition(&text).then_some((path, text))
        })
        .collect();

    let Some(wanted) = test_case_id else {
        return Ok(definitions.into_iter().map(|(path, _)| path).collect());
    };

    let wanted = wanted.to_lowercase();
    definitions
        .into_iter()
        .find(|(_, text)| {
            text.lines()
                .next()
                .and_then(parse_heading)
                .is_some_and(|(id, _)| id.to_lowercase().contains(&wanted))
        })
        .map(|(path, _)| vec![path])
        .with_context(|| t!("fs.test_case_not_found", id = &wanted, path = dir.display()).to_string())
}

/// Returns `true` if `content` looks like a test-case definition: at least
/// five lines among the first ten, a colon in the heading line, and a
/// `**Type**:` tag saying `Definition`.
pub fn looks_like_definition(content: &str) -> bool {
    let mut lines = content.lines().take(HEADER_LINES);
    let first_has_colon = lines.next().is_some_and(|l| l.contains(':'));
    let line_count = 1 + lines.count();

    first_has_colon
        && line_count >= 5
        && content.contains("**Type**:")
        && content.contains("Definition")
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Gets the absolute path from a potentially relative path.
///
/// # Returns
/// Canonicalized absolute path, or an error if the path doesn't exist
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).with_context(|| format!("Failed to resolve path: {}", path.display()))
}

/// Maps `file`, located below `input_dir`, to the same relative location
/// below `output_dir`. A file outside `input_dir` keeps only its file name.
pub fn output_path_for(file: &Path, input_dir: &Path, output_dir: &Path) -> PathBuf {
    let relative = absolute_path(file)
        .ok()
        .zip(absolute_path(input_dir).ok())
        .and_then(|(file, base)| file.strip_prefix(&base).ok().map(Path::to_path_buf))
        .or_else(|| file.strip_prefix(input_dir).ok().map(Path::to_path_buf))
        .or_else(|| file.file_name().map(PathBuf::from))
        .unwrap_or_else(|| file.to_path_buf());
    output_dir.join(relative)
}

/// Writes `content` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}
