use crate::error::FileError;
use std::io::Read;
use std::path::Path;
use tokio::fs;

/// 存放测试用例文本的列名
pub const TEXT_COLUMN: &str = "Text";

/// 从 CSV 文件中读取 `Text` 列
///
/// 该列缺失或为空白的行会被静默跳过，不视为错误。
/// 返回的文本保持原样，由输入规范化负责去除空白和校验长度。
pub async fn load_csv_texts(csv_file_path: &Path) -> Result<Vec<String>, FileError> {
    let path = csv_file_path.display().to_string();

    let content = fs::read(csv_file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FileError::NotFound { path: path.clone() }
        } else {
            FileError::ReadFailed {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let texts = read_csv_texts(content.as_slice(), &path)?;
    tracing::info!("从 {} 读取到 {} 个测试用例", path, texts.len());

    Ok(texts)
}

/// 从任意读取源解析 CSV（第一行为表头）
pub fn read_csv_texts<R: Read>(reader: R, path: &str) -> Result<Vec<String>, FileError> {
    let parse_failed = |source| FileError::CsvParseFailed {
        path: path.to_string(),
        source,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(parse_failed)?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == TEXT_COLUMN)
        .ok_or_else(|| FileError::MissingColumn {
            path: path.to_string(),
            column: TEXT_COLUMN.to_string(),
        })?;

    let mut texts = Vec::new();
    for (row_index, row) in csv_reader.records().enumerate() {
        let row = row.map_err(parse_failed)?;
        match row.get(column) {
            Some(text) if !text.trim().is_empty() => texts.push(text.to_string()),
            _ => tracing::debug!("跳过第 {} 行: Text 列为空", row_index + 2),
        }
    }

    Ok(texts)
}
