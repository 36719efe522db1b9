//! 导出服务 - 业务能力层
//!
//! 把分类结果或历史记录按表格写成 CSV

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::ExportError;
use crate::models::classification::ResultRow;
use crate::models::{ClassificationResult, HistoryRecord};

/// 历史记录导出行
#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    #[serde(rename = "Test Case")]
    text: &'a str,
    #[serde(rename = "Prediction")]
    prediction: &'a str,
    #[serde(rename = "Date")]
    date: String,
}

fn write_rows<W: Write, T: Serialize>(
    writer: W,
    rows: impl IntoIterator<Item = T>,
    path: &str,
) -> Result<usize, ExportError> {
    let failed = |source| ExportError::WriteFailed {
        path: path.to_string(),
        source,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut count = 0;
    for row in rows {
        csv_writer.serialize(row).map_err(failed)?;
        count += 1;
    }
    csv_writer.flush().map_err(|e| failed(e.into()))?;
    Ok(count)
}

fn create_file(path: &Path) -> Result<std::fs::File, ExportError> {
    std::fs::File::create(path).map_err(|e| ExportError::WriteFailed {
        path: path.display().to_string(),
        source: e.into(),
    })
}

/// 导出本次分类结果：Test Case, Prediction
pub fn export_results(path: &Path, results: &[ClassificationResult]) -> Result<usize, ExportError> {
    if results.is_empty() {
        return Err(ExportError::NoData);
    }
    let count = write_rows(
        create_file(path)?,
        results.iter().map(ResultRow::from),
        &path.display().to_string(),
    )?;
    info!("📄 已导出 {} 条分类结果到 {}", count, path.display());
    Ok(count)
}

/// 导出历史记录：Test Case, Prediction, Date（当地时间）
pub fn export_history(path: &Path, records: &[HistoryRecord]) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoData);
    }
    let count = write_rows(
        create_file(path)?,
        records.iter().map(|r| HistoryRow {
            text: &r.text,
            prediction: &r.prediction,
            date: r.local_date(),
        }),
        &path.display().to_string(),
    )?;
    info!("📄 已导出 {} 条历史记录到 {}", count, path.display());
    Ok(count)
}
