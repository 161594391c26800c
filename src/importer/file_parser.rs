// ==========================================
// 港口成本比选系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 每行一个 RawRow（列名 → 去空白的字符串值）
// 规则: 完全空白的行跳过,行号仍按文件行计
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// 原始行（表头为第 1 行,数据从第 2 行开始）
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub fields: HashMap<String, String>,
}

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn build_row(
    headers: &[String],
    values: impl Iterator<Item = String>,
    row_number: usize,
) -> Option<RawRow> {
    let fields: HashMap<String, String> = headers
        .iter()
        .zip(values)
        .filter(|(header, _)| !header.is_empty())
        .map(|(header, value)| (header.clone(), value.trim().to_string()))
        .collect();

    // 跳过完全空白的行
    if fields.values().all(|v| v.is_empty()) {
        return None;
    }
    Some(RawRow { row_number, fields })
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;
        let ext = extension(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            // csv 的行号从 1 开始且包含表头
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 2);
            if let Some(row) = build_row(&headers, record.iter().map(str::to_string), row_number) {
                rows.push(row);
            }
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;
        let ext = extension(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows_iter = range.rows();
        let header_row = rows_iter
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let first_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
        let rows = rows_iter
            .enumerate()
            .filter_map(|(idx, data_row)| {
                build_row(
                    &headers,
                    data_row.iter().map(|cell| cell.to_string()),
                    first_row + idx + 1,
                )
            })
            .collect();

        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<Vec<RawRow>> {
        let path = file_path.as_ref();
        match extension(path).as_str() {
            "csv" => CsvParser.parse_to_raw_rows(path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_rows(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["id,volume_t,region", "S1,1000,santa_fe", "S2,2500,cordoba"]);

        let rows = CsvParser.parse_to_raw_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].fields.get("id"), Some(&"S1".to_string()));
        assert_eq!(rows[1].fields.get("region"), Some(&"cordoba".to_string()));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let temp_file = csv_file(&["id,volume_t", "S1,2.5", ",", "S2,3.0"]);

        let rows = CsvParser.parse_to_raw_rows(temp_file.path()).unwrap();

        // 跳过空行,行号保持文件位置
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = UniversalFileParser.parse("entities.json");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
