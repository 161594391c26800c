// ==========================================
// 港口成本比选系统 - 起点清单导入器
// ==========================================
// 流程: 文件解析 → 字段映射 → 主键去重 → EntityRecord 列表
// 红线: 行级错误只拒绝该行（带行号）,文件级错误整体失败
// ==========================================

use crate::domain::entity::EntityRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// 被拒绝的行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row_number: usize,
    pub reason: String,
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub records: Vec<EntityRecord>,
    pub rejected: Vec<RowRejection>,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }
}

// ==========================================
// EntityImporter
// ==========================================
pub struct EntityImporter {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl Default for EntityImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityImporter {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 从 CSV / Excel 导入起点清单
    ///
    /// # 错误
    /// 仅文件级错误（不存在 / 格式不支持 / 解析失败）
    #[instrument(skip(self, file_path), fields(file = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportReport> {
        let start = Instant::now();
        let rows = self.parser.parse(file_path.as_ref())?;
        tracing::debug!(rows = rows.len(), "文件解析完成");

        let mut report = ImportReport {
            total_rows: rows.len(),
            ..ImportReport::default()
        };
        let mut seen_ids = HashSet::new();

        for row in &rows {
            let mapped = self
                .mapper
                .map_to_entity_record(&row.fields, row.row_number)
                .and_then(|record| {
                    if seen_ids.insert(record.id.clone()) {
                        Ok(record)
                    } else {
                        Err(ImportError::DuplicateId {
                            row: row.row_number,
                            id: record.id,
                        })
                    }
                });

            match mapped {
                Ok(record) => report.records.push(record),
                Err(err) => {
                    tracing::warn!(row = row.row_number, error = %err, "行导入失败,已拒绝");
                    report.rejected.push(RowRejection {
                        row_number: row.row_number,
                        reason: err.to_string(),
                    });
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            total = report.total_rows,
            accepted = report.accepted(),
            rejected = report.rejected.len(),
            elapsed_ms = report.elapsed_ms,
            "起点清单导入完成"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_import_with_rejections() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "id,name,region,volume_t,distance_a_km,distance_b_km").unwrap();
        writeln!(temp_file, "S1,Norte,santa_fe,1000,300,450").unwrap();
        writeln!(temp_file, ",Sin id,cordoba,500,100,200").unwrap();
        writeln!(temp_file, "S1,Duplicado,cordoba,500,100,200").unwrap();
        writeln!(temp_file, "S2,Sur,buenos_aires,2000,500,200").unwrap();
        temp_file.flush().unwrap();

        let report = EntityImporter::new().import_file(temp_file.path()).unwrap();

        assert_eq!(report.total_rows, 4);
        assert_eq!(report.accepted(), 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].row_number, 3);
        assert_eq!(report.rejected[1].row_number, 4);
        assert_eq!(report.records[1].id, "S2");
    }

    #[test]
    fn test_import_missing_file() {
        let result = EntityImporter::new().import_file("no_such_origins.csv");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
