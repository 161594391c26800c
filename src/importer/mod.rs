// ==========================================
// 港口成本比选系统 - 导入层
// ==========================================
// 职责: 外部起点清单导入,生成 EntityRecord
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod entity_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use entity_importer::{EntityImporter, ImportReport, RowRejection};
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
