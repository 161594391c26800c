// ==========================================
// 港口成本比选系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 规则: 行级错误携带行号（表头为第 1 行）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据映射错误 =====
    #[error("字段映射失败 (行 {row}): {message}")]
    FieldMappingError { row: usize, message: String },

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 数据质量错误 =====
    #[error("主键缺失 (行 {0}): id 为空")]
    PrimaryKeyMissing(usize),

    #[error("主键重复 (行 {row}): {id}")]
    DuplicateId { row: usize, id: String },

    #[error("坐标非法 (行 {row}): {message}")]
    InvalidCoordinate { row: usize, message: String },

    #[error("数值范围错误 (行 {row}, 字段 {field}): 值 {value} 超出范围 [{min}, {max}]")]
    ValueRangeError {
        row: usize,
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ImportError {
    /// 行级错误的行号（文件级错误返回 None）
    pub fn row(&self) -> Option<usize> {
        match self {
            ImportError::FieldMappingError { row, .. }
            | ImportError::TypeConversionError { row, .. }
            | ImportError::DuplicateId { row, .. }
            | ImportError::InvalidCoordinate { row, .. }
            | ImportError::ValueRangeError { row, .. } => Some(*row),
            ImportError::PrimaryKeyMissing(row) => Some(*row),
            _ => None,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
