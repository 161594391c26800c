// ==========================================
// 港口成本比选系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("配置项 {key} 非法: {message}")]
    InvalidValue { key: String, message: String },

    #[error("锁获取失败: {0}")]
    LockPoisoned(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
