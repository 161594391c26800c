// ==========================================
// 港口成本比选系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误,按 InvalidInput / UpstreamFailure / ComputationError 归类
// 红线: 距离服务错误原样透传;不返回部分结果
// ==========================================

use crate::config::error::ConfigError;
use crate::distance::DistanceError;
use crate::engine::error::{EngineError, ErrorKind};
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 引擎拒绝的输入（保留原始错误）
    #[error(transparent)]
    Rejected(EngineError),

    // ==========================================
    // 外部协作方错误
    // ==========================================
    #[error(transparent)]
    UpstreamFailure(#[from] DistanceError),

    // ==========================================
    // 计算异常
    // ==========================================
    #[error("计算失败: {0}")]
    ComputationError(String),

    // ==========================================
    // 配置 / 导入
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("文件导入失败: {0}")]
    ImportError(#[from] ImportError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码（供前端 / 报告渲染使用）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) | ApiError::Rejected(_) => "INVALID_INPUT",
            ApiError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            ApiError::ComputationError(_) => "COMPUTATION_ERROR",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 错误大类（配置错误与内部错误返回 None）
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            ApiError::Rejected(err) => Some(err.kind()),
            ApiError::UpstreamFailure(_) => Some(ErrorKind::UpstreamFailure),
            ApiError::ComputationError(_) => Some(ErrorKind::ComputationError),
            ApiError::ImportError(_) => Some(ErrorKind::InvalidInput),
            ApiError::ConfigError(_) | ApiError::Other(_) => None,
        }
    }
}

// ==========================================
// 从 EngineError 转换
// 计算异常不暴露内部细节,其余保留原始错误
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err.kind() {
            ErrorKind::ComputationError => {
                tracing::error!(error = %err, "引擎计算异常");
                ApiError::ComputationError("内部计算异常,未返回部分结果".to_string())
            }
            ErrorKind::UpstreamFailure => {
                ApiError::UpstreamFailure(DistanceError::ConnectionFailed(err.to_string()))
            }
            ErrorKind::InvalidInput => ApiError::Rejected(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: ApiError = EngineError::InvalidTonnage(0.0).into();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(err.kind(), Some(ErrorKind::InvalidInput));

        let err: ApiError = EngineError::Computation("nan".to_string()).into();
        assert_eq!(err.code(), "COMPUTATION_ERROR");
        assert!(!err.to_string().contains("nan"));

        // 距离服务错误原样保留
        let upstream = DistanceError::ConnectionFailed("timeout".to_string());
        let err: ApiError = upstream.clone().into();
        assert_eq!(err.code(), "UPSTREAM_FAILURE");
        assert_eq!(err.to_string(), upstream.to_string());
        assert!(matches!(err, ApiError::UpstreamFailure(inner) if inner == upstream));
    }
}
