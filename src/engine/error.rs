// ==========================================
// 港口成本比选系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: InvalidInput / UpstreamFailure / ComputationError
// 红线: 引擎错误不携带部分结果
// ==========================================

use crate::domain::types::Port;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 错误大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 输入非法,计算前拒绝
    InvalidInput,
    /// 外部协作方（距离服务）失败,原样透传
    UpstreamFailure,
    /// 计算异常（如除零漏过校验）
    ComputationError,
}

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // ===== 输入校验 =====
    #[error("无效港口: {0}")]
    InvalidPort(String),

    #[error("无效吨位: {0}（必须 > 0）")]
    InvalidTonnage(f64),

    #[error("无效距离: {0} km（必须为非负有限数）")]
    InvalidDistance(f64),

    #[error("无效坐标: lon={lon}, lat={lat}")]
    InvalidCoordinate { lon: f64, lat: f64 },

    #[error("未配置的目的地: {0}")]
    UnknownDestination(String),

    #[error("无效精度: {0} km（必须 > 0）")]
    InvalidPrecision(f64),

    #[error("港口 {port} 的费率配置非法: {reason}")]
    InvalidTariff { port: Port, reason: String },

    // ===== 分析输入 =====
    #[error("分析对象为空")]
    NoEntities,

    #[error("未提供敏感性变量")]
    NoVariables,

    #[error("变量 {0} 的候选值列表为空")]
    EmptyCandidates(String),

    #[error("变量 {name} 的区间候选值超过上限 {limit}")]
    TooManyCandidates { name: String, limit: usize },

    #[error("变量重复: {0}")]
    DuplicateVariable(String),

    #[error("变量 {name} 的基准值非法: {value}（必须为非零有限数）")]
    InvalidDefaultValue { name: String, value: f64 },

    #[error("变量 {name} 的候选值非法: {value}")]
    InvalidCandidate { name: String, value: f64 },

    #[error("未提供成本重算策略")]
    MissingCostFunction,

    #[error("场景数 {count} 超过上限 {limit}")]
    ScenarioLimitExceeded { count: usize, limit: usize },

    #[error("场景数溢出（候选值个数乘积超出 usize 范围）")]
    ScenarioCountOverflow,

    #[error("对象 {entity_id} 缺少路线距离,无法按成本模型重算")]
    MissingRoute { entity_id: String },

    // ===== 外部协作方 =====
    #[error("距离服务失败: {0}")]
    Upstream(String),

    // ===== 计算异常 =====
    #[error("计算异常: {0}")]
    Computation(String),
}

impl EngineError {
    /// 错误大类
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Upstream(_) => ErrorKind::UpstreamFailure,
            EngineError::Computation(_) => ErrorKind::ComputationError,
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 数值结果检查（NaN / Inf 视为计算异常）
pub(crate) fn ensure_finite(value: f64, what: &str) -> EngineResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        tracing::error!(what, value, "数值结果非有限");
        Err(EngineError::Computation(format!("{} 结果非有限: {}", what, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(EngineError::InvalidTonnage(0.0).kind(), ErrorKind::InvalidInput);
        assert_eq!(EngineError::NoEntities.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            EngineError::Upstream("timeout".to_string()).kind(),
            ErrorKind::UpstreamFailure
        );
        assert_eq!(
            EngineError::Computation("div by zero".to_string()).kind(),
            ErrorKind::ComputationError
        );
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "x"), Ok(1.5));
        assert!(matches!(
            ensure_finite(f64::NAN, "x"),
            Err(EngineError::Computation(_))
        ));
    }
}
