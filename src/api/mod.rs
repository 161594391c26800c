// ==========================================
// 港口成本比选系统 - API 层
// ==========================================
// 职责: 对外分析接口,供 CLI / 上层服务调用
// ==========================================

pub mod analysis_api;
pub mod dto;
pub mod error;

// 重导出核心类型
pub use analysis_api::{
    AnalysisApi, AnalysisRequest, AnalysisResponse, RecalcStrategy, RobustnessResponse,
    ScenarioCountView, SensitivityResponse,
};
pub use dto::{
    round2, BatchView, BreakEvenView, ComparisonView, CostBreakdownView, EntityView,
    OriginComparisonView,
};
pub use error::{ApiError, ApiResult};
