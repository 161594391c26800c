// ==========================================
// 港口成本比选系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、分析报告
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod coordinate;
pub mod cost;
pub mod entity;
pub mod sensitivity;
pub mod types;

// 重导出核心类型
pub use coordinate::Coordinate;
pub use cost::{BreakEvenOutcome, ComparisonResult, CostBreakdown, Shipment};
pub use entity::{
    AnalysisEntity, EntityCosts, EntityRecord, EntityRoute, ExcludedEntity, PortUnitCosts,
};
pub use sensitivity::{
    AdverseScenario, ChangedEntity, ComponentFactors, CriticalParameters, ImpactScope,
    LevelCounts, ModelStability, ParameterImpact, RobustnessEvaluation, RobustnessReport,
    RobustnessSummary, RobustnessVerdict, Scenario, ScenarioValue, ScenarioVariables,
    SensitivityAnalysis, SensitivityDigest, SensitivityReport, SensitivityVariable, ValueChange,
};
pub use types::{CargoMode, CostComponent, CriticalityTier, Port, Preference, RobustnessLevel};
